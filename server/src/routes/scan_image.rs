//! `POST /api/scan/image` — the server half of the OPRF/DLEQ dance
//! (spec §4.3, §4.4, §4.9 "Server state machine", §6).
//!
//! Stateless apart from the immutable `k`/`K` held in [`AppState`]: parse
//! the blinded point, evaluate, prove, envelope, respond. No per-client
//! state survives one request.

use actix_multipart::Multipart;
use actix_web::{post, web, HttpResponse};
use futures_util::StreamExt;
use uuid::Uuid;

use crate::error::{GatewayError, Result};
use crate::state::AppState;

/// Pull the `blindedPoint` text field out of a `multipart/form-data`
/// body (spec §6: "multipart form with field `blindedPoint`").
async fn extract_blinded_point(mut payload: Multipart) -> Result<String> {
    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| GatewayError::BadRequest(e.to_string()))?;
        let is_blinded_point = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .map(|name| name == "blindedPoint")
            .unwrap_or(false);
        if !is_blinded_point {
            continue;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| GatewayError::BadRequest(e.to_string()))?;
            bytes.extend_from_slice(&chunk);
        }
        return String::from_utf8(bytes)
            .map_err(|e| GatewayError::BadRequest(format!("blindedPoint is not valid UTF-8: {e}")));
    }
    Err(GatewayError::BadRequest("missing required multipart field `blindedPoint`".into()))
}

#[post("/api/scan/image")]
pub async fn scan_image(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse> {
    let blinded_point_hex = extract_blinded_point(payload).await?;
    let correlation_id = Uuid::new_v4();
    tracing::debug!(%correlation_id, "evaluating blinded OPRF request");

    let public_key = voprf_crypto::curve::point_from_hex(&state.public_key_hex)?;
    let response = voprf_crypto::oprf::respond(&blinded_point_hex, &state.config.oprf_key, &public_key)?;

    let envelope = voprf_crypto::mac::wrap(response, &state.config.mac_secret)?;
    Ok(HttpResponse::Ok().json(envelope))
}
