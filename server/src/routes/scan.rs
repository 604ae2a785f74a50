//! `POST /api/scan` — the text-scan collaborator (spec §4.10, §6).

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ScanRequest {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub text: String,
}

#[post("/api/scan")]
pub async fn scan_text(state: web::Data<AppState>, body: web::Json<ScanRequest>) -> Result<HttpResponse> {
    body.validate()
        .map_err(|e| crate::error::GatewayError::BadRequest(e.to_string()))?;

    let correlation_id = Uuid::new_v4();
    tracing::debug!(%correlation_id, len = body.text.len(), "scanning text");
    let result = state.textscan.scan(&body.text);

    let envelope = voprf_crypto::mac::wrap(result, &state.config.mac_secret)?;
    Ok(HttpResponse::Ok().json(envelope))
}
