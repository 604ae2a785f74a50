//! Gateway-level error type (spec §7, realized for the HTTP surface).
//!
//! Wraps the crypto engine's fail-closed taxonomy plus the handful of
//! transport-level failures a request can hit before it ever reaches
//! `voprf-crypto`. Mirrors the teacher's `ACDPGatewayError` /
//! `ResponseError` split: one status code per variant, a JSON body
//! carrying only `{"error": "..."}`.

use actix_web::{http::StatusCode, HttpResponse};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Crypto(#[from] voprf_crypto::CryptoError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl actix_web::error::ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Crypto(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        tracing::warn!(error = %self, "request failed");
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}
