//! Static artifacts served from the site root (spec §6).
//!
//! `server_key_commitment.json` is generated in memory at startup; the
//! evaluated-hash database and its manifest are offline-generated
//! artifacts (see `voprf-dbgen`) served back byte-for-byte so the
//! client's manifest verification (spec §4.6) covers exactly the bytes
//! it re-hashes.

use actix_web::{get, web, HttpResponse};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct KeyCommitment<'a> {
    #[serde(rename = "publicKey")]
    public_key: &'a str,
    timestamp: i64,
    version: &'a str,
}

#[get("/server_key_commitment.json")]
pub async fn key_commitment(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(KeyCommitment {
        public_key: &state.public_key_hex,
        timestamp: state.key_commitment_timestamp,
        version: &state.version,
    })
}

#[get("/eHashes/evaluated_phashes.json")]
pub async fn evaluated_phashes(state: web::Data<AppState>) -> HttpResponse {
    match &state.db_bytes {
        Some(bytes) => HttpResponse::Ok().content_type("application/json").body(bytes.clone()),
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": "evaluated-hash database is not available on this server",
        })),
    }
}

#[get("/eHashes/database_signature.json")]
pub async fn database_signature(state: web::Data<AppState>) -> HttpResponse {
    match &state.manifest_bytes {
        Some(bytes) => HttpResponse::Ok().content_type("application/json").body(bytes.clone()),
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": "database manifest is not available on this server",
        })),
    }
}
