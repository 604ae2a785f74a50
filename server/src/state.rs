//! Process-wide, read-only server state (spec §5, §9).
//!
//! `k` and its derived commitment `K` are computed once at startup and
//! held immutably behind `web::Data` — the teacher's `AppState` idiom —
//! rather than as ambient mutable globals. The evaluated-hash database
//! and its manifest are likewise read once at startup and served
//! byte-for-byte verbatim: re-verifying them is the *client's* job (spec
//! §4.6), the server only needs to hand back exactly what it signed.

use std::fs;

use crate::config::Config;
use crate::services::textscan::TextScanner;

pub struct AppState {
    pub config: Config,
    /// Compressed-hex `K = k*G`, computed once at startup.
    pub public_key_hex: String,
    pub key_commitment_timestamp: i64,
    pub version: String,
    /// Raw bytes of the evaluated-hash database file, if present on disk.
    pub db_bytes: Option<Vec<u8>>,
    /// Raw bytes of the signed manifest file, if present on disk.
    pub manifest_bytes: Option<Vec<u8>>,
    pub textscan: TextScanner,
}

impl AppState {
    pub fn load(config: Config) -> Self {
        let public_key_hex = voprf_crypto::oprf::public_key_commitment(&config.oprf_key);

        let db_bytes = match fs::read(&config.db_path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(path = %config.db_path, error = %e, "evaluated-hash database not found on disk");
                None
            }
        };
        let manifest_bytes = match fs::read(&config.db_manifest_path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(path = %config.db_manifest_path, error = %e, "database manifest not found on disk");
                None
            }
        };

        Self {
            key_commitment_timestamp: voprf_common::now_ms() as i64,
            version: env!("CARGO_PKG_VERSION").to_string(),
            public_key_hex,
            db_bytes,
            manifest_bytes,
            textscan: TextScanner::new(),
            config,
        }
    }
}
