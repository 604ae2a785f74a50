//! Environment-loaded configuration (spec §6 "Configuration").
//!
//! Mirrors the teacher's `Config::from_env` pattern: `dotenvy::dotenv()`
//! loaded first for local development, required secrets `.expect()`'d
//! at startup rather than defaulted, and optional values falling back to
//! a documented default.

use std::env;

use voprf_crypto::curve;

/// Development-only placeholder; `Config::from_env` warns loudly if this
/// is still in effect (spec §9: "development defaults are not
/// acceptable in production").
const DEV_MAC_SECRET: &str = "dev-only-mac-secret-do-not-use-in-production";
/// Development-only placeholder for the DB manifest signing key.
const DEV_DB_SIGNING_KEY: &str = "dev-only-db-signing-key-do-not-use-in-production";

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// The server's OPRF secret scalar `k`. Never serialized, never
    /// logged, never cloned into a response.
    pub oprf_key: p256::Scalar,
    pub mac_secret: Vec<u8>,
    pub db_signing_key: Vec<u8>,
    pub db_path: String,
    pub db_manifest_path: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// # Panics
    /// Panics if `SERVER_OPRF_KEY` is unset or is not a valid non-zero
    /// decimal scalar mod the P-256 group order — this secret has no
    /// safe default, matching the teacher's `.expect(...)` pattern for
    /// required secrets that must never silently fall back.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let oprf_key_decimal = env::var("SERVER_OPRF_KEY")
            .expect("SERVER_OPRF_KEY must be set: the server has no safe default OPRF key");
        let oprf_key = curve::scalar_from_decimal(&oprf_key_decimal)
            .expect("SERVER_OPRF_KEY must be a non-zero decimal scalar mod the P-256 group order");

        let mac_secret = match env::var("MAC_SECRET") {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!("MAC_SECRET not set; using a development placeholder unsuitable for production");
                DEV_MAC_SECRET.to_string()
            }
        };

        let db_signing_key = match env::var("DB_SIGNING_KEY") {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!("DB_SIGNING_KEY not set; using a development placeholder unsuitable for production");
                DEV_DB_SIGNING_KEY.to_string()
            }
        };

        Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SERVER_PORT must be a valid port number"),
            oprf_key,
            mac_secret: mac_secret.into_bytes(),
            db_signing_key: db_signing_key.into_bytes(),
            db_path: env::var("DB_PATH").unwrap_or_else(|_| "eHashes/evaluated_phashes.json".to_string()),
            db_manifest_path: env::var("DB_MANIFEST_PATH")
                .unwrap_or_else(|_| "eHashes/database_signature.json".to_string()),
        }
    }
}
