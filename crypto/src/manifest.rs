//! Signed database manifest (spec §4.6, component C6).
//!
//! Binds the evaluated-hash database's content, a timestamp, and a
//! version string under one keyed signature, so that tampering with any
//! of the three is detectable independent of the others.

use hmac::{Hmac, Mac as HmacTrait};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{CryptoError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Manifests older than this are rejected regardless of signature
/// validity, bounding rollback attacks.
pub const MAX_MANIFEST_AGE_MS: i64 = 30 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub hash: String,
    pub signature: String,
    pub timestamp: i64,
    pub version: String,
}

fn compute_signature(signing_key: &[u8], hash_hex: &str, timestamp: i64, version: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(signing_key).expect("HMAC accepts a key of any length");
    mac.update(hash_hex.as_bytes());
    mac.update(b":");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b":");
    mac.update(version.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Build a manifest over `db_bytes` at the current time, offline tooling
/// entry point (spec §4.6 "Generation").
pub fn generate(db_bytes: &[u8], signing_key: &[u8], version: &str) -> Manifest {
    let hash = hex::encode(Sha256::digest(db_bytes));
    let timestamp = voprf_common::now_ms() as i64;
    let signature = compute_signature(signing_key, &hash, timestamp, version);
    Manifest { hash, signature, timestamp, version: version.to_string() }
}

/// Verify a manifest against the database bytes it claims to describe.
///
/// Only on success should the parsed database be handed to the match
/// engine (C7); every failure here is fail-closed (spec §7).
pub fn verify(manifest: &Manifest, db_bytes: &[u8], signing_key: &[u8]) -> Result<()> {
    let recomputed_hash = hex::encode(Sha256::digest(db_bytes));
    if !bool::from(recomputed_hash.as_bytes().ct_eq(manifest.hash.as_bytes())) {
        return Err(CryptoError::DBHashMismatch);
    }

    let recomputed_sig = compute_signature(signing_key, &manifest.hash, manifest.timestamp, &manifest.version);
    if !bool::from(recomputed_sig.as_bytes().ct_eq(manifest.signature.as_bytes())) {
        return Err(CryptoError::DBSigMismatch);
    }

    let now = voprf_common::now_ms() as i64;
    let age = now - manifest.timestamp;
    if age > MAX_MANIFEST_AGE_MS {
        return Err(CryptoError::DBExpired { age_ms: age });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNING_KEY: &[u8] = b"test-db-signing-key";

    #[test]
    fn freshly_generated_manifest_verifies() {
        let db_bytes = b"[{\"file\":\"a\",\"phash\":\"02aa\"}]";
        let manifest = generate(db_bytes, SIGNING_KEY, "v1");
        assert!(verify(&manifest, db_bytes, SIGNING_KEY).is_ok());
    }

    #[test]
    fn altering_db_bytes_fails_hash_check() {
        let db_bytes = b"[{\"file\":\"a\",\"phash\":\"02aa\"}]";
        let manifest = generate(db_bytes, SIGNING_KEY, "v1");
        let tampered = b"[{\"file\":\"a\",\"phash\":\"02ab\"}]";
        assert!(matches!(verify(&manifest, tampered, SIGNING_KEY), Err(CryptoError::DBHashMismatch)));
    }

    #[test]
    fn wrong_signing_key_fails_signature_check() {
        let db_bytes = b"[{\"file\":\"a\",\"phash\":\"02aa\"}]";
        let manifest = generate(db_bytes, SIGNING_KEY, "v1");
        assert!(matches!(
            verify(&manifest, db_bytes, b"wrong-key"),
            Err(CryptoError::DBSigMismatch)
        ));
    }

    #[test]
    fn manifest_just_under_30_days_old_is_accepted() {
        let db_bytes = b"payload";
        let mut manifest = generate(db_bytes, SIGNING_KEY, "v1");
        manifest.timestamp -= MAX_MANIFEST_AGE_MS - 1;
        manifest.signature = compute_signature(SIGNING_KEY, &manifest.hash, manifest.timestamp, &manifest.version);
        assert!(verify(&manifest, db_bytes, SIGNING_KEY).is_ok());
    }

    #[test]
    fn manifest_just_over_30_days_old_is_expired() {
        let db_bytes = b"payload";
        let mut manifest = generate(db_bytes, SIGNING_KEY, "v1");
        manifest.timestamp -= MAX_MANIFEST_AGE_MS + 1;
        manifest.signature = compute_signature(SIGNING_KEY, &manifest.hash, manifest.timestamp, &manifest.version);
        assert!(matches!(verify(&manifest, db_bytes, SIGNING_KEY), Err(CryptoError::DBExpired { .. })));
    }
}
