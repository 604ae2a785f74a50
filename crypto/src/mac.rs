//! Integrity-and-freshness envelope (spec §4.5, component C5).
//!
//! Wraps a canonical-JSON-serializable payload with a keyed MAC, a nonce,
//! and a timestamp. Both sides must serialize the payload identically —
//! see `voprf_common::canonical_json` — or the MAC will never match.

use hmac::{Hmac, Mac as HmacTrait};
use rand_core::{OsRng, RngCore};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{CryptoError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Default freshness window: a response older than this is rejected.
pub const DEFAULT_MAX_AGE_MS: i64 = 300_000;
/// Default future tolerance: a response timestamped further ahead than
/// this (clock skew) is rejected.
pub const DEFAULT_FUTURE_SLACK_MS: i64 = 60_000;

/// A MAC-wrapped payload, as carried over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    pub mac: String,
    pub nonce: String,
    pub timestamp: i64,
}

fn compute_mac(mac_key: &[u8], canonical_payload: &[u8], nonce_hex: &str, timestamp: i64) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(mac_key).expect("HMAC accepts a key of any length");
    mac.update(canonical_payload);
    mac.update(b":");
    mac.update(nonce_hex.as_bytes());
    mac.update(b":");
    mac.update(timestamp.to_string().as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build an envelope around `payload`, signing it with `mac_key`.
pub fn wrap<T: Serialize>(payload: T, mac_key: &[u8]) -> Result<Envelope<T>> {
    let canonical = voprf_common::canonical_json(&payload)?;

    let mut nonce_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = hex::encode(nonce_bytes);

    let timestamp = voprf_common::now_ms() as i64;
    let mac = compute_mac(mac_key, &canonical, &nonce, timestamp)?;

    Ok(Envelope {
        data: payload,
        mac,
        nonce,
        timestamp,
    })
}

/// Verify and unwrap an envelope, checking freshness and MAC before
/// returning the payload.
pub fn unwrap<T>(envelope: Envelope<T>, mac_key: &[u8]) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    unwrap_with_window(envelope, mac_key, DEFAULT_MAX_AGE_MS, DEFAULT_FUTURE_SLACK_MS)
}

/// [`unwrap`] with an explicit freshness window, for tests that need to
/// exercise the boundary behavior in spec §8 without waiting real time.
pub fn unwrap_with_window<T>(envelope: Envelope<T>, mac_key: &[u8], max_age_ms: i64, future_slack_ms: i64) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let now = voprf_common::now_ms() as i64;
    let age = now - envelope.timestamp;
    if age > max_age_ms {
        return Err(CryptoError::Stale { age_ms: age, max_ms: max_age_ms });
    }
    let skew = envelope.timestamp - now;
    if skew > future_slack_ms {
        return Err(CryptoError::Future { skew_ms: skew, slack_ms: future_slack_ms });
    }

    let canonical = voprf_common::canonical_json(&envelope.data)?;
    let expected_mac = compute_mac(mac_key, &canonical, &envelope.nonce, envelope.timestamp)?;

    let observed = hex::decode(&envelope.mac).map_err(|_| CryptoError::MacMismatch)?;
    let expected = hex::decode(&expected_mac).map_err(|_| CryptoError::MacMismatch)?;
    if observed.len() != expected.len() || observed.ct_eq(&expected).unwrap_u8() != 1 {
        return Err(CryptoError::MacMismatch);
    }

    Ok(envelope.data)
}
