//! Epoch-millisecond timestamps.
//!
//! The wire protocol (envelopes, manifests) uses plain `u64` milliseconds
//! since the Unix epoch rather than an RFC-3339 string, so both the pHash
//! browser client and this service can compare timestamps as integers
//! without parsing.

use chrono::Utc;

/// Current time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
