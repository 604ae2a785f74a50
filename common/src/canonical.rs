//! Canonical JSON encoding.
//!
//! Both sides of the protocol must agree on the exact bytes covered by a
//! MAC, so this is the single place that encoding happens. `serde_json`'s
//! default `Map` is a `BTreeMap` (the `preserve_order` feature is not
//! enabled anywhere in this workspace), so object keys already serialize in
//! lexicographic order at every nesting level; combined with `to_vec`'s
//! compact (whitespace-free) output, a plain round-trip through
//! `serde_json::Value` is sufficient to canonicalize.

use serde::Serialize;

use crate::error::{CommonError, Result};

/// Encode `value` as canonical JSON bytes: sorted keys, no insignificant
/// whitespace, UTF-8.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let as_value = serde_json::to_value(value).map_err(CommonError::CanonicalEncode)?;
    serde_json::to_vec(&as_value).map_err(CommonError::CanonicalEncode)
}

/// Encode `value` as a canonical JSON string, for embedding in a MAC/HMAC
/// input alongside other string fields.
pub fn canonical_json_string<T: Serialize>(value: &T) -> Result<String> {
    canonical_json(value).map(|bytes| {
        // canonical_json only ever produces valid UTF-8 since its input is
        // valid JSON.
        String::from_utf8(bytes).expect("canonical JSON is always valid UTF-8")
    })
}
