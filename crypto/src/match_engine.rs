//! Hamming-distance match engine (spec §4.7, component C7).
//!
//! Deliberately blunt: Hamming distance is computed over the raw bytes of
//! the compressed-point encoding, not over any perceptually meaningful
//! space. Small Hamming distance between two pHashes does not imply small
//! Hamming distance between their OPRF tokens under a hash-to-curve
//! modeled as a random oracle — see spec §4.7 and §9. This module
//! preserves that policy exactly rather than "fixing" it.

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, Result};

/// The default Hamming-distance threshold below which a token counts as
/// a match.
pub const DEFAULT_THRESHOLD: u32 = 10;

/// One entry in the evaluated-hash database: an opaque identifier paired
/// with the server-evaluated token `k*H(p)` for one known-bad pHash `p`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbEntry {
    pub file: String,
    pub phash: String,
}

/// Outcome of testing one token against a database: a tagged sum in
/// Rust, flattened to the wire's `{matched, distance?, file?}` shape by
/// [`MatchResponse`].
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched { file: String, distance: u32 },
    NoMatch,
}

/// The `{matched, distance?, file?}` shape the protocol orchestrator
/// puts on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl From<MatchOutcome> for MatchResponse {
    fn from(outcome: MatchOutcome) -> Self {
        match outcome {
            MatchOutcome::Matched { file, distance } => {
                MatchResponse { matched: true, distance: Some(distance), file: Some(file) }
            }
            MatchOutcome::NoMatch => MatchResponse { matched: false, distance: None, file: None },
        }
    }
}

/// Test `token_hex` against `db`, returning the first entry (in DB order)
/// within `threshold` Hamming distance, else `NoMatch`.
pub fn find_match(token_hex: &str, db: &[DbEntry], threshold: u32) -> Result<MatchOutcome> {
    let token_bytes = hex::decode(token_hex).map_err(|e| CryptoError::BadPoint(e.to_string()))?;

    for entry in db {
        let entry_bytes = hex::decode(&entry.phash).map_err(|e| CryptoError::BadPoint(e.to_string()))?;
        let distance = hamming_distance(&token_bytes, &entry_bytes);
        if distance <= threshold {
            return Ok(MatchOutcome::Matched { file: entry.file.clone(), distance });
        }
    }
    Ok(MatchOutcome::NoMatch)
}

/// Hamming distance in bits between two byte strings of possibly
/// different length: XOR over the shared prefix, plus every bit of
/// whichever tail is longer (a length mismatch is itself a maximal
/// mismatch signal, not something to silently ignore).
fn hamming_distance(a: &[u8], b: &[u8]) -> u32 {
    let shared = a.len().min(b.len());
    let mut distance = 0u32;
    for i in 0..shared {
        distance += (a[i] ^ b[i]).count_ones();
    }
    for &byte in &a[shared..] {
        distance += byte.count_ones();
    }
    for &byte in &b[shared..] {
        distance += byte.count_ones();
    }
    distance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Vec<DbEntry> {
        vec![
            DbEntry { file: "img-a".into(), phash: "02".repeat(33) },
            DbEntry { file: "img-b".into(), phash: "03".repeat(33) },
        ]
    }

    #[test]
    fn exact_match_returns_distance_zero() {
        let token = "02".repeat(33);
        let result = find_match(&token, &db(), DEFAULT_THRESHOLD).unwrap();
        assert_eq!(result, MatchOutcome::Matched { file: "img-a".into(), distance: 0 });
    }

    #[test]
    fn threshold_zero_matches_only_exact_equal_tokens() {
        let token = "02".repeat(32) + "03";
        let result = find_match(&token, &db(), 0).unwrap();
        assert_eq!(result, MatchOutcome::NoMatch);
    }

    #[test]
    fn unrelated_token_is_no_match() {
        let token = "ff".repeat(33);
        let result = find_match(&token, &db(), DEFAULT_THRESHOLD).unwrap();
        assert_eq!(result, MatchOutcome::NoMatch);
    }

    #[test]
    fn first_entry_within_threshold_wins_over_a_closer_later_one() {
        let entries = vec![
            DbEntry { file: "first".into(), phash: "00".repeat(33) },
            DbEntry { file: "second".into(), phash: "01".repeat(33) },
        ];
        // token differs from "first" by exactly 1 bit, from "second" by more
        let mut token_bytes = [0u8; 33];
        token_bytes[0] = 0x01;
        let token = hex::encode(token_bytes);
        let result = find_match(&token, &entries, 5).unwrap();
        assert_eq!(result, MatchOutcome::Matched { file: "first".into(), distance: 1 });
    }

    #[test]
    fn malformed_token_hex_is_rejected() {
        assert!(find_match("not-hex", &db(), DEFAULT_THRESHOLD).is_err());
    }
}
