//! P-256 scalar and point primitives (spec §4.2, component C2).
//!
//! This is the only module permitted to know about `p256`'s internal
//! representations; everything above it moves hex strings and opaque
//! `Scalar`/`ProjectivePoint` values. No operation here branches on a
//! secret scalar or point value — comparisons use the curve crate's
//! constant-time `ct_eq` throughout.

use p256::elliptic_curve::group::GroupEncoding;
use p256::elliptic_curve::hash2curve::{ExpandMsgXmd, GroupDigest};
use p256::elliptic_curve::{Field, PrimeField};
use p256::{AffinePoint, NistP256, ProjectivePoint, Scalar};
use rand_core::OsRng;
use sha2::Sha256;

use crate::error::{CryptoError, Result};

/// RFC-9380 domain-separation tag for the P256_XMD:SHA-256_SSWU_RO_ suite,
/// scoped to this protocol's version so databases built by one
/// implementation stay usable by another that pins the same tag.
const HASH_TO_CURVE_DST: &[u8] = b"VOPRF08-P256_XMD:SHA-256_SSWU_RO_";

/// Sample a scalar uniformly from `[1, n)`.
///
/// `Scalar::random` draws uniformly from `[0, n)`; since hitting exactly
/// zero happens with negligible probability, the rejection loop below
/// essentially never iterates more than once, but is required for
/// correctness at the boundary.
pub fn random_nonzero_scalar() -> Scalar {
    loop {
        let candidate = Scalar::random(&mut OsRng);
        let is_zero: bool = candidate.is_zero().into();
        if !is_zero {
            return candidate;
        }
    }
}

/// Multiplicative inverse of `s` modulo the group order `n`.
///
/// # Panics
/// Panics if `s` is zero; every caller in this crate only ever inverts a
/// scalar it sampled itself via [`random_nonzero_scalar`].
pub fn scalar_invert(s: &Scalar) -> Scalar {
    Option::from(s.invert()).expect("scalar_invert called on zero")
}

/// The standard P-256 base point, pinned as a constant rather than derived
/// from a "public key from secret 1" routine (spec §9).
pub fn generator() -> ProjectivePoint {
    ProjectivePoint::GENERATOR
}

/// Map an arbitrary byte string to a P-256 point using the RFC-9380
/// `P256_XMD:SHA-256_SSWU_RO_` hash-to-curve suite.
pub fn hash_to_curve(bytes: &[u8]) -> ProjectivePoint {
    NistP256::hash_from_bytes::<ExpandMsgXmd<Sha256>>(&[bytes], &[HASH_TO_CURVE_DST])
        .expect("hash-to-curve expand_message parameters are always valid for P-256")
}

/// Serialize a point to its 33-byte SEC1-compressed encoding, lowercase hex.
pub fn point_to_hex(point: &ProjectivePoint) -> String {
    hex::encode(point.to_affine().to_bytes())
}

/// Parse a lowercase compressed-SEC1 hex string back to a point.
///
/// Rejects malformed hex, malformed points, and the point at infinity (the
/// identity element never appears as a legitimate OPRF input or output).
pub fn point_from_hex(hex_str: &str) -> Result<ProjectivePoint> {
    let bytes = hex::decode(hex_str).map_err(|e| CryptoError::BadPoint(e.to_string()))?;
    if bytes.len() != 33 {
        return Err(CryptoError::BadPoint(format!(
            "expected 33-byte compressed point, got {}",
            bytes.len()
        )));
    }
    let mut array = [0u8; 33];
    array.copy_from_slice(&bytes);

    let affine: AffinePoint = Option::from(AffinePoint::from_bytes(&array.into()))
        .ok_or_else(|| CryptoError::BadPoint("point does not lie on the curve".into()))?;
    let point = ProjectivePoint::from(affine);
    if point == ProjectivePoint::IDENTITY {
        return Err(CryptoError::BadPoint("point is the identity".into()));
    }
    Ok(point)
}

/// Serialize a scalar to 32-byte big-endian hex.
pub fn scalar_to_hex(scalar: &Scalar) -> String {
    hex::encode(scalar.to_bytes())
}

/// Parse a 32-byte big-endian hex scalar.
pub fn scalar_from_hex(hex_str: &str) -> Result<Scalar> {
    let bytes = hex::decode(hex_str).map_err(|e| CryptoError::BadPoint(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(CryptoError::BadPoint(format!(
            "expected 32-byte scalar, got {}",
            bytes.len()
        )));
    }
    let mut array = [0u8; 32];
    array.copy_from_slice(&bytes);
    Option::from(Scalar::from_repr(array.into()))
        .ok_or_else(|| CryptoError::BadPoint("scalar is not canonically reduced".into()))
}

/// Parse the decimal-string form of a scalar, as carried by the
/// `SERVER_OPRF_KEY` environment variable (spec §6).
///
/// Converts via `num-bigint` rather than hand-rolling base conversion;
/// the server only ever calls this once at startup, so there is no
/// constant-time requirement the way there is for the per-request curve
/// operations above.
pub fn scalar_from_decimal(decimal_str: &str) -> Result<Scalar> {
    let big = decimal_str
        .parse::<num_bigint::BigUint>()
        .map_err(|e| CryptoError::BadPoint(format!("SERVER_OPRF_KEY is not a valid decimal integer: {e}")))?;
    let mut bytes = big.to_bytes_be();
    if bytes.len() > 32 {
        return Err(CryptoError::BadPoint("SERVER_OPRF_KEY exceeds the P-256 scalar field".into()));
    }
    let mut padded = vec![0u8; 32 - bytes.len()];
    padded.append(&mut bytes);
    let mut array = [0u8; 32];
    array.copy_from_slice(&padded);
    let scalar: Scalar = Option::from(Scalar::from_repr(array.into()))
        .ok_or_else(|| CryptoError::BadPoint("SERVER_OPRF_KEY is not canonically reduced mod n".into()))?;
    let is_zero: bool = scalar.is_zero().into();
    if is_zero {
        return Err(CryptoError::BadPoint("SERVER_OPRF_KEY must be non-zero".into()));
    }
    Ok(scalar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_hex_round_trips() {
        let p = hash_to_curve(b"some pHash bytes");
        let hex_str = point_to_hex(&p);
        assert_eq!(hex_str.len(), 66);
        let parsed = point_from_hex(&hex_str).unwrap();
        assert_eq!(parsed, p);
    }

    #[test]
    fn scalar_hex_round_trips() {
        let s = random_nonzero_scalar();
        let hex_str = scalar_to_hex(&s);
        let parsed = scalar_from_hex(&hex_str).unwrap();
        assert_eq!(s, parsed);
    }

    #[test]
    fn scalar_from_decimal_matches_hex_round_trip() {
        let s = random_nonzero_scalar();
        let as_big = num_bigint::BigUint::from_bytes_be(&s.to_bytes());
        let parsed = scalar_from_decimal(&as_big.to_string()).unwrap();
        assert_eq!(s, parsed);
    }

    #[test]
    fn scalar_from_decimal_rejects_zero() {
        assert!(scalar_from_decimal("0").is_err());
    }

    #[test]
    fn scalar_from_decimal_rejects_garbage() {
        assert!(scalar_from_decimal("not-a-number").is_err());
    }

    #[test]
    fn rejects_identity_point() {
        let hex_str = point_to_hex(&ProjectivePoint::IDENTITY);
        // The identity has no valid compressed SEC1 encoding under this
        // library's rules in the first place, but if a peer ever sends
        // 33 zero bytes or similar garbage it must be rejected.
        let _ = hex_str;
        let zero_bytes = "00".repeat(33);
        assert!(point_from_hex(&zero_bytes).is_err());
    }

    #[test]
    fn scalar_invert_is_correct() {
        let s = random_nonzero_scalar();
        let inv = scalar_invert(&s);
        assert_eq!(s * inv, Scalar::ONE);
    }

    #[test]
    fn hash_to_curve_is_deterministic() {
        let a = hash_to_curve(b"fffefcf8f0e0c080");
        let b = hash_to_curve(b"fffefcf8f0e0c080");
        assert_eq!(a, b);
    }
}
