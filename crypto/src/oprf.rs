//! OPRF core: blind / evaluate / unblind (spec §4.3, component C3).
//!
//! This only talks to the server's committed key through hex-encoded
//! points and the `k` scalar passed in by the caller — it never reads
//! configuration or touches the network itself.

use p256::{ProjectivePoint, Scalar};
use serde::{Deserialize, Serialize};

use crate::curve::{self, generator};
use crate::error::Result;
use crate::zkp::{self, DleqProof};

/// The client's half of a blinded request: the point to send to the
/// server, and the blinding factor it must keep to unblind the response.
pub struct Blinded {
    /// Compressed hex of `P' = r * H(p)`, sent to the server.
    pub blinded_point: String,
    /// `r`, sampled fresh for this request and discarded once unblinding
    /// completes.
    pub blinding_factor: Scalar,
}

/// Blind a pHash for oblivious evaluation.
///
/// `p_hex` is the canonical 16-hex-char pHash string; its UTF-8 bytes (not
/// the 8 raw bytes the hex decodes to) are the hash-to-curve input, since
/// that is the representation both the client and the offline DB-curation
/// tooling agree on.
pub fn blind(p_hex: &str) -> Blinded {
    let r = curve::random_nonzero_scalar();
    let input_point = curve::hash_to_curve(p_hex.as_bytes());
    let blinded_point = input_point * r;
    Blinded {
        blinded_point: curve::point_to_hex(&blinded_point),
        blinding_factor: r,
    }
}

/// Evaluate the OPRF on the server: `Q = k * P'`.
///
/// Returns `BadPoint` if `blinded_point_hex` fails to parse or is the
/// identity.
pub fn evaluate_server(blinded_point_hex: &str, k: &Scalar) -> Result<EvaluatedPoint> {
    let blinded_point = curve::point_from_hex(blinded_point_hex)?;
    let evaluated = blinded_point * k;
    Ok(EvaluatedPoint {
        point: evaluated,
        hex: curve::point_to_hex(&evaluated),
    })
}

/// The server's evaluation, kept in both point and hex form so the caller
/// building the DLEQ proof (C4) doesn't have to re-parse the hex it just
/// produced.
pub struct EvaluatedPoint {
    pub point: ProjectivePoint,
    pub hex: String,
}

/// Unblind the server's response: `token = r^-1 * Q`.
pub fn unblind(evaluated_point_hex: &str, blinding_factor: &Scalar) -> Result<String> {
    let q = curve::point_from_hex(evaluated_point_hex)?;
    let r_inv = curve::scalar_invert(blinding_factor);
    let token = q * r_inv;
    Ok(curve::point_to_hex(&token))
}

/// Compute `k * H(p)` directly, without the blind/evaluate/unblind dance.
/// Used offline to build the known-bad hash database (C6) and by tests to
/// assert the OPRF round-trip is correct (spec §8, invariant 1).
pub fn evaluate_unblinded(p_hex: &str, k: &Scalar) -> String {
    let input_point = curve::hash_to_curve(p_hex.as_bytes());
    curve::point_to_hex(&(input_point * k))
}

/// Derive the server's public key commitment `K = k * G`.
pub fn public_key_commitment(k: &Scalar) -> String {
    curve::point_to_hex(&(generator() * k))
}

/// The server's complete response to a blinded OPRF request (spec §3,
/// "OPRF response"): the evaluated point plus the DLEQ proof that it was
/// computed with the key committed to by `K`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OprfResponse {
    #[serde(rename = "evaluatedPoint")]
    pub evaluated_point: String,
    pub proof: DleqProof,
}

/// Evaluate a blinded point under `k` and attach a Chaum-Pedersen proof
/// tying the evaluation to the committed public key `K = k*G` — the
/// server's whole job for one `/api/scan/image` request (spec §4.9,
/// server state machine).
pub fn respond(blinded_point_hex: &str, k: &Scalar, public_key: &ProjectivePoint) -> Result<OprfResponse> {
    let evaluated = evaluate_server(blinded_point_hex, k)?;
    let blinded_point = curve::point_from_hex(blinded_point_hex)?;
    let proof = zkp::prove(k, public_key, &blinded_point, &evaluated.point);
    Ok(OprfResponse { evaluated_point: evaluated.hex, proof })
}
