//! Error taxonomy for the VOPRF cryptographic engine.
//!
//! Every variant here is fail-closed: once raised, a caller must not fall
//! back to an insecure path. See each module for which operations raise
//! which variant.

/// Result type for `voprf-crypto` operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors raised by the pHash, curve, OPRF, proof, envelope, manifest,
/// match, and vault primitives.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The image could not be decoded, or decoded to an unusable size.
    #[error("image could not be decoded: {0}")]
    DecodeError(String),

    /// A point supplied on the wire failed to parse as a valid,
    /// non-identity P-256 point.
    #[error("invalid or infinite point: {0}")]
    BadPoint(String),

    /// The Fiat-Shamir challenge recomputed by the verifier does not match
    /// the one carried in the proof.
    #[error("DLEQ challenge mismatch")]
    ChallengeMismatch,

    /// `s*G != R1 + c*K`: the proof is not consistent with the committed
    /// key.
    #[error("DLEQ verification failed on the G leg")]
    EqG,

    /// `s*P' != R2 + c*Q`: the proof is not consistent with the claimed
    /// evaluation.
    #[error("DLEQ verification failed on the P' leg")]
    EqP,

    /// An envelope's timestamp is older than the configured freshness
    /// window.
    #[error("envelope timestamp is stale (age {age_ms}ms > max {max_ms}ms)")]
    Stale {
        /// Observed age of the envelope in milliseconds.
        age_ms: i64,
        /// Configured maximum age in milliseconds.
        max_ms: i64,
    },

    /// An envelope's timestamp is further in the future than the
    /// configured slack allows.
    #[error("envelope timestamp is in the future (skew {skew_ms}ms > slack {slack_ms}ms)")]
    Future {
        /// How far in the future the timestamp claims to be, in milliseconds.
        skew_ms: i64,
        /// Configured future tolerance in milliseconds.
        slack_ms: i64,
    },

    /// The envelope's MAC does not match the recomputed MAC.
    #[error("envelope MAC mismatch")]
    MacMismatch,

    /// The recomputed hash of the DB bytes does not match the manifest.
    #[error("database content hash does not match manifest")]
    DBHashMismatch,

    /// The manifest's signature does not match the recomputed signature.
    #[error("database manifest signature mismatch")]
    DBSigMismatch,

    /// The manifest is older than the 30-day rollback window.
    #[error("database manifest expired (age {age_ms}ms > 30 days)")]
    DBExpired {
        /// Observed age of the manifest in milliseconds.
        age_ms: i64,
    },

    /// AES-GCM authentication failed while decrypting a vault entry.
    #[error("vault entry failed authentication")]
    AuthFailure,

    /// A vault entry's ciphertext or IV could not even be base64-decoded,
    /// or decoded to an implausible length.
    #[error("vault entry is structurally corrupt: {0}")]
    CorruptBlob(String),

    /// Canonical JSON encoding failed (delegates to `voprf-common`).
    #[error(transparent)]
    Common(#[from] voprf_common::CommonError),
}

impl CryptoError {
    /// HTTP status code a gateway handler should map this to.
    pub fn status_code(&self) -> u16 {
        match self {
            CryptoError::DecodeError(_) => 422,
            CryptoError::BadPoint(_) => 400,
            CryptoError::ChallengeMismatch | CryptoError::EqG | CryptoError::EqP => 502,
            CryptoError::Stale { .. } | CryptoError::Future { .. } | CryptoError::MacMismatch => {
                502
            }
            CryptoError::DBHashMismatch
            | CryptoError::DBSigMismatch
            | CryptoError::DBExpired { .. } => 503,
            CryptoError::AuthFailure | CryptoError::CorruptBlob(_) => 500,
            CryptoError::Common(_) => 500,
        }
    }
}
