//! Client-side error taxonomy (spec §4.9, §7).
//!
//! Carries the state machine's `FAIL:*` labels as `Display` text so a
//! caller (CLI demo, or the out-of-scope chat UI) can surface the exact
//! user-visible strings spec §7 names, without re-deriving them from the
//! underlying `CryptoError` variant.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Entering `HASHING` before the DB manifest has been verified this
    /// session (spec §4.9 precondition).
    #[error("scan refused: database manifest has not been verified this session")]
    DbUnverified,

    /// A transport-level failure reaching the server. Not retried for
    /// image scans (spec §7): retrying wouldn't change a deterministic
    /// verification outcome, and for transport errors there was no
    /// outcome to retry in the first place.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// `FAIL:DecodeError` — the image could not be turned into a pHash.
    #[error("Scan failed")]
    ScanFailed(#[source] voprf_crypto::CryptoError),

    /// `FAIL:MacError` — the envelope's freshness or MAC check failed.
    #[error("Response integrity failed")]
    ResponseIntegrityFailed(#[source] voprf_crypto::CryptoError),

    /// `FAIL:ProofError` — the DLEQ proof did not verify.
    #[error("Server proof invalid")]
    ServerProofInvalid(#[source] voprf_crypto::CryptoError),

    /// Any other crypto-engine failure (unblind/match/vault) that
    /// doesn't carry one of the three named `FAIL:*` labels above.
    #[error(transparent)]
    Crypto(#[from] voprf_crypto::CryptoError),
}
