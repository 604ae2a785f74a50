//! Error types shared by every crate in the workspace.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors that can occur in the ambient, crypto-agnostic plumbing: canonical
/// encoding and the handful of helpers every other crate builds on.
#[derive(Debug, Error)]
pub enum CommonError {
    #[error("failed to encode value as canonical JSON: {0}")]
    CanonicalEncode(#[from] serde_json::Error),
}
