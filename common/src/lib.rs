//! Shared plumbing for the hashgate workspace.
//!
//! Every other crate depends on this one for its error type and for the
//! canonical JSON encoding used everywhere a MAC or signature is computed
//! over a structured payload.

pub mod canonical;
pub mod error;
pub mod time;

pub use canonical::{canonical_json, canonical_json_string};
pub use error::{CommonError, Result};
pub use time::now_ms;
