//! VOPRF-over-P256 cryptographic engine.
//!
//! Implements the full client/server cryptographic surface of the
//! privacy-preserving perceptual-hash membership protocol: pHash
//! computation (C1), P-256 curve primitives (C2), OPRF blind/evaluate/
//! unblind (C3), the Chaum-Pedersen DLEQ proof (C4), the MAC envelope
//! (C5), the signed DB manifest (C6), the Hamming-distance match engine
//! (C7), and the AES-256-GCM result vault (C8). Nothing here knows about
//! HTTP, the environment, or a particular transport — those live in
//! `voprf-server` and `voprf-client`.

#![warn(missing_docs)]
#![allow(clippy::needless_range_loop)]

pub mod curve;
pub mod error;
pub mod mac;
pub mod manifest;
pub mod match_engine;
pub mod oprf;
pub mod phash;
pub mod vault;
pub mod zkp;

pub use error::{CryptoError, Result};
pub use mac::Envelope;
pub use manifest::Manifest;
pub use match_engine::{DbEntry, MatchOutcome, MatchResponse};
pub use oprf::{Blinded, OprfResponse};
pub use vault::EncryptedResult;
pub use zkp::DleqProof;
