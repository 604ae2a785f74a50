//! Gateway-side services: the text-scan collaborator and nothing else.
//!
//! The cryptographic engine itself lives in `voprf-crypto`; this module
//! only holds ambient server-side plumbing that sits on top of it.

pub mod textscan;
