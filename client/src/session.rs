//! Session-scoped, single-writer client state (spec §5, §4.8).
//!
//! The session AES key and the result sink are each a single-writer,
//! multi-reader artifact behind a `RefCell` — the client orchestrator is
//! single-threaded cooperative, so a `Mutex` buys nothing the spec asks
//! for (spec §5 "Shared mutable state").

use std::cell::RefCell;

use voprf_crypto::vault::{InMemorySink, ResultSink, SessionKey};

/// Holds the session's AES key and its pluggable result sink, lazily
/// initializing the key on first use the way the spec's §4.8 "Key
/// management" describes.
pub struct Vault {
    key: RefCell<Option<SessionKey>>,
    sink: RefCell<Box<dyn ResultSink>>,
}

impl Vault {
    /// Build a vault over the given sink, with no session key loaded yet.
    pub fn new(sink: Box<dyn ResultSink>) -> Self {
        Self { key: RefCell::new(None), sink: RefCell::new(sink) }
    }

    /// Build a vault backed by an in-memory sink, for tests and demos
    /// with no durable storage requirement.
    pub fn in_memory() -> Self {
        Self::new(Box::new(InMemorySink::default()))
    }

    /// Load the key the caller has already persisted to the well-known
    /// session slot, or generate and install a fresh one if `raw_key` is
    /// `None` or fails to parse (spec §4.8: "regenerated if absent or
    /// unloadable").
    pub fn load_or_generate_key(&self, raw_key: Option<&[u8]>) -> voprf_crypto::Result<()> {
        let key = match raw_key {
            Some(bytes) => SessionKey::from_bytes(bytes).unwrap_or_else(|_| SessionKey::generate()),
            None => SessionKey::generate(),
        };
        *self.key.borrow_mut() = Some(key);
        Ok(())
    }

    fn ensure_key(&self) {
        if self.key.borrow().is_none() {
            *self.key.borrow_mut() = Some(SessionKey::generate());
        }
    }

    /// The raw bytes of whichever session key is currently installed, if
    /// any — for a caller that wants to persist it to a well-known slot
    /// (spec §4.8) itself, e.g. the `voprf-scan` CLI writing it to a file
    /// under `--vault-dir`. `ensure_key` is not run first: a caller that
    /// wants a key guaranteed to exist should call
    /// [`Self::load_or_generate_key`] first.
    pub fn current_key_bytes(&self) -> Option<[u8; voprf_crypto::vault::KEY_LEN]> {
        self.key.borrow().as_ref().map(|k| *k.as_bytes())
    }

    /// Encrypt `obj` and store it under `result_{id}`, generating a
    /// session key on first use if none has been loaded.
    pub fn encrypt_and_store<T: serde::Serialize>(&self, id: &str, obj: &T) -> voprf_crypto::Result<()> {
        self.ensure_key();
        let key_ref = self.key.borrow();
        let key = key_ref.as_ref().expect("key was just ensured");
        let encrypted = voprf_crypto::vault::encrypt(obj, key)?;
        self.sink.borrow_mut().put(&format!("{}{id}", voprf_crypto::vault::RESULT_KEY_PREFIX), &encrypted)
    }

    /// Fetch and decrypt a previously-stored result.
    pub fn fetch<T: serde::de::DeserializeOwned>(&self, id: &str) -> voprf_crypto::Result<Option<T>> {
        let stored = self.sink.borrow().get(&format!("{}{id}", voprf_crypto::vault::RESULT_KEY_PREFIX))?;
        let Some(encrypted) = stored else { return Ok(None) };
        let key_ref = self.key.borrow();
        let key = key_ref.as_ref().ok_or(voprf_crypto::CryptoError::AuthFailure)?;
        Ok(Some(voprf_crypto::vault::decrypt(&encrypted, key)?))
    }

    /// Remove every stored result and drop the session key (spec §4.8
    /// `clear_all`).
    pub fn clear_all(&self) -> voprf_crypto::Result<()> {
        self.sink.borrow_mut().clear_all()?;
        *self.key.borrow_mut() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Outcome {
        matched: bool,
    }

    #[test]
    fn store_then_fetch_round_trips() {
        let vault = Vault::in_memory();
        vault.encrypt_and_store("abc", &Outcome { matched: true }).unwrap();
        let fetched: Option<Outcome> = vault.fetch("abc").unwrap();
        assert_eq!(fetched, Some(Outcome { matched: true }));
    }

    #[test]
    fn clear_all_drops_the_key_and_every_entry() {
        let vault = Vault::in_memory();
        vault.encrypt_and_store("abc", &Outcome { matched: true }).unwrap();
        vault.clear_all().unwrap();
        let fetched: Option<Outcome> = vault.fetch("abc").unwrap();
        assert_eq!(fetched, None);
    }

    #[test]
    fn unloadable_raw_key_falls_back_to_a_generated_one() {
        let vault = Vault::in_memory();
        vault.load_or_generate_key(Some(b"too-short")).unwrap();
        vault.encrypt_and_store("abc", &Outcome { matched: true }).unwrap();
        let fetched: Option<Outcome> = vault.fetch("abc").unwrap();
        assert_eq!(fetched, Some(Outcome { matched: true }));
    }
}
