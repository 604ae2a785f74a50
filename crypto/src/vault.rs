//! Session-scoped result vault (spec §4.8, component C8).
//!
//! Encrypts scan outcomes at rest under a session-scoped AES-256-GCM key.
//! The key never touches durable storage; only ciphertext, IV, and a
//! timestamp do. Mirrors the AEAD call shape the teacher's sibling crypto
//! homework uses (`aead::Payload` with empty associated data) rather than
//! inventing a bespoke envelope around `aes-gcm`.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand_core::{OsRng, RngCore};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CryptoError, Result};

/// Length in bytes of the session AES-256 key.
pub const KEY_LEN: usize = 32;
/// Length in bytes of a GCM nonce/IV.
const IV_LEN: usize = 12;

/// An encrypted scan outcome, as held in the pluggable [`ResultSink`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedResult {
    /// Base64 of the GCM ciphertext (includes the 16-byte tag suffix).
    pub ciphertext: String,
    /// Base64 of the 12-byte random IV.
    pub iv: String,
    /// Epoch-millisecond time of encryption.
    pub timestamp: i64,
}

/// A 256-bit session key, held only in memory for the lifetime of one
/// client session.
#[derive(Clone)]
pub struct SessionKey([u8; KEY_LEN]);

impl SessionKey {
    /// Generate a fresh key via the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        SessionKey(bytes)
    }

    /// Load a previously-persisted key from its raw bytes, failing if the
    /// slice isn't exactly [`KEY_LEN`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::CorruptBlob(format!(
                "session key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut array = [0u8; KEY_LEN];
        array.copy_from_slice(bytes);
        Ok(SessionKey(array))
    }

    /// Raw key bytes, for persisting to the well-known session slot.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for SessionKey {
    fn drop(&mut self) {
        self.0 = [0u8; KEY_LEN];
    }
}

/// Encrypt `obj` under `key`, returning the wire-ready [`EncryptedResult`].
///
/// `obj` is serialized via canonical JSON, matching the same encoding
/// rule used for MAC/manifest coverage elsewhere in the protocol, then
/// sealed with AES-256-GCM and no associated data.
pub fn encrypt<T: Serialize>(obj: &T, key: &SessionKey) -> Result<EncryptedResult> {
    let plaintext = voprf_common::canonical_json(obj)?;

    let mut iv_bytes = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv_bytes);
    let nonce = Nonce::from_slice(&iv_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let ciphertext = cipher
        .encrypt(nonce, Payload { msg: &plaintext, aad: &[] })
        .map_err(|_| CryptoError::AuthFailure)?;

    Ok(EncryptedResult {
        ciphertext: BASE64.encode(ciphertext),
        iv: BASE64.encode(iv_bytes),
        timestamp: voprf_common::now_ms() as i64,
    })
}

/// Decrypt an [`EncryptedResult`] back to `T`.
///
/// Structural problems (bad base64, wrong-length IV) raise `CorruptBlob`;
/// a GCM authentication failure (wrong key, tampered ciphertext/IV) raises
/// `AuthFailure`.
pub fn decrypt<T: DeserializeOwned>(enc: &EncryptedResult, key: &SessionKey) -> Result<T> {
    let ciphertext = BASE64
        .decode(&enc.ciphertext)
        .map_err(|e| CryptoError::CorruptBlob(format!("ciphertext is not valid base64: {e}")))?;
    let iv_bytes = BASE64
        .decode(&enc.iv)
        .map_err(|e| CryptoError::CorruptBlob(format!("iv is not valid base64: {e}")))?;
    if iv_bytes.len() != IV_LEN {
        return Err(CryptoError::CorruptBlob(format!(
            "iv must be {IV_LEN} bytes, got {}",
            iv_bytes.len()
        )));
    }
    let nonce = Nonce::from_slice(&iv_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let plaintext = cipher
        .decrypt(nonce, Payload { msg: &ciphertext, aad: &[] })
        .map_err(|_| CryptoError::AuthFailure)?;

    serde_json::from_slice(&plaintext)
        .map_err(|e| CryptoError::CorruptBlob(format!("decrypted payload is not valid JSON: {e}")))
}

/// Prefix every vault entry's key carries in the durable sink (spec §4.8).
pub const RESULT_KEY_PREFIX: &str = "result_";

/// A pluggable key-value sink for encrypted results.
///
/// The spec treats "storage of cached ciphertexts" as an external
/// collaborator; this trait is the seam. [`InMemorySink`] backs tests, and
/// `voprf-server`/`voprf-client` each wire a filesystem-backed
/// implementation for local/dev runs.
pub trait ResultSink {
    /// Store `value` (already `result_`-prefixed) under `key`.
    fn put(&mut self, key: &str, value: &EncryptedResult) -> Result<()>;
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<EncryptedResult>>;
    /// Remove every key carrying [`RESULT_KEY_PREFIX`], and by convention
    /// the caller also zeroes the session key at the same time.
    fn clear_all(&mut self) -> Result<()>;
}

/// An in-memory [`ResultSink`], used by tests and as the default when no
/// durable sink is configured.
#[derive(Default)]
pub struct InMemorySink {
    entries: HashMap<String, EncryptedResult>,
}

impl ResultSink for InMemorySink {
    fn put(&mut self, key: &str, value: &EncryptedResult) -> Result<()> {
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<EncryptedResult>> {
        Ok(self.entries.get(key).cloned())
    }

    fn clear_all(&mut self) -> Result<()> {
        self.entries.retain(|k, _| !k.starts_with(RESULT_KEY_PREFIX));
        Ok(())
    }
}

/// A directory-backed [`ResultSink`] for local/dev runs: one JSON file per
/// entry, named after its key. "Storage of cached ciphertexts" is an
/// external collaborator per the spec (§1); this is the obvious local
/// stand-in for whatever a real deployment's key-value store would be,
/// kept dumb on purpose — no locking beyond what the filesystem gives a
/// single-writer client for free (spec §5).
pub struct FilesystemSink {
    dir: std::path::PathBuf,
}

impl FilesystemSink {
    /// Open (creating if necessary) a filesystem sink rooted at `dir`.
    pub fn open(dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| CryptoError::CorruptBlob(format!("cannot create vault directory: {e}")))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> std::path::PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl ResultSink for FilesystemSink {
    fn put(&mut self, key: &str, value: &EncryptedResult) -> Result<()> {
        let json = serde_json::to_vec(value)
            .map_err(|e| CryptoError::CorruptBlob(format!("failed to encode vault entry: {e}")))?;
        std::fs::write(self.path_for(key), json)
            .map_err(|e| CryptoError::CorruptBlob(format!("failed to write vault entry: {e}")))
    }

    fn get(&self, key: &str) -> Result<Option<EncryptedResult>> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| CryptoError::CorruptBlob(format!("vault entry is not valid JSON: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CryptoError::CorruptBlob(format!("failed to read vault entry: {e}"))),
        }
    }

    fn clear_all(&mut self) -> Result<()> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| CryptoError::CorruptBlob(format!("failed to list vault directory: {e}")))?;
        for entry in entries {
            let entry = entry.map_err(|e| CryptoError::CorruptBlob(format!("failed to read vault entry: {e}")))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(RESULT_KEY_PREFIX) {
                std::fs::remove_file(entry.path())
                    .map_err(|e| CryptoError::CorruptBlob(format!("failed to remove vault entry: {e}")))?;
            }
        }
        Ok(())
    }
}
