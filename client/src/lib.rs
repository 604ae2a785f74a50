//! Client-side protocol orchestrator (spec §4.9, component C9).
//!
//! Drives the full scan state machine: `IDLE -> HASHING -> BLINDING ->
//! AWAIT_SERVER -> VERIFY_ENV -> VERIFY_PROOF -> UNBLIND -> MATCH ->
//! ENCRYPT_STORE -> IDLE`. Every phase transition is logged; every
//! cryptographic verification failure is fail-closed and surfaces one of
//! the three named `FAIL:*` labels from spec §4.9/§7.

#![warn(missing_docs)]

pub mod error;
pub mod session;

use p256::ProjectivePoint;
use tracing::{debug, warn};

use voprf_crypto::mac::Envelope;
use voprf_crypto::match_engine::DEFAULT_THRESHOLD;
use voprf_crypto::oprf::OprfResponse;
use voprf_crypto::{curve, manifest, match_engine, mac, oprf, phash, zkp, CryptoError, DbEntry, MatchResponse};

pub use error::{ClientError, Result};
pub use session::Vault;

/// `{"status": "safe"|"warning"|"blocked", "detail": {...}}`, mirroring
/// `voprf-server::services::textscan::ScanResult` without taking a
/// dependency on the server crate — the client only needs to deserialize
/// the wire shape, not the keyword lists behind it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TextScanResult {
    pub status: String,
    pub detail: serde_json::Value,
}

/// The outcome of one image scan: the `{matched, distance?, file?}` match
/// result plus the id it was stored under in the result vault (spec
/// §4.8), so a caller (e.g. the `voprf-scan` CLI) can fetch it again
/// later without needing to recompute or retain the unblinded token.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScanOutcome {
    pub result: MatchResponse,
    pub vault_id: String,
}

/// The client-side protocol orchestrator for one session: holds the
/// server's verified key commitment, the verified evaluated-hash
/// database, and the session's result vault.
pub struct ScanClient {
    base_url: String,
    http: reqwest::Client,
    mac_secret: Vec<u8>,
    db_signing_key: Vec<u8>,
    server_public_key: ProjectivePoint,
    db: Vec<DbEntry>,
    db_verified: bool,
    pub vault: Vault,
}

impl ScanClient {
    /// Fetch the server's key commitment and evaluated-hash database,
    /// verify the manifest, and return a client ready to scan.
    ///
    /// Spec §4.9 precondition: entering `HASHING` requires the DB
    /// manifest to have verified successfully in the current session —
    /// this is how that precondition gets satisfied before the first
    /// scan.
    pub async fn bootstrap(base_url: impl Into<String>, mac_secret: Vec<u8>, db_signing_key: Vec<u8>) -> Result<Self> {
        Self::bootstrap_with_vault(base_url, mac_secret, db_signing_key, Vault::in_memory()).await
    }

    /// As [`Self::bootstrap`], but wired to a caller-supplied [`Vault`]
    /// instead of the in-memory default — e.g. a `voprf-scan` CLI run
    /// backed by a [`voprf_crypto::vault::FilesystemSink`] rooted at a
    /// `--vault-dir`.
    pub async fn bootstrap_with_vault(
        base_url: impl Into<String>,
        mac_secret: Vec<u8>,
        db_signing_key: Vec<u8>,
        vault: Vault,
    ) -> Result<Self> {
        let base_url = base_url.into();
        let http = reqwest::Client::new();

        let commitment: serde_json::Value = http
            .get(format!("{base_url}/server_key_commitment.json"))
            .send()
            .await?
            .json()
            .await?;
        let public_key_hex = commitment["publicKey"]
            .as_str()
            .ok_or_else(|| CryptoError::BadPoint("server_key_commitment.json missing publicKey".into()))?;
        let server_public_key = curve::point_from_hex(public_key_hex)?;

        let mut client = Self {
            base_url,
            http,
            mac_secret,
            db_signing_key,
            server_public_key,
            db: Vec::new(),
            db_verified: false,
            vault,
        };
        client.verify_db().await?;
        Ok(client)
    }

    /// Re-fetch and re-verify the evaluated-hash database manifest
    /// (spec §4.6: "at startup and before each scan").
    pub async fn verify_db(&mut self) -> Result<()> {
        let db_bytes = self
            .http
            .get(format!("{}/eHashes/evaluated_phashes.json", self.base_url))
            .send()
            .await?
            .bytes()
            .await?;
        let manifest_bytes = self
            .http
            .get(format!("{}/eHashes/database_signature.json", self.base_url))
            .send()
            .await?
            .bytes()
            .await?;

        let parsed_manifest: manifest::Manifest = serde_json::from_slice(&manifest_bytes)
            .map_err(|_| CryptoError::DBSigMismatch)?;
        manifest::verify(&parsed_manifest, &db_bytes, &self.db_signing_key)?;

        self.db = serde_json::from_slice(&db_bytes).map_err(|_| CryptoError::DBHashMismatch)?;
        self.db_verified = true;
        debug!(entries = self.db.len(), "database manifest verified");
        Ok(())
    }

    /// Run one full scan: pHash -> blind -> call the server -> verify ->
    /// unblind -> match -> encrypt and store.
    pub async fn scan_image(&self, image_bytes: &[u8]) -> Result<ScanOutcome> {
        if !self.db_verified {
            return Err(ClientError::DbUnverified);
        }

        debug!("HASHING");
        let p_hex = phash::phash(image_bytes).map_err(ClientError::ScanFailed)?;

        debug!("BLINDING");
        let blinded = oprf::blind(&p_hex);

        debug!("AWAIT_SERVER");
        let form = reqwest::multipart::Form::new().text("blindedPoint", blinded.blinded_point.clone());
        let response = self
            .http
            .post(format!("{}/api/scan/image", self.base_url))
            .multipart(form)
            .send()
            .await?;
        let envelope: Envelope<OprfResponse> = response.json().await?;

        debug!("VERIFY_ENV");
        let oprf_response = mac::unwrap(envelope, &self.mac_secret).map_err(|e| {
            warn!(error = %e, "envelope verification failed");
            ClientError::ResponseIntegrityFailed(e)
        })?;

        debug!("VERIFY_PROOF");
        let blinded_point = curve::point_from_hex(&blinded.blinded_point)?;
        let q = curve::point_from_hex(&oprf_response.evaluated_point)?;
        zkp::verify(&oprf_response.proof, &self.server_public_key, &blinded_point, &q).map_err(|e| {
            warn!(error = %e, "DLEQ proof verification failed");
            ClientError::ServerProofInvalid(e)
        })?;

        debug!("UNBLIND");
        let token = oprf::unblind(&oprf_response.evaluated_point, &blinded.blinding_factor)?;

        debug!("MATCH");
        let match_outcome = match_engine::find_match(&token, &self.db, DEFAULT_THRESHOLD)?;
        let result: MatchResponse = match_outcome.into();

        debug!("ENCRYPT_STORE");
        let vault_id = token[..16].to_string();
        self.vault.encrypt_and_store(&vault_id, &result)?;

        Ok(ScanOutcome { result, vault_id })
    }

    /// Submit `text` to the server's text-scan collaborator and verify
    /// the returned envelope.
    pub async fn scan_text(&self, text: &str) -> Result<TextScanResult> {
        let response = self
            .http
            .post(format!("{}/api/scan", self.base_url))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;
        let envelope: Envelope<TextScanResult> = response.json().await?;
        mac::unwrap(envelope, &self.mac_secret).map_err(|e| {
            warn!(error = %e, "text-scan envelope verification failed");
            ClientError::ResponseIntegrityFailed(e)
        })
    }

    /// The server's public key commitment this client verified at
    /// bootstrap, hex-encoded.
    pub fn server_public_key_hex(&self) -> String {
        curve::point_to_hex(&self.server_public_key)
    }
}

/// Placeholder module documenting the two non-cryptographic blinding
/// schemes the original client-side-scanning source mixed in alongside
/// the real EC-OPRF path (string concatenation with a random tag). Spec
/// §9 calls these vestigial; this crate implements only the OPRF path
/// above and intentionally has no equivalent of them.
#[doc(hidden)]
pub mod _vestigial_schemes_not_implemented {}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::elliptic_curve::Field;
    use p256::{ProjectivePoint, Scalar};
    use rand_core::OsRng;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    const MAC_SECRET: &[u8] = b"test-mac-secret";
    const DB_SIGNING_KEY: &[u8] = b"test-db-signing-key";

    fn solid_png(rgb: [u8; 3]) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(64, 64, image::Rgb(rgb));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    /// Pull the `blindedPoint` field's value out of a
    /// `multipart/form-data` body without a full multipart parser — this
    /// only ever sees bodies this crate's own `reqwest::multipart::Form`
    /// produced.
    fn extract_blinded_point(body: &[u8]) -> String {
        let text = String::from_utf8_lossy(body);
        let name_at = text.find("name=\"blindedPoint\"").expect("blindedPoint field missing from request body");
        let after_name = &text[name_at..];
        let value_at = after_name.find("\r\n\r\n").expect("malformed multipart body") + 4;
        let value_region = &after_name[value_at..];
        let value_end = value_region.find("\r\n--").unwrap_or(value_region.len());
        value_region[..value_end].to_string()
    }

    /// An honest server: evaluates under the key it actually committed to.
    struct HonestOprfResponder {
        k: Scalar,
        public_key: ProjectivePoint,
    }

    impl Respond for HonestOprfResponder {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let blinded_hex = extract_blinded_point(&request.body);
            let response = oprf::respond(&blinded_hex, &self.k, &self.public_key).expect("oprf::respond failed");
            let envelope = mac::wrap(response, MAC_SECRET).expect("mac::wrap failed");
            ResponseTemplate::new(200).set_body_json(&envelope)
        }
    }

    /// A cheating server: evaluates under `wrong_k` while the public key
    /// commitment the client already trusts still claims `k` (spec §8
    /// scenario 4, "Cheating server").
    struct CheatingOprfResponder {
        wrong_k: Scalar,
        committed_public_key: ProjectivePoint,
    }

    impl Respond for CheatingOprfResponder {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let blinded_hex = extract_blinded_point(&request.body);
            let response = oprf::respond(&blinded_hex, &self.wrong_k, &self.committed_public_key)
                .expect("oprf::respond failed");
            let envelope = mac::wrap(response, MAC_SECRET).expect("mac::wrap failed");
            ResponseTemplate::new(200).set_body_json(&envelope)
        }
    }

    /// Serve the key commitment and a DB/manifest pair built around one
    /// known-bad pHash, wiring a `voprf-server`-equivalent responder for
    /// `/api/scan/image`.
    async fn mount_server(server: &MockServer, k: &Scalar, db: Vec<DbEntry>, image_responder: impl Respond + 'static) {
        let public_key = curve::generator() * k;

        Mock::given(method("GET"))
            .and(path("/server_key_commitment.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "publicKey": curve::point_to_hex(&public_key),
                "timestamp": voprf_common::now_ms(),
                "version": "v1",
            })))
            .mount(server)
            .await;

        let db_bytes = serde_json::to_vec(&db).unwrap();
        let manifest = manifest::generate(&db_bytes, DB_SIGNING_KEY, "v1");

        Mock::given(method("GET"))
            .and(path("/eHashes/evaluated_phashes.json"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(db_bytes))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/eHashes/database_signature.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&manifest))
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/scan/image"))
            .respond_with(image_responder)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn happy_path_image_scan_matches_the_database() {
        let k = Scalar::random(&mut OsRng);
        let public_key = curve::generator() * k;
        let image_bytes = solid_png([12, 200, 44]);
        let p_hex = phash::phash(&image_bytes).unwrap();
        let token = oprf::evaluate_unblinded(&p_hex, &k);
        let db = vec![DbEntry { file: "known-bad-1".into(), phash: token }];

        let server = MockServer::start().await;
        mount_server(&server, &k, db, HonestOprfResponder { k, public_key }).await;

        let client = ScanClient::bootstrap(server.uri(), MAC_SECRET.to_vec(), DB_SIGNING_KEY.to_vec())
            .await
            .unwrap();
        let outcome = client.scan_image(&image_bytes).await.unwrap();
        assert!(outcome.result.matched);
        assert_eq!(outcome.result.distance, Some(0));
        assert_eq!(outcome.result.file.as_deref(), Some("known-bad-1"));

        let stored: MatchResponse = client.vault.fetch(&outcome.vault_id).unwrap().unwrap();
        assert!(stored.matched);
    }

    #[tokio::test]
    async fn miss_when_the_tokens_database_does_not_contain_this_image() {
        let k = Scalar::random(&mut OsRng);
        let public_key = curve::generator() * k;
        let image_bytes = solid_png([1, 2, 3]);
        let unrelated_token = oprf::evaluate_unblinded("0123456789abcdef", &k);
        let db = vec![DbEntry { file: "unrelated".into(), phash: unrelated_token }];

        let server = MockServer::start().await;
        mount_server(&server, &k, db, HonestOprfResponder { k, public_key }).await;

        let client = ScanClient::bootstrap(server.uri(), MAC_SECRET.to_vec(), DB_SIGNING_KEY.to_vec())
            .await
            .unwrap();
        let outcome = client.scan_image(&image_bytes).await.unwrap();
        assert!(!outcome.result.matched);
    }

    #[tokio::test]
    async fn cheating_server_is_caught_by_the_dleq_proof() {
        let k = Scalar::random(&mut OsRng);
        let wrong_k = Scalar::random(&mut OsRng);
        let public_key = curve::generator() * k;
        let image_bytes = solid_png([50, 60, 70]);

        let server = MockServer::start().await;
        mount_server(&server, &k, Vec::new(), CheatingOprfResponder { wrong_k, committed_public_key: public_key })
            .await;

        let client = ScanClient::bootstrap(server.uri(), MAC_SECRET.to_vec(), DB_SIGNING_KEY.to_vec())
            .await
            .unwrap();
        let err = client.scan_image(&image_bytes).await.unwrap_err();
        assert!(matches!(err, ClientError::ServerProofInvalid(CryptoError::EqG)));
    }

    #[tokio::test]
    async fn tampered_envelope_mac_is_rejected() {
        let k = Scalar::random(&mut OsRng);
        let public_key = curve::generator() * k;
        let image_bytes = solid_png([90, 91, 92]);

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/server_key_commitment.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "publicKey": curve::point_to_hex(&public_key),
                "timestamp": voprf_common::now_ms(),
                "version": "v1",
            })))
            .mount(&server)
            .await;
        let db_bytes = serde_json::to_vec(&Vec::<DbEntry>::new()).unwrap();
        let manifest = manifest::generate(&db_bytes, DB_SIGNING_KEY, "v1");
        Mock::given(method("GET"))
            .and(path("/eHashes/evaluated_phashes.json"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(db_bytes))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/eHashes/database_signature.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&manifest))
            .mount(&server)
            .await;

        struct TamperedMacResponder {
            k: Scalar,
            public_key: ProjectivePoint,
        }
        impl Respond for TamperedMacResponder {
            fn respond(&self, request: &Request) -> ResponseTemplate {
                let blinded_hex = extract_blinded_point(&request.body);
                let response = oprf::respond(&blinded_hex, &self.k, &self.public_key).unwrap();
                let mut envelope = mac::wrap(response, MAC_SECRET).unwrap();
                let last = envelope.mac.len() - 1;
                let mut chars: Vec<char> = envelope.mac.chars().collect();
                chars[last] = if chars[last] == '0' { '1' } else { '0' };
                envelope.mac = chars.into_iter().collect();
                ResponseTemplate::new(200).set_body_json(&envelope)
            }
        }
        Mock::given(method("POST"))
            .and(path("/api/scan/image"))
            .respond_with(TamperedMacResponder { k, public_key })
            .mount(&server)
            .await;

        let client = ScanClient::bootstrap(server.uri(), MAC_SECRET.to_vec(), DB_SIGNING_KEY.to_vec())
            .await
            .unwrap();
        let err = client.scan_image(&image_bytes).await.unwrap_err();
        assert!(matches!(err, ClientError::ResponseIntegrityFailed(CryptoError::MacMismatch)));
    }

    #[tokio::test]
    async fn expired_db_manifest_refuses_bootstrap() {
        let k = Scalar::random(&mut OsRng);
        let public_key = curve::generator() * k;

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/server_key_commitment.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "publicKey": curve::point_to_hex(&public_key),
                "timestamp": voprf_common::now_ms(),
                "version": "v1",
            })))
            .mount(&server)
            .await;

        let db_bytes = serde_json::to_vec(&Vec::<DbEntry>::new()).unwrap();
        let mut stale_manifest = manifest::generate(&db_bytes, DB_SIGNING_KEY, "v1");
        stale_manifest.timestamp -= manifest::MAX_MANIFEST_AGE_MS + 1;
        // Re-sign so the hash/timestamp/version triple is still internally
        // consistent; only its age should trip verification.
        stale_manifest.signature = {
            use hmac::{Hmac, Mac as HmacTrait};
            use sha2::Sha256;
            let mut mac = Hmac::<Sha256>::new_from_slice(DB_SIGNING_KEY).unwrap();
            mac.update(stale_manifest.hash.as_bytes());
            mac.update(b":");
            mac.update(stale_manifest.timestamp.to_string().as_bytes());
            mac.update(b":");
            mac.update(stale_manifest.version.as_bytes());
            hex::encode(mac.finalize().into_bytes())
        };

        Mock::given(method("GET"))
            .and(path("/eHashes/evaluated_phashes.json"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(db_bytes))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/eHashes/database_signature.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&stale_manifest))
            .mount(&server)
            .await;

        let err = ScanClient::bootstrap(server.uri(), MAC_SECRET.to_vec(), DB_SIGNING_KEY.to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Crypto(CryptoError::DBExpired { .. })));
    }

    #[tokio::test]
    async fn text_scan_round_trips_through_the_envelope() {
        let server = MockServer::start().await;
        let result = crate::TextScanResult {
            status: "blocked".to_string(),
            detail: serde_json::json!({ "severity": "blocked", "reason": "text contains blocked keyword \"ransomware\"" }),
        };
        let envelope = mac::wrap(result, MAC_SECRET).unwrap();
        Mock::given(method("POST"))
            .and(path("/api/scan"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&envelope))
            .mount(&server)
            .await;

        // scan_text doesn't need a verified DB, so build the client by
        // hand rather than going through the full bootstrap dance.
        let client = ScanClient {
            base_url: server.uri(),
            http: reqwest::Client::new(),
            mac_secret: MAC_SECRET.to_vec(),
            db_signing_key: DB_SIGNING_KEY.to_vec(),
            server_public_key: curve::generator(),
            db: Vec::new(),
            db_verified: true,
            vault: Vault::in_memory(),
        };
        let response = client.scan_text("this message mentions ransomware").await.unwrap();
        assert_eq!(response.status, "blocked");
    }
}
