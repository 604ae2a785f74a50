//! `voprf-scan` — a local demo driver for the client-side protocol
//! orchestrator (spec §4.9 "Client state machine").
//!
//! Out of scope for the spec itself (the chat UI and file-upload plumbing
//! are named external collaborators, §1), but every teacher gateway repo
//! ships a thin CLI to exercise its library crate by hand, and this one is
//! the only way to drive a real end-to-end scan against a running
//! `voprf-server` without a browser.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use voprf_client::{ClientError, ScanClient};
use voprf_crypto::vault::FilesystemSink;

#[derive(Parser)]
#[command(name = "voprf-scan")]
#[command(about = "Demo CLI driving the VOPRF perceptual-hash scan client")]
struct Cli {
    /// Base URL of the running `voprf-server`.
    #[arg(long, env = "VOPRF_BASE_URL", default_value = "http://127.0.0.1:8080")]
    base_url: String,

    /// Directory holding the session key and encrypted scan results.
    #[arg(long, env = "VAULT_DIR", default_value = "./vault")]
    vault_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan an image file for membership in the known-bad pHash database.
    Image {
        /// Path to the image file to scan.
        path: PathBuf,
    },
    /// Submit text to the server's keyword-based text-scan collaborator.
    Text {
        /// The text to scan.
        text: String,
    },
    /// Show a previously-stored, decrypted scan result.
    Show {
        /// The id a prior `image` scan printed.
        id: String,
    },
    /// Wipe every stored result and the session key.
    Clear,
}

const SESSION_KEY_FILE: &str = ".session_key";

fn mac_secret() -> Vec<u8> {
    std::env::var("MAC_SECRET")
        .expect("MAC_SECRET must be set: it must match the value the server was started with")
        .into_bytes()
}

fn db_signing_key() -> Vec<u8> {
    std::env::var("DB_SIGNING_KEY")
        .expect("DB_SIGNING_KEY must be set: it must match the value voprf-dbgen signed the manifest with")
        .into_bytes()
}

/// Build a [`voprf_client::Vault`] rooted at `vault_dir`, loading the
/// persisted session key if one exists or generating and persisting a
/// fresh one otherwise (spec §4.8: "regenerated if absent or unloadable").
fn open_vault(vault_dir: &PathBuf) -> voprf_client::Vault {
    let sink = FilesystemSink::open(vault_dir).expect("failed to open vault directory");
    let vault = voprf_client::Vault::new(Box::new(sink));

    let key_path = vault_dir.join(SESSION_KEY_FILE);
    let raw_key = fs::read(&key_path).ok();
    vault
        .load_or_generate_key(raw_key.as_deref())
        .expect("failed to install a session key");

    // Persist whichever key ended up installed (freshly generated or
    // reloaded) so the next CLI invocation in this vault directory can
    // decrypt what this one writes.
    if let Some(key) = vault.current_key_bytes() {
        fs::write(&key_path, key).expect("failed to persist session key");
    }

    vault
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    dotenvy::dotenv().ok();
    let args = Cli::parse();

    let vault = open_vault(&args.vault_dir);

    let client = ScanClient::bootstrap_with_vault(args.base_url.clone(), mac_secret(), db_signing_key(), vault)
        .await
        .unwrap_or_else(|e| panic!("failed to bootstrap scan client: {e}"));

    match args.command {
        Command::Image { path } => {
            let bytes = fs::read(&path).unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
            match client.scan_image(&bytes).await {
                Ok(outcome) => {
                    println!("{}", serde_json::to_string_pretty(&outcome).unwrap());
                }
                Err(ClientError::ScanFailed(_)) => {
                    eprintln!("Scan failed");
                    std::process::exit(1);
                }
                Err(ClientError::ResponseIntegrityFailed(_)) => {
                    eprintln!("Response integrity failed");
                    std::process::exit(1);
                }
                Err(ClientError::ServerProofInvalid(_)) => {
                    eprintln!("Server proof invalid");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("scan failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::Text { text } => match client.scan_text(&text).await {
            Ok(result) => println!("{}", serde_json::to_string_pretty(&result.detail).unwrap()),
            Err(e) => {
                eprintln!("text scan failed: {e}");
                std::process::exit(1);
            }
        },
        Command::Show { id } => {
            let stored: Option<voprf_crypto::match_engine::MatchResponse> =
                client.vault.fetch(&id).unwrap_or_else(|e| panic!("failed to decrypt stored result: {e}"));
            match stored {
                Some(result) => println!("{}", serde_json::to_string_pretty(&result).unwrap()),
                None => {
                    eprintln!("no stored result for id {id}");
                    std::process::exit(1);
                }
            }
        }
        Command::Clear => {
            client.vault.clear_all().expect("failed to clear vault");
            let key_path = args.vault_dir.join(SESSION_KEY_FILE);
            let _ = fs::remove_file(key_path);
            info!("vault cleared");
        }
    }
}
