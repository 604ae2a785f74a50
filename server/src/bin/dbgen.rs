//! Offline database-curation tool (spec §4.6 "Generation", §9 design
//! notes).
//!
//! Builds the three static artifacts the gateway serves from disk: the
//! evaluated-hash database, its signed manifest, and the server's key
//! commitment. None of this runs in the request path — it is operator
//! tooling, run whenever the known-bad pHash list changes.

use std::env;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use voprf_crypto::curve;
use voprf_crypto::{manifest, oprf, DbEntry};

#[derive(Parser)]
#[command(name = "voprf-dbgen")]
#[command(about = "Offline curation tool for the evaluated-hash database and its manifest")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a list of known-bad pHashes under the server's key,
    /// producing `[{file, phash}]` (the evaluated-hash database).
    Evaluate {
        /// Path to a JSON file: `[{"file": "...", "phash": "16-hex-char pHash"}]`.
        #[arg(long)]
        input: PathBuf,
        /// Where to write the evaluated database.
        #[arg(long)]
        output: PathBuf,
    },
    /// Sign an evaluated-hash database, producing its manifest.
    Manifest {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        version: String,
    },
    /// Write the server's public key commitment artifact.
    KeyCommitment {
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        version: String,
    },
}

#[derive(Deserialize)]
struct RawEntry {
    file: String,
    phash: String,
}

#[derive(Serialize)]
struct KeyCommitmentArtifact {
    #[serde(rename = "publicKey")]
    public_key: String,
    timestamp: i64,
    version: String,
}

fn oprf_key() -> p256::Scalar {
    let decimal = env::var("SERVER_OPRF_KEY").expect("SERVER_OPRF_KEY must be set to run voprf-dbgen");
    curve::scalar_from_decimal(&decimal).expect("SERVER_OPRF_KEY must be a valid non-zero decimal scalar")
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Evaluate { input, output } => {
            let k = oprf_key();
            let raw = fs::read_to_string(&input).expect("failed to read input pHash list");
            let entries: Vec<RawEntry> = serde_json::from_str(&raw).expect("input is not valid JSON");

            let evaluated: Vec<DbEntry> = entries
                .into_iter()
                .map(|e| DbEntry { file: e.file, phash: oprf::evaluate_unblinded(&e.phash, &k) })
                .collect();

            let json = serde_json::to_vec_pretty(&evaluated).expect("failed to encode database");
            fs::write(&output, json).expect("failed to write evaluated database");
            println!("wrote {} evaluated entries to {}", evaluated.len(), output.display());
        }
        Command::Manifest { db, output, version } => {
            let signing_key = env::var("DB_SIGNING_KEY").expect("DB_SIGNING_KEY must be set to sign a manifest");
            let db_bytes = fs::read(&db).expect("failed to read database file");
            let generated = manifest::generate(&db_bytes, signing_key.as_bytes(), &version);
            let json = serde_json::to_vec_pretty(&generated).expect("failed to encode manifest");
            fs::write(&output, json).expect("failed to write manifest");
            println!("wrote manifest for {} to {}", db.display(), output.display());
        }
        Command::KeyCommitment { output, version } => {
            let k = oprf_key();
            let artifact = KeyCommitmentArtifact {
                public_key: oprf::public_key_commitment(&k),
                timestamp: voprf_common::now_ms() as i64,
                version,
            };
            let json = serde_json::to_vec_pretty(&artifact).expect("failed to encode key commitment");
            fs::write(&output, json).expect("failed to write key commitment");
            println!("wrote key commitment to {}", output.display());
        }
    }
}
