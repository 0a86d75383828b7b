//! services/api/src/bin/ingest.rs
//!
//! Offline batch ingestion: scan a directory of practice texts, parse their
//! headers, drop anything with 50 words or fewer, and emit the validated
//! set as JSON.
//!
//! Usage: `ingest <input-dir> [output-file]`. Without an output file the
//! JSON goes to stdout.

use std::path::PathBuf;

use api_lib::error::ApiError;
use api_lib::ingest::{scan_text_files, validate_texts};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), ApiError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let input_dir = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| ApiError::Internal("usage: ingest <input-dir> [output-file]".to_string()))?;
    let output = args.next().map(PathBuf::from);

    let scanned = scan_text_files(&input_dir)?;
    info!("Scanned {} text files under {}", scanned.len(), input_dir.display());

    let validated = validate_texts(scanned);
    info!("{} texts passed the minimum word count", validated.len());

    let json = serde_json::to_string_pretty(&validated)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize output: {}", e)))?;

    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            info!("Wrote validated texts to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
