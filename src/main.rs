//! ipldkit - content addressing for IPLD blocks
//!
//! Computes, validates and verifies CIDs from the command line.

use futures::StreamExt;
use ipldkit_core::{
    cid_from_text, dag_cbor, ipld_to_json, json_to_ipld, parse_cid, BlockProducer, Chunker,
    CidVerifier, Codec, Command, Config, HashRegistry, Sha256,
};
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    // Parse CLI arguments and build config
    let (config, command) = Config::from_cli()?;

    init_logging(&config.log_level);

    match command {
        Command::Cid { file, .. } => compute_cid(&config, &file).await,
        Command::Verify { cid, file } => verify_file(&config, &cid, &file).await,
        Command::Parse { hex } => parse_hex(&hex),
        Command::Json { file } => convert_json(&file).await,
    }
}

async fn compute_cid(config: &Config, file: &Path) -> Result<(), Box<dyn Error>> {
    let data = tokio::fs::read(file).await?;
    let block = BlockProducer::for_codec(config.codec).make_block(&data)?;

    println!("{}", block.cid);
    println!("{}", hex::encode(block.cid.to_bytes()));
    Ok(())
}

/// Verified chunks go to stdout as they arrive
async fn verify_file(config: &Config, cid: &str, file: &Path) -> Result<(), Box<dyn Error>> {
    let expected = cid_from_text(cid)?;
    let reader = tokio::fs::File::open(file).await?;
    let chunks = Chunker::with_chunk_size(reader, config.chunk_size).into_stream();

    let verifier = CidVerifier::new(Arc::new(HashRegistry::default()));
    let mut verified = verifier.verify_stream(chunks, expected)?;

    let mut stdout = tokio::io::stdout();
    while let Some(chunk) = verified.next().await {
        stdout.write_all(&chunk?).await?;
    }
    stdout.flush().await?;

    tracing::info!(
        "Verified {} bytes against {}",
        verified.bytes_processed(),
        expected
    );
    Ok(())
}

fn parse_hex(text: &str) -> Result<(), Box<dyn Error>> {
    let bytes = hex::decode(text.trim())?;
    let cid = parse_cid(&bytes)?;

    let codec = Codec::from_code(cid.codec()).map(|c| c.name()).unwrap_or("unknown");
    println!("cid: {}", cid);
    println!("version: 1");
    println!("codec: {} (0x{:02x})", codec, cid.codec());
    println!("hash: sha2-256 (0x{:02x})", cid.hash().code());
    println!("digest: {}", hex::encode(cid.hash().digest()));
    Ok(())
}

async fn convert_json(file: &Path) -> Result<(), Box<dyn Error>> {
    let text = tokio::fs::read_to_string(file).await?;
    let json: serde_json::Value = serde_json::from_str(&text)?;

    let ipld = json_to_ipld(&json);
    let block = dag_cbor::to_block(&ipld, &Sha256)?;

    println!("{}", block.cid);
    println!("{}", serde_json::to_string_pretty(&ipld_to_json(&ipld))?);
    Ok(())
}

fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
