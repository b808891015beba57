//! Configuration management for ipldkit
//!
//! Handles CLI argument parsing, config file loading, and defaults.

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::chunker::DEFAULT_CHUNK_SIZE;
use crate::codec::Codec;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Parser, Debug)]
#[command(name = "ipldkit")]
#[command(about = "Content addressing and verification for IPLD blocks", long_about = None)]
#[command(version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Chunk size in bytes for streaming verification
    #[arg(long, global = true)]
    pub chunk_size: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Compute the CID of a file
    Cid {
        file: PathBuf,

        /// Block codec: raw or dag-cbor
        #[arg(long)]
        codec: Option<Codec>,
    },

    /// Stream a file and verify it against a CID
    Verify { cid: String, file: PathBuf },

    /// Validate a hex-encoded binary CID
    Parse { hex: String },

    /// Convert a JSON document to IPLD and address its DAG-CBOR encoding
    Json { file: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chunk_size: usize,
    pub codec: Codec,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            chunk_size: DEFAULT_CHUNK_SIZE,
            codec: Codec::DagCbor,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse CLI arguments, load the config file if given, and apply overrides
    pub fn from_cli() -> Result<(Self, Command), ConfigError> {
        Self::from_parsed(Cli::parse())
    }

    pub fn from_parsed(cli: Cli) -> Result<(Self, Command), ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };

        if let Some(level) = cli.log_level {
            config.log_level = level;
        }
        if let Some(size) = cli.chunk_size {
            config.chunk_size = size;
        }
        if let Command::Cid {
            codec: Some(codec), ..
        } = &cli.command
        {
            config.codec = *codec;
        }

        config.validate()?;
        Ok((config, cli.command))
    }

    /// Load config from TOML file; missing keys take defaults
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
