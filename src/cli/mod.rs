//! Command-line parsing for `ingest_data`.
//!
//! Parsing stays here; validation of the parsed values happens when the
//! arguments are turned into an `IngestConfig` (see `app::ingest_config_from_args`).

use std::path::PathBuf;

use clap::Parser;

use crate::data::elexon::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::domain::Dataset;

/// Ingest Elexon temperature, generation and demand data into SQLite.
#[derive(Debug, Parser, Clone)]
#[command(name = "ingest_data", version, about = "Ingest Elexon BMRS data into SQLite")]
pub struct Cli {
    /// Start date (YYYY-MM-DD), inclusive.
    #[arg(long = "from", value_name = "YYYY-MM-DD")]
    pub from_date: String,

    /// End date (YYYY-MM-DD), inclusive.
    #[arg(long = "to", value_name = "YYYY-MM-DD")]
    pub to_date: String,

    /// Elexon API key.
    #[arg(long = "key", value_name = "API_KEY")]
    pub api_key: String,

    /// SQLite database file (`:memory:` keeps everything in memory).
    #[arg(long, value_name = "PATH", default_value = ":memory:")]
    pub db: String,

    /// Restrict the run to these datasets (repeatable). Defaults to all three.
    #[arg(long = "dataset", value_enum)]
    pub datasets: Vec<Dataset>,

    /// Log file receiving progress, errors and data samples.
    #[arg(long, value_name = "PATH", default_value = "elexon_ingest.log")]
    pub log_file: PathBuf,

    /// Rows per table to log after ingestion.
    #[arg(long, default_value_t = 15)]
    pub sample_rows: usize,

    /// HTTP timeout per request, in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// API base URL.
    #[arg(long, env = "ELEXON_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
}
