//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - validates them into an `IngestConfig` before any network call
//! - sets up file logging
//! - runs the ingestion driver and reports per-dataset outcomes

use std::time::Duration;

use clap::Parser;
use log::{info, warn};

use crate::cli::Cli;
use crate::domain::{Dataset, DateRange, DbTarget, IngestConfig};
use crate::error::{AppError, EXIT_DATASET, EXIT_INPUT};

pub mod pipeline;

/// Entry point for the `ingest_data` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // Usage errors print clap's message and exit with status 2 here.
    let cli = Cli::parse();
    let config = ingest_config_from_args(&cli)?;

    crate::logging::init(&config.log_file)?;
    info!("Starting ingest_data {}", env!("CARGO_PKG_VERSION"));

    let report = pipeline::run_ingest(&config)?;
    let summary = crate::report::format_run_summary(&report);
    info!("Run summary:\n{summary}");
    println!("{summary}");

    if report.all_succeeded() {
        return Ok(());
    }

    let failed: Vec<_> = report.failed().iter().map(|d| d.id()).collect();
    warn!("Finished with failures: {}", failed.join(", "));
    Err(AppError::new(
        EXIT_DATASET,
        format!(
            "Ingestion incomplete; failed dataset(s): {}. See {} for details.",
            failed.join(", "),
            config.log_file.display()
        ),
    ))
}

/// Validate parsed arguments into the driver's configuration.
pub fn ingest_config_from_args(cli: &Cli) -> Result<IngestConfig, AppError> {
    let range = DateRange::parse(&cli.from_date, &cli.to_date)?;

    let api_key = cli.api_key.trim();
    if api_key.is_empty() {
        return Err(AppError::new(EXIT_INPUT, "--key must not be empty."));
    }
    if cli.timeout_secs == 0 {
        return Err(AppError::new(EXIT_INPUT, "--timeout-secs must be at least 1."));
    }

    Ok(IngestConfig {
        range,
        api_key: api_key.to_string(),
        base_url: cli.base_url.clone(),
        timeout: Duration::from_secs(cli.timeout_secs),
        datasets: resolve_datasets(&cli.datasets),
        db: DbTarget::from_arg(&cli.db),
        log_file: cli.log_file.clone(),
        sample_rows: cli.sample_rows,
    })
}

/// Empty selection means every dataset; otherwise keep first-seen order.
fn resolve_datasets(selected: &[Dataset]) -> Vec<Dataset> {
    if selected.is_empty() {
        return Dataset::ALL.to_vec();
    }
    let mut out = Vec::with_capacity(selected.len());
    for &dataset in selected {
        if !out.contains(&dataset) {
            out.push(dataset);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(from: &str, to: &str, key: &str) -> Cli {
        Cli::try_parse_from(["ingest_data", "--from", from, "--to", to, "--key", key]).unwrap()
    }

    #[test]
    fn valid_args_become_config() {
        let config = ingest_config_from_args(&cli("2023-01-01", "2023-01-31", " abc ")).unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.datasets, Dataset::ALL);
        assert_eq!(config.db, DbTarget::Memory);
        assert_eq!(config.timeout, crate::data::elexon::DEFAULT_TIMEOUT);
    }

    #[test]
    fn invalid_input_is_rejected_with_input_exit_code() {
        for (from, to, key) in [
            ("2023-01-02", "2023-01-01", "abc"),
            ("2023-13-01", "2023-01-01", "abc"),
            ("2023-01-01", "2023-01-01", "  "),
        ] {
            let err = ingest_config_from_args(&cli(from, to, key)).unwrap_err();
            assert_eq!(err.exit_code(), EXIT_INPUT, "{from} {to} {key:?}");
        }
    }

    #[test]
    fn dataset_selection_is_deduplicated_in_order() {
        let picked = resolve_datasets(&[Dataset::Demand, Dataset::Temperature, Dataset::Demand]);
        assert_eq!(picked, [Dataset::Demand, Dataset::Temperature]);
    }
}
