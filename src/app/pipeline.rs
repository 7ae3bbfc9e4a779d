//! The ingestion driver.
//!
//! Workflow per run: for each dataset, fetch -> store; then build the
//! consolidated view and log a sample of every populated table.
//!
//! Failures are isolated per dataset: a dataset that cannot be fetched or
//! written is logged and reported, and the remaining datasets still run.

use log::{error, info, warn};

use crate::data::{DatasetSource, ElexonClient};
use crate::domain::{Dataset, IngestConfig};
use crate::error::AppError;
use crate::io::store::{CONSOLIDATED_VIEW, Store};
use crate::report;

/// What happened to one dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetStatus {
    Stored { rows: usize, dropped: usize },
    FetchFailed { kind: &'static str, message: String },
    StoreFailed { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetOutcome {
    pub dataset: Dataset,
    pub status: DatasetStatus,
}

impl DatasetOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, DatasetStatus::Stored { .. })
    }
}

/// All outcomes of a single `ingest_data` run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub outcomes: Vec<DatasetOutcome>,
    /// Whether the `elexon` view was (re)built.
    pub consolidated: bool,
}

impl RunReport {
    pub fn failed(&self) -> Vec<Dataset> {
        self.outcomes
            .iter()
            .filter(|o| !o.succeeded())
            .map(|o| o.dataset)
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(DatasetOutcome::succeeded)
    }
}

/// Execute a full run against the live API.
///
/// The database connection lives for this call only and is closed on return.
pub fn run_ingest(config: &IngestConfig) -> Result<RunReport, AppError> {
    let client = ElexonClient::new(&config.api_key, &config.base_url, config.timeout)?;
    info!("Using API base {}", client.base_url());

    let mut store = Store::open(&config.db)?;
    Ok(run_ingest_with_source(&client, &mut store, config))
}

/// Execute the driver with any record source.
///
/// This is what tests use to ingest canned responses into an in-memory store.
pub fn run_ingest_with_source(
    source: &dyn DatasetSource,
    store: &mut Store,
    config: &IngestConfig,
) -> RunReport {
    info!(
        "Ingesting {} for {}..={} into {}",
        dataset_list(&config.datasets),
        config.range.from,
        config.range.to,
        store.target()
    );

    let mut outcomes = Vec::with_capacity(config.datasets.len());
    for &dataset in &config.datasets {
        let status = ingest_one(source, store, config, dataset);
        outcomes.push(DatasetOutcome { dataset, status });
    }

    let consolidated = match store.create_consolidated_view() {
        Ok(built) => built,
        Err(err) => {
            warn!("{err}");
            false
        }
    };

    log_samples(store, &outcomes, consolidated, config.sample_rows);

    RunReport {
        outcomes,
        consolidated,
    }
}

fn ingest_one(
    source: &dyn DatasetSource,
    store: &mut Store,
    config: &IngestConfig,
    dataset: Dataset,
) -> DatasetStatus {
    let fetched = match source.fetch(dataset, &config.range) {
        Ok(fetched) => fetched,
        Err(err) => {
            error!("{dataset}: fetch failed ({}): {err}", err.kind());
            return DatasetStatus::FetchFailed {
                kind: err.kind(),
                message: err.to_string(),
            };
        }
    };

    match store.insert(dataset, &fetched.records) {
        Ok(rows) => {
            info!("{dataset}: stored {rows} row(s) in table {}", dataset.endpoint().table);
            DatasetStatus::Stored {
                rows,
                dropped: fetched.dropped,
            }
        }
        Err(err) => {
            error!("{dataset}: {err}");
            DatasetStatus::StoreFailed {
                message: err.message().to_string(),
            }
        }
    }
}

fn log_samples(store: &Store, outcomes: &[DatasetOutcome], consolidated: bool, limit: usize) {
    if limit == 0 {
        return;
    }

    let mut tables: Vec<&str> = outcomes
        .iter()
        .filter(|o| o.succeeded())
        .map(|o| o.dataset.endpoint().table)
        .collect();
    if consolidated {
        tables.push(CONSOLIDATED_VIEW);
    }

    for table in tables {
        match store.sample(table, limit) {
            Ok(rows) => info!("Sample of {table}:\n{}", report::format_sample(&rows)),
            Err(err) => warn!("{err}"),
        }
    }
}

fn dataset_list(datasets: &[Dataset]) -> String {
    datasets
        .iter()
        .map(|d| d.id())
        .collect::<Vec<_>>()
        .join(", ")
}
