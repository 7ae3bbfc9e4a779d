//! Shared domain types.
//!
//! These types are kept small and plain so they can flow unchanged from the
//! API client, through the ingestion driver, into the SQLite store.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;

use crate::error::{AppError, EXIT_INPUT};

/// One Elexon dataset. Each maps to one endpoint and one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Dataset {
    Temperature,
    Generation,
    Demand,
}

impl Dataset {
    /// Every dataset, in ingestion order.
    pub const ALL: [Dataset; 3] = [Dataset::Temperature, Dataset::Generation, Dataset::Demand];

    /// Lowercase identifier, also used as the table name.
    pub fn id(self) -> &'static str {
        match self {
            Dataset::Temperature => "temperature",
            Dataset::Generation => "generation",
            Dataset::Demand => "demand",
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Inclusive calendar-date range requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, AppError> {
        if from > to {
            return Err(AppError::new(
                EXIT_INPUT,
                format!("--from ({from}) must not be after --to ({to})."),
            ));
        }
        Ok(Self { from, to })
    }

    /// Parse both ends as `YYYY-MM-DD`.
    pub fn parse(from: &str, to: &str) -> Result<Self, AppError> {
        Self::new(parse_date("--from", from)?, parse_date("--to", to)?)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

fn parse_date(flag: &str, raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        AppError::new(
            EXIT_INPUT,
            format!("Invalid {flag} date '{raw}': {e}. Expected YYYY-MM-DD."),
        )
    })
}

/// Dataset-specific measurements carried by a record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValues {
    Temperature {
        /// Daily average temperature (°C).
        temperature: f64,
        reference_average: f64,
        reference_high: Option<f64>,
        reference_low: Option<f64>,
    },
    Generation {
        /// Fuel type, e.g. `CCGT` or `WIND`.
        psr_type: String,
        /// Half-hourly output (MW).
        quantity: f64,
    },
    Demand {
        initial_demand_outturn: Option<f64>,
        initial_transmission_system_demand_outturn: Option<f64>,
    },
}

/// One row of fetched data.
///
/// `timestamp` is the start of the settlement period (or midnight UTC of the
/// measurement date for temperature).
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementRecord {
    pub timestamp: DateTime<Utc>,
    pub settlement_date: Option<NaiveDate>,
    pub settlement_period: Option<u32>,
    pub values: RecordValues,
}

impl SettlementRecord {
    pub fn dataset(&self) -> Dataset {
        match self.values {
            RecordValues::Temperature { .. } => Dataset::Temperature,
            RecordValues::Generation { .. } => Dataset::Generation,
            RecordValues::Demand { .. } => Dataset::Demand,
        }
    }

    /// The calendar date used for range checks. Parsers always fill in the
    /// settlement date; the UTC date is a fallback for hand-built records.
    pub fn effective_date(&self) -> NaiveDate {
        self.settlement_date
            .unwrap_or_else(|| self.timestamp.date_naive())
    }
}

/// Where the SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbTarget {
    Memory,
    File(PathBuf),
}

impl DbTarget {
    pub fn from_arg(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == ":memory:" {
            DbTarget::Memory
        } else {
            DbTarget::File(PathBuf::from(trimmed))
        }
    }
}

impl std::fmt::Display for DbTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbTarget::Memory => f.write_str(":memory:"),
            DbTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A full run's configuration as understood by the driver.
///
/// This is derived from CLI flags (plus defaults) and is already validated.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub range: DateRange,
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Datasets to ingest, in order, without duplicates.
    pub datasets: Vec<Dataset>,
    pub db: DbTarget,
    pub log_file: PathBuf,
    pub sample_rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_range_accepts_single_day() {
        let range = DateRange::parse("2023-01-01", "2023-01-01").unwrap();
        assert_eq!(range.from, range.to);
        assert!(range.contains(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()));
    }

    #[test]
    fn date_range_rejects_reversed_and_malformed() {
        let err = DateRange::parse("2023-01-02", "2023-01-01").unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INPUT);

        let err = DateRange::parse("01/01/2023", "2023-01-01").unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INPUT);
        assert!(err.message().contains("--from"));
    }

    #[test]
    fn dataset_names_match_cli_values() {
        for dataset in Dataset::ALL {
            assert_eq!(Dataset::from_str(dataset.id(), false), Ok(dataset));
        }
        assert_eq!(Dataset::from_str("Demand", true), Ok(Dataset::Demand));
        assert!(Dataset::from_str("prices", true).is_err());
        assert_eq!(Dataset::Generation.to_string(), "generation");
    }

    #[test]
    fn effective_date_prefers_settlement_date() {
        // The API-reported settlement date wins over the UTC date of the slot.
        let record = SettlementRecord {
            timestamp: Utc.with_ymd_and_hms(2022, 12, 31, 23, 30, 0).unwrap(),
            settlement_date: Some(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()),
            settlement_period: Some(1),
            values: RecordValues::Demand {
                initial_demand_outturn: Some(21000.0),
                initial_transmission_system_demand_outturn: None,
            },
        };
        assert_eq!(record.effective_date(), NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(record.dataset(), Dataset::Demand);
    }

    #[test]
    fn db_target_memory_aliases() {
        assert_eq!(DbTarget::from_arg(":memory:"), DbTarget::Memory);
        assert_eq!(DbTarget::from_arg(""), DbTarget::Memory);
        assert_eq!(
            DbTarget::from_arg("out/elexon.db"),
            DbTarget::File(PathBuf::from("out/elexon.db"))
        );
    }
}
