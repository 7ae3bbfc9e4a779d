//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the dataset identifiers (`Dataset`) and the requested `DateRange`
//! - fetched rows (`SettlementRecord`, `RecordValues`)
//! - the validated run configuration (`IngestConfig`, `DbTarget`)

pub mod types;

pub use types::*;
