//! Data sources.
//!
//! - `elexon`: endpoint table, HTTP client and the `DatasetSource` seam
//! - `strategies`: per-dataset JSON parsers

pub mod elexon;
pub mod strategies;

pub use elexon::{DatasetSource, ElexonClient, EndpointDescriptor, Fetched};
