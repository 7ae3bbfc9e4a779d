//! `elexon-ingest` library crate.
//!
//! The binary (`ingest_data`) is a thin wrapper around this library so that
//! the fetch, parse and store steps are testable without spawning processes
//! or touching the network.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod report;
