//! Input/output helpers.
//!
//! - SQLite persistence of fetched records (`store`)

pub mod store;

pub use store::*;
