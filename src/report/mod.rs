//! Reporting utilities: formatted run summaries and table samples.

pub mod format;

pub use format::*;
