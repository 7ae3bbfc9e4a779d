//! Log setup: `env_logger` writing to a single log file.
//!
//! The default filter is `info`; `RUST_LOG` (also read from `.env`) overrides it.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::{AppError, EXIT_RESOURCE};

pub fn init(log_file: &Path) -> Result<(), AppError> {
    let file = open_log_file(log_file)?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}: {}",
                buf.timestamp_seconds(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
        .map_err(|e| {
            AppError::new(EXIT_RESOURCE, format!("Failed to initialise logging: {e}"))
        })
}

fn open_log_file(path: &Path) -> Result<File, AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::new(
                EXIT_RESOURCE,
                format!("Failed to create log directory '{}': {e}", parent.display()),
            )
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            AppError::new(
                EXIT_RESOURCE,
                format!("Failed to open log file '{}': {e}", path.display()),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_created_with_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("ingest.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }
}
