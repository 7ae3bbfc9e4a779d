//! Error types.
//!
//! `AppError` is what the binary reports: a message plus the process exit code.
//! `FetchError` is the per-dataset failure raised by the API client; the
//! ingestion driver logs it and moves on to the next dataset.

/// Bad CLI input: unparseable dates, reversed range, blank API key.
pub const EXIT_INPUT: u8 = 2;
/// The database or the log file could not be opened.
pub const EXIT_RESOURCE: u8 = 3;
/// At least one dataset failed to fetch or store.
pub const EXIT_DATASET: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Why a single dataset could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("request to {url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("unexpected response from {url}: {message}")]
    Malformed { url: String, message: String },
}

impl FetchError {
    /// Short machine-friendly label used in the run summary.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network { .. } => "network",
            FetchError::Status { .. } => "status",
            FetchError::Malformed { .. } => "malformed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_carry_kind_and_context() {
        let err = FetchError::Status {
            url: "https://example.test/demand/outturn".to_string(),
            status: 401,
            body: "Unauthorized".to_string(),
        };
        assert_eq!(err.kind(), "status");
        assert_eq!(
            err.to_string(),
            "request to https://example.test/demand/outturn returned HTTP 401: Unauthorized"
        );

        let err = FetchError::Malformed {
            url: "u".to_string(),
            message: "missing field `data`".to_string(),
        };
        assert_eq!(err.kind(), "malformed");
    }
}
