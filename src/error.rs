//! Application error types

use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Network failure, timeout or a non-success response from the price feed
    #[error("Fetch error: {message}")]
    Fetch {
        message: String,
        status_code: Option<u16>,
    },

    /// An expected marker was absent from the feed response
    #[error("Parse error: {0}")]
    Parse(String),

    /// A numeric field could not be read
    #[error("Format error: {0}")]
    Format(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a fetch failure without an HTTP status
    pub fn fetch(message: impl Into<String>) -> Self {
        AppError::Fetch {
            message: message.into(),
            status_code: None,
        }
    }

    /// HTTP status reported by the feed, if the failure carried one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AppError::Fetch { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Failures that come from the feed side of a tick rather than from local storage
    pub fn is_feed_failure(&self) -> bool {
        matches!(
            self,
            AppError::Fetch { .. } | AppError::Parse(_) | AppError::Format(_)
        )
    }

    /// Failures of the persisted log
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, AppError::Storage(_) | AppError::Csv(_))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Fetch {
            message: err.to_string(),
            status_code: err.status().map(|s| s.as_u16()),
        }
    }
}

impl From<tempfile::PersistError> for AppError {
    fn from(err: tempfile::PersistError) -> Self {
        AppError::Storage(err.error)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
