use thiserror::Error;

use crate::domain::InvalidYears;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Data source unavailable: {0}")]
    DataSourceUnavailable(String),

    #[error("Unrecognized scope: {0}")]
    UnrecognizedScope(String),

    #[error("Malformed row from {source_name}: {reason}")]
    MalformedSourceRow { source_name: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid reporting years: {0}")]
    InvalidYears(#[from] InvalidYears),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
