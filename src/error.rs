use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Request for {series} season {season} failed: {message}")]
    Network {
        series: String,
        season: u32,
        message: String,
    },

    #[error("Malformed response for {series} season {season}: {message}")]
    MalformedResponse {
        series: String,
        season: u32,
        message: String,
    },

    #[error("Supplemental file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Column '{column}' missing from {table}")]
    SchemaMismatch { column: String, table: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Delimited file error: {0}")]
    Csv(#[from] csv::Error),
}

impl PipelineError {
    pub fn schema(column: &str, table: &str) -> Self {
        PipelineError::SchemaMismatch {
            column: column.to_string(),
            table: table.to_string(),
        }
    }

    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Network { .. })
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
