use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("Date parsing error: {0}")]
    DateError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failure reported by a data source implementation.
    #[error("Data source error: {0}")]
    Source(String),

    #[error("Remote request rejected (status {status}): {body}")]
    Remote { status: u16, body: String },

    #[cfg(feature = "netsuite")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
