//! Error types for evlogs

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or contradictory from/to/by/wait values
    #[error("{0}")]
    Range(#[from] RangeError),

    /// Unresolvable date, event, or network identifier
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// RPC query failed mid-scan
    #[error("{0}")]
    Query(#[from] QueryError),

    /// Malformed or missing network configuration
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Duplicate event id or alias in the registry
    #[error("{0}")]
    Conflict(#[from] ConflictError),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Block-range validation errors; the scan never starts
#[derive(Error, Debug, PartialEq)]
pub enum RangeError {
    #[error("Invalid block number or date/time: {0}")]
    InvalidBound(String),

    #[error("Cannot search to offset {offset} when current block is {tip}")]
    OffsetBeyondTip { offset: i64, tip: u64 },

    #[error("Cannot search from offset {offset} when end of range is {end}")]
    OffsetBeyondEnd { offset: i64, end: u64 },

    #[error("Cannot search from {from} to {to}")]
    EmptyRange { from: i64, to: i64 },

    #[error("Cannot search by queries of non-positive size {0}")]
    NonPositiveChunk(i64),

    #[error("Cannot wait for non-positive seconds {0} between queries")]
    NonPositiveWait(f64),

    #[error("Cannot wait for {0} seconds between queries")]
    InvalidWait(f64),
}

/// Lookup failures; the scan never starts
#[derive(Error, Debug, PartialEq)]
pub enum NotFoundError {
    #[error("Could not find block for date/time: {0}")]
    BlockForDate(String),

    #[error("Unknown event type: {0}")]
    Event(String),

    #[error("Unknown network: {0}")]
    Network(String),
}

/// An RPC call failed; the remaining chunk loop is abandoned but output
/// already flushed is preserved.
///
/// `body` carries the provider's structured error payload when one was
/// returned, for [`crate::classify::classify`] to extract a message from.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,
    pub body: Option<String>,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            body: None,
        }
    }

    pub fn with_body(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            body: Some(body.into()),
        }
    }
}

/// Configuration and argument errors
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid network file: {0}")]
    InvalidFile(String),

    #[error("Network file parse error: {0}")]
    ParseError(String),

    #[error("Network {network} is missing {field}")]
    MissingField { network: String, field: String },

    #[error("Network {network} is missing {contract} contract")]
    MissingContract { network: String, contract: String },

    #[error("Invalid address format: {0}")]
    InvalidAddress(String),

    #[error("Invalid 32-byte hex value: {0}")]
    InvalidTopicValue(String),

    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Output file name must end with .json or .csv: {0}")]
    UnsupportedOutput(String),

    #[error("CSV file has no {0} column")]
    MissingColumn(String),
}

/// Registry registration conflicts
#[derive(Error, Debug, PartialEq)]
pub enum ConflictError {
    #[error("Event id or alias already registered: {0}")]
    DuplicateEvent(String),
}

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
