//! Error types for the monitor.

use thiserror::Error;

use crate::source::SourceError;
use crate::status::DecodeError;

/// Errors that end a monitoring session.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A node status record could not be decoded.
    #[error("failed to decode node status: {0}")]
    Decode(#[from] DecodeError),

    /// The status source reported an error.
    #[error("status source failed: {0}")]
    Source(#[from] SourceError),

    /// The status stream ended.
    #[error("status stream closed")]
    StreamClosed,

    /// Terminal I/O failed.
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    /// The refresh interval is out of range or not a number.
    #[error("invalid interval: {0}")]
    InvalidInterval(String),
}
