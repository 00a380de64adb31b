//! Status source abstraction.
//!
//! A [`StatusSource`] yields the raw node status values of a running
//! topology, one at a time, until the stream ends or fails. Decoding the
//! values is left to the [`Aggregator`](crate::snapshot::Aggregator).

mod channel;
mod multipart;
mod query;
mod stream;

pub use channel::ChannelSource;
pub use query::QuerySource;
pub use stream::StreamSource;

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors reported by a status source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request could not be sent or the response body failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response does not follow the expected wire protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A payload was not valid JSON.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Reading the underlying stream failed.
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for receiving node status values from various backends.
///
/// # Example
///
/// ```
/// use bee_iotop::{ChannelSource, StatusSource};
///
/// # tokio_test::block_on(async {
/// let (tx, mut source) = ChannelSource::create("test");
/// tx.send(serde_json::json!({"node_name": "a"})).await.unwrap();
/// drop(tx);
///
/// assert!(source.recv().await.unwrap().is_some());
/// assert!(source.recv().await.unwrap().is_none());
/// # });
/// ```
#[async_trait]
pub trait StatusSource: Send + Debug {
    /// Wait for the next value.
    ///
    /// Returns `Ok(None)` once the stream has ended.
    async fn recv(&mut self) -> Result<Option<Value>, SourceError>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the status bar.
    fn description(&self) -> &str;

    /// Release whatever the source holds on the server side.
    async fn close(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}
