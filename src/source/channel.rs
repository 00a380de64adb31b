//! Channel-based status source.
//!
//! Receives node status values through a tokio mpsc channel. This is
//! useful for embedding the monitor in a process that already holds the
//! values, and for tests.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{SourceError, StatusSource};

/// Capacity of the channel created by [`ChannelSource::create`].
const CHANNEL_CAPACITY: usize = 64;

/// A status source fed through a channel.
///
/// The stream ends once every sender has been dropped.
///
/// # Example
///
/// ```
/// use bee_iotop::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("in-process");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<Value>,
    description: String,
}

impl ChannelSource {
    /// Create a new channel source from an existing receiver.
    pub fn new(receiver: mpsc::Receiver<Value>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
        }
    }

    /// Create a channel pair for sending values to a ChannelSource.
    pub fn create(source_description: &str) -> (mpsc::Sender<Value>, Self) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        (tx, Self::new(rx, source_description))
    }
}

#[async_trait]
impl StatusSource for ChannelSource {
    async fn recv(&mut self) -> Result<Option<Value>, SourceError> {
        Ok(self.receiver.recv().await)
    }

    fn description(&self) -> &str {
        &self.description
    }
}
