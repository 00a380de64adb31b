//! Stream-based status source.
//!
//! Receives node status values from an async byte stream carrying
//! newline-delimited JSON. Useful for replaying a recorded session from a
//! file or stdin, or for reading a plain TCP feed.

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use super::{SourceError, StatusSource};

/// A status source that reads newline-delimited JSON from an async reader.
///
/// This source spawns a background task that reads the provided reader line
/// by line and hands each value to [`recv`](StatusSource::recv). Blank
/// lines are skipped. A line that is not valid JSON, or a read error, is
/// delivered as an error and ends the stream.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use bee_iotop::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = b"{}\n";
/// let stream = Cursor::new(data.to_vec());
/// let source = StreamSource::spawn(stream, "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<Result<Value, SourceError>>,
    description: String,
}

impl StreamSource {
    /// Spawn a background task that reads from the given async reader.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        let desc = description.to_string();

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = String::new();

            loop {
                line.clear();
                let item = match reader.read_line(&mut line).await {
                    Ok(0) => {
                        debug!(source = %desc, "stream reached EOF");
                        break;
                    }
                    Ok(_) if line.trim().is_empty() => continue,
                    Ok(_) => serde_json::from_str::<Value>(line.trim()).map_err(SourceError::from),
                    Err(e) => Err(SourceError::Io(e)),
                };

                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    // Receiver dropped, or the stream is no longer usable
                    break;
                }
            }
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
        }
    }
}

#[async_trait]
impl StatusSource for StreamSource {
    async fn recv(&mut self) -> Result<Option<Value>, SourceError> {
        self.receiver.recv().await.transpose()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_json() -> &'static str {
        r#"{"node_name":"src","node_type":"source","state":"running","timestamp":"2016-05-12T10:00:00Z"}"#
    }

    #[tokio::test]
    async fn test_stream_source_reads_values_then_ends() {
        let data = format!("{}\n\n{}\n", sample_json(), sample_json());
        let mut source = StreamSource::spawn(Cursor::new(data), "test");

        let first = source.recv().await.unwrap().unwrap();
        assert_eq!(first["node_name"], "src");
        assert!(source.recv().await.unwrap().is_some());
        assert!(source.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stream_source_last_line_without_newline() {
        let mut source = StreamSource::spawn(Cursor::new(sample_json().to_string()), "test");
        assert!(source.recv().await.unwrap().is_some());
        assert!(source.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stream_source_invalid_json() {
        let data = format!("not valid json\n{}\n", sample_json());
        let mut source = StreamSource::spawn(Cursor::new(data), "test");

        assert!(matches!(source.recv().await, Err(SourceError::Parse(_))));
        // The stream stops at the first bad line
        assert!(source.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stream_source_description() {
        let source = StreamSource::spawn(Cursor::new(""), "tcp://localhost:9090");
        assert_eq!(source.description(), "stream: tcp://localhost:9090");
    }
}
