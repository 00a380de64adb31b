//! SensorBee REST API status source.
//!
//! Creates a private `node_statuses` source on the monitored topology and
//! subscribes to it with a streaming `SELECT`. The server answers with a
//! `multipart/mixed` body that never ends on its own; each part holds one
//! node status tuple as JSON.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bee_iotop::{QuerySource, StatusSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut source = QuerySource::connect("http://localhost:15601", "v1", "demo").await?;
//!     while let Some(value) = source.recv().await? {
//!         println!("{}", value);
//!     }
//!     source.close().await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::multipart::{self, PartSplitter};
use super::{SourceError, StatusSource};

/// Name of the `node_statuses` source created on the topology.
const STATUS_SOURCE_NAME: &str = "bee_iotop_node_status";

/// Interval, in seconds, at which the server emits node statuses.
const STATUS_INTERVAL_SECS: f64 = 1.0;

/// A status source backed by a streaming BQL query.
#[derive(Debug)]
pub struct QuerySource {
    client: Client,
    endpoint: String,
    receiver: mpsc::Receiver<Result<Value, SourceError>>,
    reader: Option<JoinHandle<()>>,
    description: String,
}

impl QuerySource {
    /// Set up the status query on `topology` and start streaming results.
    pub async fn connect(uri: &str, api_version: &str, topology: &str) -> Result<Self, SourceError> {
        let client = Client::new();
        let endpoint = format!(
            "{}/api/{}/topologies/{}/queries",
            uri.trim_end_matches('/'),
            api_version,
            topology
        );

        let create = format!(
            "CREATE SOURCE {} TYPE node_statuses WITH interval = {:.1};",
            STATUS_SOURCE_NAME, STATUS_INTERVAL_SECS
        );
        execute(&client, &endpoint, &create).await?;
        info!(topology, "created node status source");

        let select = format!(
            "SELECT RSTREAM * FROM {} [RANGE 1 TUPLES];",
            STATUS_SOURCE_NAME
        );
        let response = match execute(&client, &endpoint, &select).await {
            Ok(response) => response,
            Err(e) => {
                drop_status_source(&client, &endpoint).await;
                return Err(e);
            }
        };

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let Some(boundary) = multipart::boundary(&content_type) else {
            drop_status_source(&client, &endpoint).await;
            return Err(SourceError::Protocol(format!(
                "expected a multipart/mixed response, got {:?}",
                content_type
            )));
        };

        let (tx, rx) = mpsc::channel(16);
        let reader = tokio::spawn(read_parts(response, boundary, tx));

        Ok(Self {
            client,
            endpoint,
            receiver: rx,
            reader: Some(reader),
            description: format!("{} ({})", uri, topology),
        })
    }
}

#[async_trait]
impl StatusSource for QuerySource {
    async fn recv(&mut self) -> Result<Option<Value>, SourceError> {
        self.receiver.recv().await.transpose()
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        let drop_stmt = format!("DROP SOURCE {};", STATUS_SOURCE_NAME);
        execute(&self.client, &self.endpoint, &drop_stmt).await?;
        info!("dropped node status source");
        Ok(())
    }
}

/// POST one BQL statement and fail on a non-success status.
async fn execute(client: &Client, endpoint: &str, queries: &str) -> Result<Response, SourceError> {
    debug!(endpoint, queries, "executing query");
    let response = client
        .post(endpoint)
        .json(&json!({ "queries": queries }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::Http {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Best-effort cleanup after a failed setup.
async fn drop_status_source(client: &Client, endpoint: &str) {
    let drop_stmt = format!("DROP SOURCE {};", STATUS_SOURCE_NAME);
    if let Err(e) = execute(client, endpoint, &drop_stmt).await {
        warn!(error = %e, "failed to drop node status source");
    }
}

async fn read_parts(
    response: Response,
    boundary: String,
    tx: mpsc::Sender<Result<Value, SourceError>>,
) {
    let mut splitter = PartSplitter::new(&boundary);
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                let _ = tx.send(Err(SourceError::Request(e))).await;
                return;
            }
        };

        splitter.push(&chunk);
        while let Some(part) = splitter.next_part() {
            let item = serde_json::from_slice::<Value>(&part).map_err(SourceError::from);
            let failed = item.is_err();
            if tx.send(item).await.is_err() || failed {
                return;
            }
        }
        if splitter.is_finished() {
            break;
        }
    }
    debug!("status stream ended");
}
