//! Typed node status records.
//!
//! These types match the tuples emitted by a SensorBee `node_statuses`
//! source: one record per node per tick, with the node's pipe counters
//! nested under `output_stats.outputs` and `input_stats.inputs`.
//!
//! Pipe entries are kept as raw JSON and decoded one by one, so a single
//! malformed entry does not invalidate the whole record.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while decoding a status payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A required field is missing or has the wrong type.
    #[error("invalid status payload: {0}")]
    Invalid(#[from] serde_json::Error),

    /// The record carries an empty `node_name`.
    #[error("node status has an empty node_name")]
    EmptyName,
}

/// Kind of a topology node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Source,
    Box,
    Sink,
    /// Any kind this dashboard does not know how to tabulate.
    #[serde(other)]
    Unknown,
}

impl NodeType {
    /// Returns the wire name of this node type.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Source => "source",
            NodeType::Box => "box",
            NodeType::Sink => "sink",
            NodeType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node's telemetry for one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatus {
    pub node_name: String,
    pub node_type: NodeType,
    pub state: String,
    /// Tick identifier shared by every record of the same round.
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub input_stats: InputStats,
    #[serde(default)]
    pub output_stats: OutputStats,
}

impl NodeStatus {
    /// Decode a record from a weakly-typed wire value.
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        let status = Self::deserialize(value)?;
        if status.node_name.is_empty() {
            return Err(DecodeError::EmptyName);
        }
        Ok(status)
    }
}

/// Sender-side counters of a source or box.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputStats {
    pub num_sent_total: i64,
    pub num_dropped: i64,
    /// Downstream node name to an undecoded [`SenderPipeStatus`].
    pub outputs: BTreeMap<String, Value>,
}

impl OutputStats {
    /// Iterate over the output pipes, decoding each entry independently.
    pub fn pipes(&self) -> impl Iterator<Item = (&str, Result<SenderPipeStatus, DecodeError>)> {
        self.outputs
            .iter()
            .map(|(name, raw)| (name.as_str(), SenderPipeStatus::decode(raw)))
    }
}

/// Receiver-side counters of a box or sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputStats {
    pub num_received_total: i64,
    pub num_errors: i64,
    /// Upstream node name to an undecoded [`ReceiverPipeStatus`].
    pub inputs: BTreeMap<String, Value>,
}

impl InputStats {
    /// Iterate over the input pipes, decoding each entry independently.
    pub fn pipes(&self) -> impl Iterator<Item = (&str, Result<ReceiverPipeStatus, DecodeError>)> {
        self.inputs
            .iter()
            .map(|(name, raw)| (name.as_str(), ReceiverPipeStatus::decode(raw)))
    }
}

/// A pipe as seen from the sending node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderPipeStatus {
    pub num_sent: i64,
    pub num_queued: i64,
    pub queue_size: i64,
}

impl SenderPipeStatus {
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        Ok(Self::deserialize(value)?)
    }
}

/// A pipe as seen from the receiving node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverPipeStatus {
    pub num_received: i64,
    pub num_queued: i64,
    pub queue_size: i64,
}

impl ReceiverPipeStatus {
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        Ok(Self::deserialize(value)?)
    }
}
