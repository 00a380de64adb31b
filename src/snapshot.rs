//! Per-tick topology snapshot aggregation.
//!
//! Node status records arrive one at a time and in no particular grouping.
//! The [`Aggregator`] folds them into a [`Snapshot`]: one line per node,
//! split by node type, plus one [`EdgeLine`] per directed pipe. An edge is
//! reported from both of its ends (the sender's `outputs` and the
//! receiver's `inputs`), so each line is assembled from two halves.
//!
//! ## Windowing
//!
//! All records of one tick share a timestamp. When a record with a new
//! timestamp arrives the snapshot is cleared and rebuilt starting from that
//! record. Records of a tick are assumed to arrive contiguously, so a read
//! taken mid-tick may see fewer nodes than the topology has. That partial
//! view is accepted: buffering whole ticks would delay the display.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::status::{
    DecodeError, InputStats, NodeStatus, NodeType, OutputStats, ReceiverPipeStatus,
    SenderPipeStatus,
};

/// Fields shared by every node line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralLine {
    pub name: String,
    pub node_type: NodeType,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub general: GeneralLine,
    pub sent: i64,
    pub dropped: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxLine {
    pub general: GeneralLine,
    /// Items sent minus items received.
    pub net_throughput: i64,
    pub dropped: i64,
    pub errors: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkLine {
    pub general: GeneralLine,
    pub received: i64,
    pub errors: i64,
}

/// Identifies one directed pipe.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    pub sender: String,
    pub receiver: String,
}

impl EdgeKey {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
        }
    }
}

/// Both halves of a pipe's counters.
///
/// Fields of a side that has not reported yet in this tick stay at their
/// defaults (empty name, no node type, zero counters).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeLine {
    pub sender_name: String,
    pub sender_node_type: Option<NodeType>,
    pub receiver_name: String,
    pub receiver_node_type: Option<NodeType>,
    pub sender_queue_size: i64,
    pub sender_queued: i64,
    pub sent: i64,
    pub receiver_queue_size: i64,
    pub receiver_queued: i64,
    pub received: i64,
    /// Last observed `received - sent`, computed by whichever side updated
    /// the edge most recently against the other side's held value.
    pub backlog: i64,
}

/// Everything known about the current tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Timestamp of the most recently ingested record.
    pub tick: Option<DateTime<Utc>>,
    pub sources: Vec<SourceLine>,
    pub boxes: Vec<BoxLine>,
    pub sinks: Vec<SinkLine>,
    pub edges: BTreeMap<EdgeKey, EdgeLine>,
}

impl Snapshot {
    /// Number of node lines across the three node tables.
    pub fn node_count(&self) -> usize {
        self.sources.len() + self.boxes.len() + self.sinks.len()
    }

    /// Drop every line and edge.
    pub fn clear(&mut self) {
        self.sources.clear();
        self.boxes.clear();
        self.sinks.clear();
        self.edges.clear();
    }

    /// Fold one decoded record into the snapshot.
    pub fn apply(&mut self, status: NodeStatus) {
        if self.tick != Some(status.timestamp) {
            if self.tick.is_some() {
                debug!(tick = %status.timestamp, "new tick, clearing snapshot");
            }
            self.clear();
            self.tick = Some(status.timestamp);
        }

        let general = GeneralLine {
            name: status.node_name,
            node_type: status.node_type,
            state: status.state,
        };

        match general.node_type {
            NodeType::Source => {
                self.update_sender_side(&general.name, general.node_type, &status.output_stats);
                self.sources.push(SourceLine {
                    sent: status.output_stats.num_sent_total,
                    dropped: status.output_stats.num_dropped,
                    general,
                });
            }
            NodeType::Box => {
                self.update_sender_side(&general.name, general.node_type, &status.output_stats);
                self.update_receiver_side(&general.name, general.node_type, &status.input_stats);
                self.boxes.push(BoxLine {
                    net_throughput: status
                        .output_stats
                        .num_sent_total
                        .wrapping_sub(status.input_stats.num_received_total),
                    dropped: status.output_stats.num_dropped,
                    errors: status.input_stats.num_errors,
                    general,
                });
            }
            NodeType::Sink => {
                self.update_receiver_side(&general.name, general.node_type, &status.input_stats);
                self.sinks.push(SinkLine {
                    received: status.input_stats.num_received_total,
                    errors: status.input_stats.num_errors,
                    general,
                });
            }
            NodeType::Unknown => {}
        }
    }

    /// Record the sender's half of every pipe in `outputs`.
    ///
    /// Entries that fail to decode are skipped.
    pub fn update_sender_side(&mut self, name: &str, node_type: NodeType, outputs: &OutputStats) {
        for (receiver, pipe) in outputs.pipes() {
            match pipe {
                Ok(pipe) => self.set_sender_pipe(name, node_type, receiver, pipe),
                Err(e) => debug!(sender = name, receiver, error = %e, "skipping output pipe"),
            }
        }
    }

    /// Record the receiver's half of every pipe in `inputs`.
    ///
    /// Entries that fail to decode are skipped.
    pub fn update_receiver_side(&mut self, name: &str, node_type: NodeType, inputs: &InputStats) {
        for (sender, pipe) in inputs.pipes() {
            match pipe {
                Ok(pipe) => self.set_receiver_pipe(name, node_type, sender, pipe),
                Err(e) => debug!(sender, receiver = name, error = %e, "skipping input pipe"),
            }
        }
    }

    /// Apply one sender-side pipe status to the edge `(name, receiver)`.
    pub fn set_sender_pipe(
        &mut self,
        name: &str,
        node_type: NodeType,
        receiver: &str,
        pipe: SenderPipeStatus,
    ) {
        let key = EdgeKey::new(name, receiver);
        let line = match self.edges.entry(key) {
            Entry::Occupied(entry) => {
                let line = entry.into_mut();
                line.backlog = line.received.wrapping_sub(pipe.num_sent);
                line
            }
            Entry::Vacant(entry) => entry.insert(EdgeLine::default()),
        };
        line.sender_name = name.to_string();
        line.sender_node_type = Some(node_type);
        line.sender_queued = pipe.num_queued;
        line.sender_queue_size = pipe.queue_size;
        line.sent = pipe.num_sent;
    }

    /// Apply one receiver-side pipe status to the edge `(sender, name)`.
    pub fn set_receiver_pipe(
        &mut self,
        name: &str,
        node_type: NodeType,
        sender: &str,
        pipe: ReceiverPipeStatus,
    ) {
        let key = EdgeKey::new(sender, name);
        let line = match self.edges.entry(key) {
            Entry::Occupied(entry) => {
                let line = entry.into_mut();
                line.backlog = pipe.num_received.wrapping_sub(line.sent);
                line
            }
            Entry::Vacant(entry) => entry.insert(EdgeLine::default()),
        };
        line.receiver_name = name.to_string();
        line.receiver_node_type = Some(node_type);
        line.receiver_queued = pipe.num_queued;
        line.receiver_queue_size = pipe.queue_size;
        line.received = pipe.num_received;
    }
}

/// Thread-safe owner of the live [`Snapshot`].
///
/// One activity ingests while others read. Both go through the same lock,
/// so a reader never sees a half-cleared snapshot.
#[derive(Debug, Default)]
pub struct Aggregator {
    snapshot: RwLock<Snapshot>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a wire record and fold it into the snapshot.
    ///
    /// A record that fails to decode leaves the snapshot untouched.
    pub fn ingest(&self, value: &Value) -> Result<(), DecodeError> {
        let status = NodeStatus::decode(value)?;
        self.ingest_status(status);
        Ok(())
    }

    /// Fold an already decoded record into the snapshot.
    pub fn ingest_status(&self, status: NodeStatus) {
        self.snapshot.write().apply(status);
    }

    /// Copy out the current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.read().clone()
    }

    /// Timestamp of the current tick, if any record was ingested.
    pub fn tick(&self) -> Option<DateTime<Utc>> {
        self.snapshot.read().tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const T1: &str = "2016-05-12T10:00:00Z";
    const T2: &str = "2016-05-12T10:00:01Z";

    fn source(name: &str, ts: &str, outputs: Value) -> Value {
        json!({
            "node_name": name,
            "node_type": "source",
            "state": "running",
            "timestamp": ts,
            "output_stats": { "num_sent_total": 10, "num_dropped": 1, "outputs": outputs }
        })
    }

    fn sink(name: &str, ts: &str, inputs: Value) -> Value {
        json!({
            "node_name": name,
            "node_type": "sink",
            "state": "running",
            "timestamp": ts,
            "input_stats": { "num_received_total": 9, "num_errors": 0, "inputs": inputs }
        })
    }

    fn names(snapshot: &Snapshot) -> Vec<&str> {
        snapshot
            .sources
            .iter()
            .map(|l| l.general.name.as_str())
            .chain(snapshot.boxes.iter().map(|l| l.general.name.as_str()))
            .chain(snapshot.sinks.iter().map(|l| l.general.name.as_str()))
            .collect()
    }

    #[test]
    fn test_new_tick_discards_previous_lines() {
        let agg = Aggregator::new();
        agg.ingest(&source("A", T1, json!({}))).unwrap();
        agg.ingest(&sink("B", T1, json!({}))).unwrap();
        assert_eq!(agg.snapshot().node_count(), 2);

        agg.ingest(&source("C", T2, json!({}))).unwrap();
        let snapshot = agg.snapshot();
        assert_eq!(names(&snapshot), vec!["C"]);
        assert_eq!(snapshot.tick, Some(T2.parse().unwrap()));
    }

    #[test]
    fn test_new_tick_discards_edges() {
        let agg = Aggregator::new();
        agg.ingest(&source(
            "A",
            T1,
            json!({ "B": { "num_sent": 1, "num_queued": 0, "queue_size": 8 } }),
        ))
        .unwrap();
        assert_eq!(agg.snapshot().edges.len(), 1);

        agg.ingest(&sink("B", T2, json!({}))).unwrap();
        assert!(agg.snapshot().edges.is_empty());
    }

    #[test]
    fn test_both_halves_resolve_to_one_edge() {
        let agg = Aggregator::new();
        agg.ingest(&source(
            "S",
            T1,
            json!({ "B": { "num_sent": 10, "num_queued": 1, "queue_size": 100 } }),
        ))
        .unwrap();
        agg.ingest(&json!({
            "node_name": "B",
            "node_type": "box",
            "state": "running",
            "timestamp": T1,
            "input_stats": {
                "num_received_total": 10,
                "num_errors": 0,
                "inputs": { "S": { "num_received": 10, "num_queued": 1, "queue_size": 100 } }
            },
            "output_stats": { "num_sent_total": 8, "num_dropped": 0 }
        }))
        .unwrap();

        let snapshot = agg.snapshot();
        assert_eq!(snapshot.edges.len(), 1);
        let edge = &snapshot.edges[&EdgeKey::new("S", "B")];
        assert_eq!(edge.sender_name, "S");
        assert_eq!(edge.sender_node_type, Some(NodeType::Source));
        assert_eq!(edge.receiver_name, "B");
        assert_eq!(edge.receiver_node_type, Some(NodeType::Box));
        assert_eq!(edge.sent, 10);
        assert_eq!(edge.received, 10);
        assert_eq!(edge.sender_queue_size, 100);
        assert_eq!(edge.receiver_queued, 1);
        assert_eq!(edge.backlog, 0);

        assert_eq!(snapshot.boxes.len(), 1);
        assert_eq!(snapshot.boxes[0].net_throughput, -2);
    }

    #[test]
    fn test_backlog_from_sender_update() {
        let mut snapshot = Snapshot::default();
        let receiver_pipe = ReceiverPipeStatus {
            num_received: 7,
            num_queued: 0,
            queue_size: 100,
        };
        snapshot.set_receiver_pipe("B", NodeType::Box, "S", receiver_pipe);
        assert_eq!(snapshot.edges[&EdgeKey::new("S", "B")].backlog, 0);

        let sender_pipe = SenderPipeStatus {
            num_sent: 10,
            num_queued: 3,
            queue_size: 100,
        };
        snapshot.set_sender_pipe("S", NodeType::Source, "B", sender_pipe);
        let edge = &snapshot.edges[&EdgeKey::new("S", "B")];
        assert_eq!(edge.backlog, -3);
        assert_eq!(edge.sent, 10);
        assert_eq!(edge.received, 7);
    }

    #[test]
    fn test_backlog_from_receiver_update() {
        let mut snapshot = Snapshot::default();
        let sender_pipe = SenderPipeStatus {
            num_sent: 10,
            num_queued: 0,
            queue_size: 100,
        };
        snapshot.set_sender_pipe("S", NodeType::Source, "B", sender_pipe);

        let receiver_pipe = ReceiverPipeStatus {
            num_received: 12,
            num_queued: 0,
            queue_size: 100,
        };
        snapshot.set_receiver_pipe("B", NodeType::Box, "S", receiver_pipe);
        assert_eq!(snapshot.edges[&EdgeKey::new("S", "B")].backlog, 2);
    }

    #[test]
    fn test_backlog_keeps_only_latest_computation() {
        let mut snapshot = Snapshot::default();
        let recv = |n| ReceiverPipeStatus {
            num_received: n,
            num_queued: 0,
            queue_size: 100,
        };
        let send = |n| SenderPipeStatus {
            num_sent: n,
            num_queued: 0,
            queue_size: 100,
        };

        snapshot.set_receiver_pipe("B", NodeType::Sink, "S", recv(7));
        snapshot.set_sender_pipe("S", NodeType::Source, "B", send(10));
        assert_eq!(snapshot.edges[&EdgeKey::new("S", "B")].backlog, -3);

        snapshot.set_receiver_pipe("B", NodeType::Sink, "S", recv(12));
        assert_eq!(snapshot.edges[&EdgeKey::new("S", "B")].backlog, 2);
    }

    #[test]
    fn test_extreme_counters_wrap() {
        let agg = Aggregator::new();
        agg.ingest(&json!({
            "node_name": "B",
            "node_type": "box",
            "state": "running",
            "timestamp": T1,
            "input_stats": {
                "num_received_total": 1,
                "inputs": { "S": { "num_received": i64::MIN, "num_queued": 0, "queue_size": 8 } }
            },
            "output_stats": { "num_sent_total": i64::MIN }
        }))
        .unwrap();
        agg.ingest(&source(
            "S",
            T1,
            json!({ "B": { "num_sent": 1, "num_queued": 0, "queue_size": 8 } }),
        ))
        .unwrap();

        let snapshot = agg.snapshot();
        assert_eq!(snapshot.boxes[0].net_throughput, i64::MAX);
        assert_eq!(snapshot.edges[&EdgeKey::new("S", "B")].backlog, i64::MAX);

        let mut snapshot = Snapshot::default();
        let send = SenderPipeStatus {
            num_sent: 1,
            num_queued: 0,
            queue_size: 8,
        };
        let recv = ReceiverPipeStatus {
            num_received: i64::MIN,
            num_queued: 0,
            queue_size: 8,
        };
        snapshot.set_sender_pipe("S", NodeType::Source, "B", send);
        snapshot.set_receiver_pipe("B", NodeType::Box, "S", recv);
        assert_eq!(snapshot.edges[&EdgeKey::new("S", "B")].backlog, i64::MAX);
    }

    #[test]
    fn test_unknown_node_type_produces_no_line() {
        let agg = Aggregator::new();
        agg.ingest(&json!({
            "node_name": "f",
            "node_type": "filter",
            "state": "running",
            "timestamp": T1,
            "output_stats": {
                "outputs": { "x": { "num_sent": 1, "num_queued": 0, "queue_size": 8 } }
            }
        }))
        .unwrap();

        let snapshot = agg.snapshot();
        assert_eq!(snapshot.node_count(), 0);
        assert!(snapshot.edges.is_empty());
        assert_eq!(snapshot.tick, Some(T1.parse().unwrap()));
    }

    #[test]
    fn test_malformed_pipe_entry_is_skipped() {
        let agg = Aggregator::new();
        agg.ingest(&source(
            "S",
            T1,
            json!({
                "A": { "num_sent": 4, "num_queued": 0, "queue_size": 8 },
                "B": { "num_sent": "four" }
            }),
        ))
        .unwrap();

        let snapshot = agg.snapshot();
        assert_eq!(snapshot.sources.len(), 1);
        assert_eq!(snapshot.edges.len(), 1);
        assert_eq!(snapshot.edges[&EdgeKey::new("S", "A")].sent, 4);
    }

    #[test]
    fn test_decode_failure_leaves_snapshot_untouched() {
        let agg = Aggregator::new();
        agg.ingest(&source("A", T1, json!({}))).unwrap();

        let err = agg.ingest(&json!({ "node_name": "B", "timestamp": T2 }));
        assert!(err.is_err());

        let snapshot = agg.snapshot();
        assert_eq!(names(&snapshot), vec!["A"]);
        assert_eq!(snapshot.tick, Some(T1.parse().unwrap()));
    }

    #[test]
    fn test_lines_keep_ingestion_order() {
        let agg = Aggregator::new();
        for name in ["z", "a", "m"] {
            agg.ingest(&sink(name, T1, json!({}))).unwrap();
        }
        assert_eq!(names(&agg.snapshot()), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let agg = Aggregator::new();
        agg.ingest(&source("A", T1, json!({}))).unwrap();
        let before = agg.snapshot();

        agg.ingest(&source("B", T2, json!({}))).unwrap();
        assert_eq!(names(&before), vec!["A"]);
        assert_eq!(names(&agg.snapshot()), vec!["B"]);
    }
}
