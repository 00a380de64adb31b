//! # bee-iotop
//!
//! A live terminal dashboard for the node and pipe I/O of a running
//! SensorBee topology, in the spirit of `iotop`.
//!
//! The topology reports one status record per node per tick. This crate
//! folds those records into a per-tick snapshot and renders it as four
//! aligned tables: edges (pipes between nodes), sources, boxes and sinks.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          monitor                            │
//! │  ┌──────────┐    ┌────────────┐    ┌─────────┐   ┌────────┐ │
//! │  │  source  │───▶│  snapshot  │───▶│ render  │──▶│   ui   │ │
//! │  │ (values) │    │(aggregator)│    │(tables) │   │        │ │
//! │  └──────────┘    └────────────┘    └─────────┘   └────────┘ │
//! │       ▲                                              ▲      │
//! │       │                                              │      │
//! │  QuerySource | StreamSource | ChannelSource    events (keys) │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`status`]**: Typed node status records and their decoding
//! - **[`snapshot`]**: The [`Aggregator`] and the per-tick [`Snapshot`] it maintains
//! - **[`render`]**: Column-aligned text tables
//! - **[`source`]**: The [`StatusSource`] trait with implementations for the
//!   SensorBee REST API, newline-delimited JSON streams and channels
//! - **[`monitor`]**: Ingestion, periodic rendering and key handling
//! - **[`ui`]**: Terminal drawing using ratatui
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a topology on a local server
//! bee-iotop monitor --topology demo
//!
//! # Replay recorded statuses, refreshing every 2 seconds
//! bee-iotop replay statuses.jsonl --d 2
//! ```
//!
//! ### As a library
//!
//! ```
//! use bee_iotop::{render, Aggregator};
//! use serde_json::json;
//!
//! let aggregator = Aggregator::new();
//! aggregator
//!     .ingest(&json!({
//!         "node_name": "tweets",
//!         "node_type": "source",
//!         "state": "running",
//!         "timestamp": "2016-05-12T10:00:00Z",
//!         "output_stats": { "num_sent_total": 10, "num_dropped": 0 }
//!     }))
//!     .unwrap();
//!
//! let text = render::render(&aggregator.snapshot());
//! assert!(text.contains("tweets source running 10  0"));
//! ```

pub mod duration;
pub mod error;
pub mod events;
pub mod monitor;
pub mod render;
pub mod settings;
pub mod snapshot;
pub mod source;
pub mod status;
pub mod ui;

// Re-export main types for convenience
pub use settings::Settings;
pub use error::MonitorError;
pub use monitor::Monitor;
pub use snapshot::{Aggregator, EdgeKey, EdgeLine, Snapshot};
pub use source::{ChannelSource, QuerySource, SourceError, StatusSource, StreamSource};
pub use status::{DecodeError, NodeStatus, NodeType};
pub use ui::{Dashboard, Theme};
