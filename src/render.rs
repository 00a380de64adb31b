//! Text rendering of a snapshot.
//!
//! The dashboard is four tables in a fixed order: edges, sources, boxes and
//! sinks. Each table is column aligned on its own (elastic tab stops with a
//! padding of one space) and tables are separated by a blank line.

use crate::snapshot::{EdgeLine, Snapshot};
use crate::status::NodeType;

pub const EDGE_HEADER: &[&str] = &[
    "SENDER", "STYPE", "RCVER", "RTYPE", "SQSIZE", "SQNUM", "SNUM", "RQSIZE", "RQNUM", "RNUM",
    "INOUT",
];
pub const SOURCE_HEADER: &[&str] = &["NAME", "NTYPE", "STATE", "OUT", "DROP"];
pub const BOX_HEADER: &[&str] = &["NAME", "NTYPE", "STATE", "INOUT", "DROP", "ERR"];
pub const SINK_HEADER: &[&str] = &["NAME", "NTYPE", "STATE", "IN", "ERR"];

/// Padding between columns.
const PADDING: usize = 1;

/// One table of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn new(header: &'static [&'static str]) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    /// Aligned lines of this table, header first.
    ///
    /// Every cell but the last of a row is padded to the widest cell of its
    /// column plus [`PADDING`]; the last cell is written as is.
    pub fn lines(&self) -> Vec<String> {
        let header: Vec<String> = self.header.iter().map(|h| h.to_string()).collect();
        let all_rows: Vec<&Vec<String>> = std::iter::once(&header).chain(&self.rows).collect();

        let columns = all_rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut widths = vec![0; columns];
        for row in &all_rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        all_rows
            .iter()
            .map(|row| {
                let mut line = String::new();
                for (i, cell) in row.iter().enumerate() {
                    line.push_str(cell);
                    if i + 1 < row.len() {
                        let pad = widths[i] - cell.chars().count() + PADDING;
                        line.extend(std::iter::repeat(' ').take(pad));
                    }
                }
                line
            })
            .collect()
    }
}

fn node_type_cell(node_type: Option<NodeType>) -> String {
    node_type.map_or_else(|| "-".to_string(), |t| t.to_string())
}

fn edge_row(sender: &str, receiver: &str, l: &EdgeLine) -> Vec<String> {
    vec![
        sender.to_string(),
        node_type_cell(l.sender_node_type),
        receiver.to_string(),
        node_type_cell(l.receiver_node_type),
        l.sender_queue_size.to_string(),
        l.sender_queued.to_string(),
        l.sent.to_string(),
        l.receiver_queue_size.to_string(),
        l.receiver_queued.to_string(),
        l.received.to_string(),
        l.backlog.to_string(),
    ]
}

/// Build the four dashboard tables: edges, sources, boxes, sinks.
///
/// Node rows keep ingestion order. Edge rows follow the edge key order,
/// which callers should not rely on.
pub fn tables(snapshot: &Snapshot) -> [Table; 4] {
    let mut edges = Table::new(EDGE_HEADER);
    for (key, line) in &snapshot.edges {
        edges.rows.push(edge_row(&key.sender, &key.receiver, line));
    }

    let mut sources = Table::new(SOURCE_HEADER);
    for l in &snapshot.sources {
        sources.rows.push(vec![
            l.general.name.clone(),
            l.general.node_type.to_string(),
            l.general.state.clone(),
            l.sent.to_string(),
            l.dropped.to_string(),
        ]);
    }

    let mut boxes = Table::new(BOX_HEADER);
    for l in &snapshot.boxes {
        boxes.rows.push(vec![
            l.general.name.clone(),
            l.general.node_type.to_string(),
            l.general.state.clone(),
            l.net_throughput.to_string(),
            l.dropped.to_string(),
            l.errors.to_string(),
        ]);
    }

    let mut sinks = Table::new(SINK_HEADER);
    for l in &snapshot.sinks {
        sinks.rows.push(vec![
            l.general.name.clone(),
            l.general.node_type.to_string(),
            l.general.state.clone(),
            l.received.to_string(),
            l.errors.to_string(),
        ]);
    }

    [edges, sources, boxes, sinks]
}

/// Render a snapshot as newline-terminated text.
pub fn render(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for (i, table) in tables(snapshot).iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for line in table.lines() {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}
