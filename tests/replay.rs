//! Replaying recorded node statuses through the public API.
use std::io::Write;

use bee_iotop::{render, Aggregator, StatusSource, StreamSource};

const RECORDED: &str = r#"{"node_name":"tweets","node_type":"source","state":"running","timestamp":"2016-05-12T10:00:00Z","output_stats":{"num_sent_total":100,"num_dropped":0,"outputs":{"filter":{"num_sent":100,"num_queued":2,"queue_size":1024}}}}
{"node_name":"filter","node_type":"box","state":"running","timestamp":"2016-05-12T10:00:00Z","input_stats":{"num_received_total":98,"num_errors":0,"inputs":{"tweets":{"num_received":98,"num_queued":1,"queue_size":1024}}},"output_stats":{"num_sent_total":90,"num_dropped":1,"outputs":{"out":{"num_sent":90,"num_queued":0,"queue_size":1024}}}}

{"node_name":"out","node_type":"sink","state":"running","timestamp":"2016-05-12T10:00:00Z","input_stats":{"num_received_total":90,"num_errors":3,"inputs":{"filter":{"num_received":90,"num_queued":0,"queue_size":1024}}}}
{"node_name":"tweets","node_type":"source","state":"running","timestamp":"2016-05-12T10:00:01Z","output_stats":{"num_sent_total":150,"num_dropped":0}}
"#;

async fn replay(text: &str) -> Aggregator {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    let reader = tokio::fs::File::open(file.path()).await.unwrap();

    let mut source = StreamSource::spawn(reader, "recorded");
    let aggregator = Aggregator::new();
    while let Some(value) = source.recv().await.unwrap() {
        aggregator.ingest(&value).unwrap();
    }
    aggregator
}

#[tokio::test]
async fn test_complete_tick_renders_all_tables() {
    let first_tick = RECORDED.lines().take(4).collect::<Vec<_>>().join("\n");
    let aggregator = replay(&first_tick).await;

    let expected = "\
SENDER STYPE  RCVER  RTYPE SQSIZE SQNUM SNUM RQSIZE RQNUM RNUM INOUT
filter box    out    sink  1024   0     90   1024   0     90   0
tweets source filter box   1024   2     100  1024   1     98   -2

NAME   NTYPE  STATE   OUT DROP
tweets source running 100 0

NAME   NTYPE STATE   INOUT DROP ERR
filter box   running -8    1    0

NAME NTYPE STATE   IN ERR
out  sink  running 90 3
";
    assert_eq!(render::render(&aggregator.snapshot()), expected);
}

#[tokio::test]
async fn test_new_tick_starts_a_fresh_snapshot() {
    let aggregator = replay(RECORDED).await;
    let snapshot = aggregator.snapshot();

    assert_eq!(snapshot.node_count(), 1);
    assert_eq!(snapshot.sources[0].sent, 150);
    assert!(snapshot.edges.is_empty());
    assert_eq!(
        snapshot.tick.unwrap().to_rfc3339(),
        "2016-05-12T10:00:01+00:00"
    );
}
