//! End-to-end coverage of the six numbered boundary scenarios, driven
//! through `ingest::run_file` rather than `Interpreter::process` directly,
//! so the sort-then-fold step is exercised too.

use eventlog_otel::eventlog::{RuntimeEvent, RuntimeEventSpec, UserMessage};
use eventlog_otel::export::jsonl::{JsonlMetricExporter, JsonlSpanExporter};
use eventlog_otel::ids::EntropySpanIds;
use eventlog_otel::ingest::{self, Source};
use eventlog_otel::state::Interpreter;

fn write_fixture(events: &[RuntimeEvent]) -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().unwrap();
    {
        use std::io::Write;
        let mut w = std::fs::File::create(file.path()).unwrap();
        for event in events {
            writeln!(w, "{}", serde_json::to_string(event).unwrap()).unwrap();
        }
    }
    file
}

fn text(s: &str) -> RuntimeEventSpec {
    RuntimeEventSpec::UserMessage(UserMessage::Text(s.to_string()))
}

fn run_fixture(events: &[RuntimeEvent]) -> (Vec<String>, Vec<String>) {
    let fixture = write_fixture(events);
    let mut interpreter = Interpreter::new(0, EntropySpanIds::from_seed(42));
    let mut span_buf = Vec::new();
    let mut metric_buf = Vec::new();
    {
        let mut span_exporter = JsonlSpanExporter::new(&mut span_buf);
        let mut metric_exporter = JsonlMetricExporter::new(&mut metric_buf);
        ingest::run(
            &mut interpreter,
            &mut span_exporter,
            &mut metric_exporter,
            Source::File(fixture.path().to_path_buf()),
        )
        .unwrap();
    }
    let spans: Vec<String> = String::from_utf8(span_buf)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    let metrics: Vec<String> = String::from_utf8(metric_buf)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    (spans, metrics)
}

/// Scenario 1: a clean begin/end pair on one thread emits exactly one span.
#[test]
fn test_scenario_clean_begin_end() {
    let events = vec![
        RuntimeEvent {
            ts: 0,
            cap: Some(0),
            spec: RuntimeEventSpec::RunThread { tid: 1 },
        },
        RuntimeEvent {
            ts: 10,
            cap: Some(0),
            spec: text("ot2 begin span 1 work"),
        },
        RuntimeEvent {
            ts: 20,
            cap: Some(0),
            spec: text("ot2 end span 1"),
        },
    ];
    let (spans, _) = run_fixture(&events);
    assert_eq!(spans.len(), 1);
    assert!(spans[0].contains("\"operation\":\"work\""));
}

/// Scenario 2: orphan end followed by a begin on the recycled serial emits
/// the overwritten placeholder, then tracks a fresh span.
#[test]
fn test_scenario_orphan_end_then_begin() {
    let events = vec![
        RuntimeEvent {
            ts: 50,
            cap: Some(0),
            spec: text("ot2 end span 999"),
        },
        RuntimeEvent {
            ts: 60,
            cap: Some(0),
            spec: text("ot2 begin span 999 bar"),
        },
        RuntimeEvent {
            ts: 70,
            cap: Some(0),
            spec: text("ot2 end span 999"),
        },
    ];
    let (spans, _) = run_fixture(&events);
    assert_eq!(spans.len(), 2);
    assert!(spans[0].contains("\"operation\":\"bar\""));
    assert!(spans[1].contains("\"operation\":\"bar\""));
}

/// Scenario 3: a begin for a serial that's already live (never ended) is
/// emitted with overwritten metadata and a fresh span starts in its place.
#[test]
fn test_scenario_recycled_serial_begin() {
    let events = vec![
        RuntimeEvent {
            ts: 0,
            cap: Some(0),
            spec: text("ot2 begin span 1 first"),
        },
        RuntimeEvent {
            ts: 10,
            cap: Some(0),
            spec: text("ot2 begin span 1 second"),
        },
        RuntimeEvent {
            ts: 20,
            cap: Some(0),
            spec: text("ot2 end span 1"),
        },
    ];
    let (spans, _) = run_fixture(&events);
    assert_eq!(spans.len(), 2);
    assert!(spans[0].contains("\"operation\":\"second\""));
    assert!(spans[1].contains("\"operation\":\"second\""));
}

/// Scenario 4: a GC window overlapping a live span attributes GC time to it.
#[test]
fn test_scenario_gc_steals_time_from_live_span() {
    let events = vec![
        RuntimeEvent {
            ts: 0,
            cap: Some(0),
            spec: text("ot2 begin span 1 work"),
        },
        RuntimeEvent {
            ts: 10,
            cap: None,
            spec: RuntimeEventSpec::StartGc,
        },
        RuntimeEvent {
            ts: 30,
            cap: None,
            spec: RuntimeEventSpec::EndGc,
        },
        RuntimeEvent {
            ts: 40,
            cap: Some(0),
            spec: text("ot2 end span 1"),
        },
    ];
    let (spans, metrics) = run_fixture(&events);
    assert_eq!(spans.len(), 2); // gc span + work span
    assert!(spans.iter().any(|s| s.contains("\"nanoseconds_spent_in_gc\":20")));
    assert!(!metrics.is_empty());
}

/// Scenario 5: thread-count metrics are emitted on creation and terminal stop.
#[test]
fn test_scenario_thread_lifecycle_metrics() {
    let events = vec![
        RuntimeEvent {
            ts: 0,
            cap: Some(0),
            spec: RuntimeEventSpec::CreateThread { new_tid: 9 },
        },
        RuntimeEvent {
            ts: 10,
            cap: Some(0),
            spec: RuntimeEventSpec::StopThread {
                tid: 9,
                terminal: true,
            },
        },
    ];
    let (_, metrics) = run_fixture(&events);
    assert_eq!(metrics.len(), 2);
}

/// Scenario 6: reorder robustness. File mode sorts by timestamp before
/// folding, so a decode-order swap doesn't affect the fold order.
#[test]
fn test_scenario_reorder_robustness() {
    let events = vec![
        RuntimeEvent {
            ts: 20,
            cap: Some(0),
            spec: text("ot2 end span 1"),
        },
        RuntimeEvent {
            ts: 0,
            cap: Some(0),
            spec: text("ot2 begin span 1 work"),
        },
    ];
    let (spans, _) = run_fixture(&events);
    assert_eq!(spans.len(), 1);
    assert!(spans[0].contains("\"started_at\":0"));
    assert!(spans[0].contains("\"finished_at\":20"));
}
