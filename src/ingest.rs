//! The ingestion driver (§4.5, §6): bounded file mode (sort-then-fold) and
//! unbounded handle/tail mode (blocking pull-parser loop).

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::eventlog::{self, DecodeStep, EventLogDecoder, RuntimeEventSpec};
use crate::export::{MetricExporter, SpanExporter};
use crate::ids::SpanIdSource;
use crate::state::{Interpreter, ProcessError};

const POLL_SLEEP: Duration = Duration::from_millis(1);
const READ_CHUNK: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EofPolicy {
    /// Treat EOF as "no more input"; finish the decode and return.
    Stop,
    /// Treat EOF as "no more input *yet*"; sleep and keep polling.
    SleepRetry,
}

pub enum Source {
    File(PathBuf),
    Handle {
        reader: Box<dyn Read>,
        eof_policy: EofPolicy,
    },
}

impl Source {
    /// A `.pipe` path suffix selects tail/handle mode over a plain file read
    /// of the same path (§6).
    pub fn for_path(path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "pipe")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    EventLog(#[from] eventlog::EventLogError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn run<R: SpanIdSource>(
    interpreter: &mut Interpreter<R>,
    span_exporter: &mut dyn SpanExporter,
    metric_exporter: &mut dyn MetricExporter,
    source: Source,
) -> Result<(), IngestError> {
    match source {
        Source::File(path) => run_file(interpreter, span_exporter, metric_exporter, &path),
        Source::Handle { reader, eof_policy } => {
            run_handle(interpreter, span_exporter, metric_exporter, reader, eof_policy)
        }
    }
}

/// File mode: decode everything, sort by timestamp (stable, so same-instant
/// events keep their decode order), then fold in order. Metrics and spans
/// from one event are forwarded to their exporters as soon as they're
/// produced; this driver never buffers a full batch across events.
fn run_file<R: SpanIdSource>(
    interpreter: &mut Interpreter<R>,
    span_exporter: &mut dyn SpanExporter,
    metric_exporter: &mut dyn MetricExporter,
    path: &Path,
) -> Result<(), IngestError> {
    let mut events = eventlog::decode_file(path)?;
    events.sort_by_key(|e| e.ts);

    for event in &events {
        let (spans, metrics) = interpreter.process(event)?;
        export_batch(span_exporter, metric_exporter, &spans, &metrics);
    }
    Ok(())
}

/// Handle/tail mode: drive the decoder's pull protocol directly against a
/// (possibly still-growing) reader, applying `eof_policy` whenever a read
/// comes back empty. Unlike file mode there is no sort step: events are
/// folded in arrival order, so a producer that reorders timestamps across
/// the poll boundary will be folded out of order. Reorder robustness is
/// file mode's property, not this one's.
fn run_handle<R: SpanIdSource>(
    interpreter: &mut Interpreter<R>,
    span_exporter: &mut dyn SpanExporter,
    metric_exporter: &mut dyn MetricExporter,
    mut reader: Box<dyn Read>,
    eof_policy: EofPolicy,
) -> Result<(), IngestError> {
    let mut decoder = eventlog::jsonl::JsonlEventLogDecoder::new();
    let mut buf = [0u8; READ_CHUNK];

    loop {
        match decoder.step() {
            DecodeStep::Produce(event) => {
                if matches!(
                    event.spec,
                    RuntimeEventSpec::Shutdown
                        | RuntimeEventSpec::CapDelete
                        | RuntimeEventSpec::CapsetDelete
                ) {
                    tracing::debug!(?event.spec, "observed a shutdown-adjacent event, continuing");
                }
                let (spans, metrics) = interpreter.process(&event)?;
                export_batch(span_exporter, metric_exporter, &spans, &metrics);
            }
            DecodeStep::Consume => match reader.read(&mut buf) {
                Ok(0) => match eof_policy {
                    EofPolicy::Stop => decoder.feed(&[]),
                    EofPolicy::SleepRetry => std::thread::sleep(POLL_SLEEP),
                },
                Ok(n) => decoder.feed(&buf[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(POLL_SLEEP);
                }
                Err(e) => return Err(IngestError::Io(e)),
            },
            DecodeStep::Done => {
                tracing::debug!("event log decoder reached a clean end of input");
                return Ok(());
            }
            DecodeStep::Error(leftover, msg) => {
                tracing::error!(leftover_bytes = leftover.len(), %msg, "event log decoder error");
                return Ok(());
            }
        }
    }
}

fn export_batch(
    span_exporter: &mut dyn SpanExporter,
    metric_exporter: &mut dyn MetricExporter,
    spans: &[crate::span::Span],
    metrics: &[crate::metric::MetricSample],
) {
    if !spans.is_empty() {
        let _ = span_exporter.export(spans);
    }
    if !metrics.is_empty() {
        let _ = metric_exporter.export(metrics);
    }
}
