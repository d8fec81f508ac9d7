//! The exporter contract (§6): `export(batch) -> ExportResult`, with the
//! return value ignored by the interpreter itself, plus an external
//! `shutdown()`. Two concrete sinks are provided; a third, OTLP-backed sink
//! is available behind the `otlp` feature.

pub mod jsonl;
#[cfg(feature = "otlp")]
pub mod otlp;
pub mod tracing_sink;

use crate::metric::MetricSample;
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportResult {
    Success,
    Failure,
}

pub trait SpanExporter {
    fn export(&mut self, batch: &[Span]) -> ExportResult;
    fn shutdown(&mut self) {}
}

pub trait MetricExporter {
    fn export(&mut self, batch: &[MetricSample]) -> ExportResult;
    fn shutdown(&mut self) {}
}
