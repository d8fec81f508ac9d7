//! A JSON-lines exporter: appends one JSON object per span/metric-sample to
//! a writer, using `serde_json` directly rather than building an in-memory
//! document first. Chrome-trace, HTML and CSV formatting are out of scope
//! and are not implemented here.

use std::io::Write;

use super::{ExportResult, MetricExporter, SpanExporter};
use crate::metric::MetricSample;
use crate::span::Span;

pub struct JsonlSpanExporter<W: Write> {
    writer: W,
}

impl<W: Write> JsonlSpanExporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> SpanExporter for JsonlSpanExporter<W> {
    fn export(&mut self, batch: &[Span]) -> ExportResult {
        for span in batch {
            if write_record(&mut self.writer, span).is_err() {
                return ExportResult::Failure;
            }
        }
        ExportResult::Success
    }
}

pub struct JsonlMetricExporter<W: Write> {
    writer: W,
}

impl<W: Write> JsonlMetricExporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> MetricExporter for JsonlMetricExporter<W> {
    fn export(&mut self, batch: &[MetricSample]) -> ExportResult {
        for sample in batch {
            if write_record(&mut self.writer, sample).is_err() {
                return ExportResult::Failure;
            }
        }
        ExportResult::Success
    }
}

fn write_record<W: Write, T: serde::Serialize>(writer: &mut W, record: &T) -> std::io::Result<()> {
    serde_json::to_writer(&mut *writer, record).map_err(std::io::Error::other)?;
    writeln!(writer)
}
