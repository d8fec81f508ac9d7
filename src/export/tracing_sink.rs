//! A structured-logging exporter: logs each span and metric point via
//! `tracing::info!` rather than shipping it anywhere. Useful as a default
//! sink and for debugging the interpreter without standing up a collector.

use super::{ExportResult, MetricExporter, SpanExporter};
use crate::metric::MetricSample;
use crate::span::Span;

#[derive(Debug, Default)]
pub struct TracingSpanExporter;

impl SpanExporter for TracingSpanExporter {
    fn export(&mut self, batch: &[Span]) -> ExportResult {
        for span in batch {
            tracing::info!(
                span_id = %span.context.span_id,
                trace_id = %span.context.trace_id,
                parent_id = ?span.parent_id.map(|p| p.to_string()),
                operation = %span.operation,
                thread_id = span.thread_id,
                duration_ns = span.finished_at.saturating_sub(span.started_at),
                gc_ns = span.nanoseconds_spent_in_gc,
                "span"
            );
        }
        ExportResult::Success
    }
}

#[derive(Debug, Default)]
pub struct TracingMetricExporter;

impl MetricExporter for TracingMetricExporter {
    fn export(&mut self, batch: &[MetricSample]) -> ExportResult {
        for sample in batch {
            for (ts, value) in &sample.points {
                tracing::info!(
                    instrument = %sample.instrument.name,
                    ts,
                    value,
                    "metric"
                );
            }
        }
        ExportResult::Success
    }
}
