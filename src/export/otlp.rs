//! An OTLP-backed exporter, behind the `otlp` feature: a Tokio runtime
//! driving an `opentelemetry_sdk` batch span processor, built once and
//! reused across `export` calls.
//!
//! The data model's 64-bit `SpanId`/`TraceId` are not the W3C 128/64-bit
//! form OTLP expects; they are widened by zero-extension (high bytes zero,
//! low bytes the big-endian encoding of the original integer) rather than
//! reinterpreted, so two spans that differ only in our id still differ in
//! the OTLP id.

use anyhow::Result;
use opentelemetry::{
    trace::{SpanBuilder, SpanContext, SpanKind, TraceFlags, TraceState, Tracer, TracerProvider as _},
    KeyValue,
};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{BatchSpanProcessor, SdkTracerProvider as TracerProvider};
use opentelemetry_sdk::Resource;

use super::{ExportResult, MetricExporter, SpanExporter};
use crate::ids::{SpanId as OurSpanId, TraceId as OurTraceId};
use crate::metric::MetricSample;
use crate::span::Span as OurSpan;

#[derive(Debug, Clone)]
pub struct OtlpConfig {
    pub endpoint: String,
    pub service_name: String,
}

impl OtlpConfig {
    pub fn new(endpoint: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            service_name: service_name.into(),
        }
    }
}

fn otel_trace_id(id: OurTraceId) -> opentelemetry::trace::TraceId {
    let mut bytes = [0u8; 16];
    bytes[8..].copy_from_slice(&id.0.to_be_bytes());
    opentelemetry::trace::TraceId::from_bytes(bytes)
}

fn otel_span_id(id: OurSpanId) -> opentelemetry::trace::SpanId {
    opentelemetry::trace::SpanId::from_bytes(id.0.to_be_bytes())
}

fn to_system_time(nanos_since_origin: u64) -> std::time::SystemTime {
    std::time::UNIX_EPOCH + std::time::Duration::from_nanos(nanos_since_origin)
}

pub struct OtlpSpanExporter {
    _runtime: tokio::runtime::Runtime,
    _provider: TracerProvider,
    tracer: opentelemetry_sdk::trace::Tracer,
}

impl OtlpSpanExporter {
    pub fn new(config: OtlpConfig) -> Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        let (provider, tracer) = runtime.block_on(async {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(&config.endpoint)
                .build()?;
            let span_processor = BatchSpanProcessor::builder(exporter).build();
            let resource = Resource::builder()
                .with_service_name(config.service_name.clone())
                .build();
            let provider = TracerProvider::builder()
                .with_span_processor(span_processor)
                .with_resource(resource)
                .build();
            let tracer = provider.tracer("eventlog-otel");
            Ok::<_, anyhow::Error>((provider, tracer))
        })?;

        Ok(Self {
            _runtime: runtime,
            _provider: provider,
            tracer,
        })
    }
}

impl SpanExporter for OtlpSpanExporter {
    fn export(&mut self, batch: &[OurSpan]) -> ExportResult {
        for span in batch {
            let span_context = SpanContext::new(
                otel_trace_id(span.context.trace_id),
                otel_span_id(span.context.span_id),
                TraceFlags::SAMPLED,
                false,
                TraceState::default(),
            );

            let attributes: Vec<KeyValue> = span
                .tags
                .iter()
                .map(|(k, v)| match v {
                    crate::span::TagValue::Str(s) => KeyValue::new(k.clone(), s.clone()),
                    crate::span::TagValue::Int(n) => KeyValue::new(k.clone(), *n),
                })
                .collect();

            let builder = SpanBuilder::from_name(span.operation.clone())
                .with_kind(SpanKind::Internal)
                .with_start_time(to_system_time(span.started_at))
                .with_attributes(attributes);

            let mut otel_span = self.tracer.build_with_context(
                builder,
                &opentelemetry::Context::new().with_remote_span_context(span_context),
            );
            opentelemetry::trace::Span::end_with_timestamp(
                &mut otel_span,
                to_system_time(span.finished_at),
            );
        }
        ExportResult::Success
    }

    fn shutdown(&mut self) {
        let _ = self._provider.shutdown();
    }
}

/// Metrics have no OTLP sink yet; spans are this crate's primary OTLP
/// surface.
#[derive(Debug, Default)]
pub struct NullMetricExporter;

impl MetricExporter for NullMetricExporter {
    fn export(&mut self, _batch: &[MetricSample]) -> ExportResult {
        ExportResult::Success
    }
}
