use std::fs::File;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;

mod cli;

use cli::{Cli, EofPolicyArg, ExportTarget};
use eventlog_otel::export::jsonl::{JsonlMetricExporter, JsonlSpanExporter};
use eventlog_otel::export::tracing_sink::{TracingMetricExporter, TracingSpanExporter};
#[cfg(feature = "otlp")]
use eventlog_otel::export::otlp::{NullMetricExporter, OtlpConfig, OtlpSpanExporter};
use eventlog_otel::export::SpanExporter;
use eventlog_otel::ids::EntropySpanIds;
use eventlog_otel::ingest::{self, EofPolicy, Source};
use eventlog_otel::state::Interpreter;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Cli::parse();

    let origin_timestamp_nanos = args.origin_timestamp_nanos.unwrap_or_else(now_nanos);
    let rng = match args.rng_seed {
        Some(seed) => EntropySpanIds::from_seed(seed),
        None => EntropySpanIds::from_entropy(),
    };
    let mut interpreter = Interpreter::new(origin_timestamp_nanos, rng);

    let eof_policy = match args.eof_policy {
        EofPolicyArg::Stop => EofPolicy::Stop,
        EofPolicyArg::SleepRetry => EofPolicy::SleepRetry,
    };

    let source = if ingest::Source::for_path(&args.input) {
        let file = File::open(&args.input)
            .with_context(|| format!("failed to open {:?}", args.input))?;
        Source::Handle {
            reader: Box::new(file),
            eof_policy,
        }
    } else {
        Source::File(args.input.clone())
    };

    match args.export {
        ExportTarget::Tracing => {
            let mut span_exporter = TracingSpanExporter;
            let mut metric_exporter = TracingMetricExporter;
            ingest::run(&mut interpreter, &mut span_exporter, &mut metric_exporter, source)?;
        }
        ExportTarget::Jsonl => {
            let path = args
                .export_path
                .context("--export-path is required for --export jsonl")?;
            let file = File::create(&path)
                .with_context(|| format!("failed to create {:?}", path))?;
            let mut span_exporter = JsonlSpanExporter::new(file.try_clone()?);
            let mut metric_exporter = JsonlMetricExporter::new(file);
            ingest::run(&mut interpreter, &mut span_exporter, &mut metric_exporter, source)?;
        }
        #[cfg(feature = "otlp")]
        ExportTarget::Otlp => {
            let endpoint = args
                .export_path
                .context("--export-path is required for --export otlp (the OTLP endpoint URL)")?
                .to_string_lossy()
                .into_owned();
            let mut span_exporter =
                OtlpSpanExporter::new(OtlpConfig::new(endpoint, "eventlog-otel"))?;
            let mut metric_exporter = NullMetricExporter;
            ingest::run(&mut interpreter, &mut span_exporter, &mut metric_exporter, source)?;
            span_exporter.shutdown();
        }
    }

    Ok(())
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
