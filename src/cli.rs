//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Turn a runtime event log into finished spans and metric samples.
#[derive(Parser, Debug)]
#[command(name = "eventlog-otel")]
#[command(version)]
#[command(about = "Streaming interpreter for runtime event logs", long_about = None)]
pub struct Cli {
    /// Path to the event log. A `.pipe` extension selects tail mode.
    pub input: PathBuf,

    /// Wall-clock-in-nanoseconds origin; defaults to the current time.
    #[arg(long)]
    pub origin_timestamp_nanos: Option<u64>,

    /// EOF policy for tail mode; ignored in file mode.
    #[arg(long, value_enum, default_value_t = EofPolicyArg::SleepRetry)]
    pub eof_policy: EofPolicyArg,

    /// Where finished spans and metrics are sent.
    #[arg(long, value_enum, default_value_t = ExportTarget::Tracing)]
    pub export: ExportTarget,

    /// Output path, required by `--export jsonl` and `--export otlp`.
    #[arg(long)]
    pub export_path: Option<PathBuf>,

    /// Deterministic seed for the span-id RNG. Testing only.
    #[arg(long)]
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EofPolicyArg {
    Stop,
    SleepRetry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportTarget {
    Tracing,
    Jsonl,
    #[cfg(feature = "otlp")]
    Otlp,
}
