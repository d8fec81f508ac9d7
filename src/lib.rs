//! Streaming interpreter that turns a runtime event log into finished spans
//! and metric samples.
//!
//! [`state::Interpreter::process`] is the core fold; [`wire`] is the
//! embedded tracing sublanguage it dispatches user messages through;
//! [`ingest`] drives it over either a bounded file or an unbounded handle.

pub mod eventlog;
pub mod export;
pub mod ids;
pub mod ingest;
pub mod metric;
pub mod span;
pub mod span_store;
pub mod state;
pub mod wire;
