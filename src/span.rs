//! The span data model (data model §3).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::{SpanId, TraceId};

/// The (span, trace) pair a span is addressed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanContext {
    pub span_id: SpanId,
    pub trace_id: TraceId,
}

/// A tag or event value; the textual wire grammar may produce either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Str(String),
    Int(i64),
}

/// Span completion status. Nothing in the handler sets this to `Error`
/// today; it exists because the exporter contract expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Ok,
    Error,
}

/// A finished (or provisional, pre-emission) span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub context: SpanContext,
    pub parent_id: Option<SpanId>,
    pub operation: String,
    pub thread_id: u32,
    pub started_at: u64,
    pub finished_at: u64,
    pub status: Status,
    pub tags: HashMap<String, TagValue>,
    /// `(timestamp, name, value)`, most recently added first.
    pub events: Vec<(u64, String, TagValue)>,
    pub nanoseconds_spent_in_gc: u64,
}

impl Span {
    pub fn new(
        context: SpanContext,
        parent_id: Option<SpanId>,
        operation: impl Into<String>,
        thread_id: u32,
        started_at: u64,
    ) -> Self {
        Self {
            context,
            parent_id,
            operation: operation.into(),
            thread_id,
            started_at,
            finished_at: 0,
            status: Status::Ok,
            tags: HashMap::new(),
            events: Vec::new(),
            nanoseconds_spent_in_gc: 0,
        }
    }

    pub fn push_event(&mut self, ts: u64, name: impl Into<String>, value: TagValue) {
        self.events.insert(0, (ts, name.into(), value));
    }
}
