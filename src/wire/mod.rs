//! The embedded user-level tracing sublanguage ("ot2"), in its two wire
//! framings (§4.1). A `UserMessage` payload decodes to at most one
//! [`TracingOp`]; anything that isn't an `ot2` message at all is not this
//! layer's concern and decodes to `Ok(None)`.

pub mod binary;
pub mod text;

use crate::ids::{Serial, SpanId, TraceId};
use crate::metric::InstrumentKind;
use crate::span::TagValue;

/// The eight operations the tracing sublanguage can express.
#[derive(Debug, Clone, PartialEq)]
pub enum TracingOp {
    BeginSpan { serial: Serial, name: String },
    EndSpan { serial: Serial },
    Tag { serial: Serial, key: String, value: TagValue },
    Event { serial: Serial, key: String, value: TagValue },
    SetParent { serial: Serial, span: SpanId, trace: TraceId },
    SetTrace { serial: Serial, trace: TraceId },
    SetSpan { serial: Serial, span: SpanId },
    Metric { kind: InstrumentKind, name: String, value: i64 },
}

/// A malformed or unrecognized tracing message (§7, "data error").
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("malformed ot2 text message: {0}")]
    Text(String),
    #[error("malformed binary tracing message: {0}")]
    Binary(String),
    #[error("unknown instrument tag {0}")]
    UnknownInstrument(i8),
    #[error("unknown message tag {0}")]
    UnknownTag(u8),
}
