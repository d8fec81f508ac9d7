//! The span store (§4.2): the bijection between ephemeral `Serial`s and
//! stable `SpanId`s, plus the per-thread "current span" stack.
//!
//! `spans` only ever loses an entry through [`SpanStore::emit`]; nothing
//! else is allowed to remove a span, which is what makes the quantified
//! invariants in §8 checkable against this one type.

use std::collections::HashMap;

use crate::ids::{Serial, SpanId};
use crate::span::Span;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SpanStoreError {
    #[error("emit called for serial {serial:?}, which maps to a different span than {sid:?}")]
    SerialMismatch { serial: Serial, sid: SpanId },
    #[error("emit called for unknown span {0:?}")]
    UnknownSpan(SpanId),
}

#[derive(Debug, Default)]
pub struct SpanStore {
    spans: HashMap<SpanId, Span>,
    serial2sid: HashMap<Serial, SpanId>,
    thread2sid: HashMap<u32, SpanId>,
}

impl SpanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sid_for_serial(&self, serial: Serial) -> Option<SpanId> {
        self.serial2sid.get(&serial).copied()
    }

    pub fn span(&self, sid: SpanId) -> Option<&Span> {
        self.spans.get(&sid)
    }

    pub fn top_of_stack(&self, thread: u32) -> Option<SpanId> {
        self.thread2sid.get(&thread).copied()
    }

    /// Binds a freshly-drawn `sid` to `serial`. Caller must ensure `serial`
    /// isn't already bound (invariant 1, bijection while live).
    pub fn invent_sid(&mut self, serial: Serial, sid: SpanId) {
        self.serial2sid.insert(serial, sid);
    }

    /// Inserts `span` under `sid` and makes it the current span for its
    /// thread, overwriting (not stacking) whatever was current before.
    pub fn create(&mut self, sid: SpanId, span: Span) {
        let thread = span.thread_id;
        self.spans.insert(sid, span);
        self.thread2sid.insert(thread, sid);
    }

    /// Removes `sid`'s span, returning it, and restores the thread's
    /// previous current span (the emitted span's parent, or none).
    pub fn emit(&mut self, serial: Serial, sid: SpanId) -> Result<Span, SpanStoreError> {
        match self.serial2sid.get(&serial) {
            Some(bound) if *bound == sid => {}
            Some(_) | None => return Err(SpanStoreError::SerialMismatch { serial, sid }),
        }
        let span = self
            .spans
            .remove(&sid)
            .ok_or(SpanStoreError::UnknownSpan(sid))?;
        self.serial2sid.remove(&serial);
        match span.parent_id {
            Some(parent) => {
                self.thread2sid.insert(span.thread_id, parent);
            }
            None => {
                self.thread2sid.remove(&span.thread_id);
            }
        }
        Ok(span)
    }

    /// Mutates an in-flight span in place. A no-op if `sid` is unknown.
    pub fn modify(&mut self, sid: SpanId, f: impl FnOnce(&mut Span)) {
        if let Some(span) = self.spans.get_mut(&sid) {
            f(span);
        }
    }

    pub fn live_spans_mut(&mut self) -> impl Iterator<Item = &mut Span> {
        self.spans.values_mut()
    }

    pub fn live_span_count(&self) -> usize {
        self.spans.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::TraceId;
    use crate::span::SpanContext;

    fn span(sid: SpanId, parent: Option<SpanId>, thread: u32) -> Span {
        Span::new(
            SpanContext {
                span_id: sid,
                trace_id: TraceId(1),
            },
            parent,
            "op",
            thread,
            0,
        )
    }

    #[test]
    fn test_create_then_emit_round_trips() {
        let mut store = SpanStore::new();
        let serial = Serial(1);
        let sid = SpanId(100);
        store.invent_sid(serial, sid);
        store.create(sid, span(sid, None, 7));
        assert_eq!(store.top_of_stack(7), Some(sid));

        let emitted = store.emit(serial, sid).unwrap();
        assert_eq!(emitted.context.span_id, sid);
        assert_eq!(store.sid_for_serial(serial), None);
        assert_eq!(store.top_of_stack(7), None);
        assert_eq!(store.live_span_count(), 0);
    }

    #[test]
    fn test_emit_restores_parent_as_current() {
        let mut store = SpanStore::new();
        let parent_sid = SpanId(1);
        let child_sid = SpanId(2);
        store.invent_sid(Serial(1), parent_sid);
        store.create(parent_sid, span(parent_sid, None, 7));
        store.invent_sid(Serial(2), child_sid);
        store.create(child_sid, span(child_sid, Some(parent_sid), 7));
        assert_eq!(store.top_of_stack(7), Some(child_sid));

        store.emit(Serial(2), child_sid).unwrap();
        assert_eq!(store.top_of_stack(7), Some(parent_sid));
    }

    #[test]
    fn test_emit_with_wrong_sid_is_error() {
        let mut store = SpanStore::new();
        let sid = SpanId(1);
        store.invent_sid(Serial(1), sid);
        store.create(sid, span(sid, None, 7));
        assert!(store.emit(Serial(1), SpanId(999)).is_err());
    }

    #[test]
    fn test_emit_unknown_serial_is_error() {
        let mut store = SpanStore::new();
        assert!(store.emit(Serial(42), SpanId(1)).is_err());
    }

    #[test]
    fn test_modify_is_noop_on_unknown_sid() {
        let mut store = SpanStore::new();
        store.modify(SpanId(1), |s| s.operation = "changed".to_string());
    }
}
