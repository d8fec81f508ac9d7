//! The state machine (§4.3, §4.4): a single mutable `Interpreter` that folds
//! one [`RuntimeEvent`] at a time into zero or more finished spans and
//! metric samples.
//!
//! Design note (b): state lives in one mutable struct rather than a chain of
//! persistent maps, matching how the rest of this codebase is written.

use std::collections::HashMap;

use crate::eventlog::{RuntimeEvent, RuntimeEventSpec, UserMessage};
use crate::ids::{SpanIdSource, TraceId};
use crate::metric::{Instrument, MetricSample};
use crate::span::{Span, SpanContext, Status};
use crate::span_store::SpanStore;
use crate::wire::{self, TracingOp};

/// Fallback thread id used when an event carries no capability or the
/// capability has no known current thread (§4.4, "suspect behaviors").
const FALLBACK_THREAD_ID: u32 = 1;

/// Synthetic thread id under which GC spans are filed; GC is attributed to
/// the runtime as a whole, not to any one mutator thread.
const GC_THREAD_ID: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, Default)]
pub struct Counters {
    pub processed_events: u64,
    pub emitted_spans: u64,
}

/// Fatal: something the interpreter's own invariants guarantee can't
/// happen, happened anyway. The ingestion driver treats this as
/// unrecoverable (§7).
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("interpreter invariant violated: {0}")]
    Invariant(String),
}

#[derive(Debug, Default)]
struct DispatchOutcome {
    spans: Vec<Span>,
    metrics: Vec<MetricSample>,
}

pub struct Interpreter<R: SpanIdSource> {
    origin_timestamp: u64,
    thread_map: HashMap<u16, u32>,
    trace_map: HashMap<u32, TraceId>,
    spans: SpanStore,
    gc_started_at: u64,
    gc_generation: u64,
    pub counters: Counters,
    rng: R,
}

impl<R: SpanIdSource> Interpreter<R> {
    pub fn new(origin_timestamp: u64, rng: R) -> Self {
        Self {
            origin_timestamp,
            thread_map: HashMap::new(),
            trace_map: HashMap::new(),
            spans: SpanStore::new(),
            gc_started_at: 0,
            gc_generation: 0,
            counters: Counters::default(),
            rng,
        }
    }

    /// Folds one event, returning whatever spans finished and metric points
    /// it produced. Data errors (malformed wire messages) are logged and
    /// skipped in place; only invariant violations are returned as `Err`.
    pub fn process(
        &mut self,
        event: &RuntimeEvent,
    ) -> Result<(Vec<Span>, Vec<MetricSample>), ProcessError> {
        self.counters.processed_events += 1;
        let now = self.origin_timestamp + event.ts;
        let thread = event.cap.and_then(|cap| self.thread_map.get(&cap).copied());
        let trace = thread.and_then(|tid| self.trace_map.get(&tid).copied());

        let mut spans = Vec::new();
        let mut metrics = Vec::new();

        match &event.spec {
            RuntimeEventSpec::WallClockTime { sec, nsec } => {
                self.origin_timestamp =
                    (*sec * 1_000_000_000 + *nsec as u64).saturating_sub(event.ts);
            }
            RuntimeEventSpec::CreateThread { new_tid } => {
                // Weak fabrication: a thread created with no trace context
                // in scope is assigned a trace id derived from the current
                // origin timestamp rather than left traceless.
                let trace_id = trace.unwrap_or(TraceId(self.origin_timestamp));
                self.trace_map.insert(*new_tid, trace_id);
                metrics.push(MetricSample::single(Instrument::threads(), now, 1));
            }
            RuntimeEventSpec::RunThread { tid } => {
                if let Some(cap) = event.cap {
                    self.thread_map.insert(cap, *tid);
                }
            }
            RuntimeEventSpec::StopThread { tid, terminal } => {
                if *terminal {
                    if let Some(cap) = event.cap {
                        self.thread_map.remove(&cap);
                    }
                    self.trace_map.remove(tid);
                    metrics.push(MetricSample::single(Instrument::threads(), now, -1));
                }
            }
            RuntimeEventSpec::StartGc => {
                self.gc_started_at = now;
            }
            RuntimeEventSpec::EndGc => {
                let duration = now.saturating_sub(self.gc_started_at);
                for live in self.spans.live_spans_mut() {
                    live.nanoseconds_spent_in_gc += duration;
                }
                let sid = self.rng.next_span_id();
                let gc_span = Span::new(
                    SpanContext {
                        span_id: sid,
                        trace_id: TraceId(sid.0),
                    },
                    None,
                    "gc",
                    GC_THREAD_ID,
                    self.gc_started_at,
                );
                let mut gc_span = gc_span;
                gc_span.finished_at = now;
                gc_span.status = Status::Ok;
                spans.push(gc_span);
                metrics.push(MetricSample::single(
                    Instrument::gc_ns(),
                    now,
                    duration as i64,
                ));
                self.gc_generation += 1;
            }
            RuntimeEventSpec::HeapLive { live_bytes } => {
                metrics.push(MetricSample::single(
                    Instrument::heap_live_bytes(),
                    now,
                    *live_bytes as i64,
                ));
            }
            RuntimeEventSpec::HeapAllocated { alloc_bytes } => {
                if let Some(cap) = event.cap {
                    metrics.push(MetricSample::single(
                        Instrument::cap_heap_alloc_bytes(cap),
                        now,
                        *alloc_bytes as i64,
                    ));
                }
            }
            RuntimeEventSpec::UserMessage(msg) => {
                match parse_user_message(msg) {
                    Ok(Some(op)) => {
                        let tid = thread.unwrap_or(FALLBACK_THREAD_ID);
                        let outcome = self.dispatch_op(op, tid, now, trace)?;
                        spans.extend(outcome.spans);
                        metrics.extend(outcome.metrics);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping malformed tracing message");
                    }
                }
            }
            RuntimeEventSpec::Shutdown
            | RuntimeEventSpec::CapDelete
            | RuntimeEventSpec::CapsetDelete
            | RuntimeEventSpec::Other => {}
        }

        self.counters.emitted_spans += spans.len() as u64;
        Ok((spans, metrics))
    }

    fn dispatch_op(
        &mut self,
        op: TracingOp,
        tid: u32,
        now: u64,
        trace: Option<TraceId>,
    ) -> Result<DispatchOutcome, ProcessError> {
        match op {
            TracingOp::BeginSpan { serial, name } => {
                let mut emitted = Vec::new();
                if let Some(old_sid) = self.spans.sid_for_serial(serial) {
                    // Recycled serial: the previous span was never
                    // explicitly ended. Overwrite it with the new
                    // metadata, emit it as-is (its finishedAt is whatever
                    // it already held), then start tracking a fresh span
                    // under the same serial. Preserved as-is (§9).
                    self.spans.modify(old_sid, |span| {
                        span.operation = name.clone();
                        span.started_at = now;
                        span.thread_id = tid;
                    });
                    let span = self
                        .spans
                        .emit(serial, old_sid)
                        .map_err(|e| ProcessError::Invariant(e.to_string()))?;
                    emitted.push(span);
                }

                let sid = self.rng.next_span_id();
                self.spans.invent_sid(serial, sid);
                let parent_id = self.spans.top_of_stack(tid);
                let span = Span::new(
                    SpanContext {
                        span_id: sid,
                        trace_id: trace.unwrap_or(TraceId::UNKNOWN),
                    },
                    parent_id,
                    name,
                    tid,
                    now,
                );
                self.spans.create(sid, span);

                Ok(DispatchOutcome {
                    spans: emitted,
                    metrics: vec![],
                })
            }
            TracingOp::EndSpan { serial } => match self.spans.sid_for_serial(serial) {
                None => {
                    // Orphan end: no matching begin was ever seen. Park a
                    // zero-start placeholder so a later begin on the same
                    // serial has something to overwrite and emit (§9).
                    let sid = self.rng.next_span_id();
                    self.spans.invent_sid(serial, sid);
                    let parent_id = self.spans.top_of_stack(tid);
                    let mut span = Span::new(
                        SpanContext {
                            span_id: sid,
                            trace_id: trace.unwrap_or(TraceId::UNKNOWN),
                        },
                        parent_id,
                        "",
                        tid,
                        0,
                    );
                    span.finished_at = now;
                    self.spans.create(sid, span);
                    Ok(DispatchOutcome::default())
                }
                Some(sid) => {
                    self.spans.modify(sid, |span| span.finished_at = now);
                    let span = self
                        .spans
                        .emit(serial, sid)
                        .map_err(|e| ProcessError::Invariant(e.to_string()))?;
                    Ok(DispatchOutcome {
                        spans: vec![span],
                        metrics: vec![],
                    })
                }
            },
            TracingOp::Tag { serial, key, value } => {
                if let Some(sid) = self.spans.sid_for_serial(serial) {
                    self.spans.modify(sid, |span| {
                        span.tags.insert(key, value);
                    });
                }
                Ok(DispatchOutcome::default())
            }
            TracingOp::Event { serial, key, value } => {
                if let Some(sid) = self.spans.sid_for_serial(serial) {
                    self.spans.modify(sid, |span| span.push_event(now, key, value));
                }
                Ok(DispatchOutcome::default())
            }
            TracingOp::SetParent { serial, span, trace } => {
                if let Some(sid) = self.spans.sid_for_serial(serial) {
                    self.spans.modify(sid, |s| {
                        s.parent_id = Some(span);
                        s.context.trace_id = trace;
                    });
                }
                self.trace_map.insert(tid, trace);
                Ok(DispatchOutcome::default())
            }
            TracingOp::SetTrace { serial, trace } => {
                if let Some(sid) = self.spans.sid_for_serial(serial) {
                    self.spans.modify(sid, |s| s.context.trace_id = trace);
                }
                self.trace_map.insert(tid, trace);
                Ok(DispatchOutcome::default())
            }
            TracingOp::SetSpan { serial, span } => {
                // Does not rekey the span store's `spans` map: the span
                // remains addressable by its original sid even though its
                // externally-visible `context.span_id` has changed (§9).
                if let Some(sid) = self.spans.sid_for_serial(serial) {
                    self.spans.modify(sid, |s| s.context.span_id = span);
                }
                Ok(DispatchOutcome::default())
            }
            TracingOp::Metric { kind, name, value } => Ok(DispatchOutcome {
                spans: vec![],
                metrics: vec![MetricSample::single(Instrument::new(kind, name), now, value)],
            }),
        }
    }
}

fn parse_user_message(msg: &UserMessage) -> Result<Option<TracingOp>, wire::WireError> {
    match msg {
        UserMessage::Text(s) => wire::text::parse(s),
        UserMessage::Binary(b) => wire::binary::parse(b),
    }
}
