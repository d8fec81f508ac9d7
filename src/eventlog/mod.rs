//! The `RuntimeEvent` contract and the pull-parser decoder seam (§4.5, §6).
//!
//! Decoding the real host profiler's byte-level event log, headers,
//! capability tables, timestamp encodings, is out of scope; this module
//! defines the shape a decoder must produce and ships one concrete decoder
//! ([`jsonl::JsonlEventLogDecoder`]) good enough to run the interpreter
//! end to end against a test fixture or a hand-written trace.

pub mod jsonl;

use std::path::Path;

use serde::{Deserialize, Serialize};

/// One decoded record. `cap` is the capability (OS thread slot) the record
/// was emitted on, when the underlying event carries one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeEvent {
    pub ts: u64,
    pub cap: Option<u16>,
    pub spec: RuntimeEventSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UserMessage {
    Text(String),
    Binary(Vec<u8>),
}

/// The event kinds the state machine dispatches on (§4.3), plus a catch-all
/// for the much larger set of event kinds a real event log carries that
/// this interpreter has no opinion about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum RuntimeEventSpec {
    WallClockTime { sec: u64, nsec: u32 },
    CreateThread { new_tid: u32 },
    RunThread { tid: u32 },
    StopThread { tid: u32, terminal: bool },
    StartGc,
    EndGc,
    HeapLive { live_bytes: u64 },
    HeapAllocated { alloc_bytes: u64 },
    UserMessage(UserMessage),
    Shutdown,
    CapDelete,
    CapsetDelete,
    Other,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EventLogError {
    #[error("{0}")]
    Message(String),
}

/// Four-state pull protocol a decoder drives itself through (design note:
/// "poll-sleep workaround"). `Consume` means "I need more bytes before I can
/// say anything else"; the driver reads up to 4096 bytes and calls
/// [`EventLogDecoder::feed`].
pub enum DecodeStep {
    Produce(RuntimeEvent),
    Consume,
    Done,
    Error(Vec<u8>, String),
}

pub trait EventLogDecoder {
    /// Advance by one step. Must be called again after `Consume` only once
    /// `feed` has supplied more bytes (or signalled EOF with an empty feed).
    fn step(&mut self) -> DecodeStep;

    /// Supplies newly read bytes. An empty slice signals end of input.
    fn feed(&mut self, bytes: &[u8]);
}

/// Bounded (file) ingestion reads the whole decoded sequence up front so it
/// can be sorted by timestamp before folding (§4.5).
pub fn decode_file(path: &Path) -> Result<Vec<RuntimeEvent>, EventLogError> {
    let bytes = std::fs::read(path).map_err(|e| EventLogError::Message(e.to_string()))?;
    let mut decoder = jsonl::JsonlEventLogDecoder::new();
    decoder.feed(&bytes);
    decoder.feed(&[]);

    let mut events = Vec::new();
    loop {
        match decoder.step() {
            DecodeStep::Produce(event) => events.push(event),
            DecodeStep::Consume => {
                return Err(EventLogError::Message(
                    "decoder requested more input but the file is exhausted".to_string(),
                ));
            }
            DecodeStep::Done => break,
            DecodeStep::Error(_, msg) => return Err(EventLogError::Message(msg)),
        }
    }
    Ok(events)
}
