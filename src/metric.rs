//! Metric samples and the instrument kinds the state machine emits (§3, §6).

use serde::{Deserialize, Serialize};

/// Instrument kinds, mirroring the OTel-ish observer taxonomy used at the
/// export boundary. The mapping to wire tag bytes/text tokens lives here so
/// both `wire::text` and `wire::binary` share one source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    UpDownSumObserver,
    SumObserver,
    ValueObserver,
}

impl InstrumentKind {
    /// Binary wire tag byte (§4.1 "Instrument tag encoding").
    pub fn from_tag(tag: i8) -> Option<Self> {
        match tag {
            1 => Some(InstrumentKind::UpDownSumObserver),
            2 => Some(InstrumentKind::SumObserver),
            3 => Some(InstrumentKind::ValueObserver),
            _ => None,
        }
    }

    pub fn tag(self) -> i8 {
        match self {
            InstrumentKind::UpDownSumObserver => 1,
            InstrumentKind::SumObserver => 2,
            InstrumentKind::ValueObserver => 3,
        }
    }

    /// Textual wire token, e.g. `ot2 metric sum gc_ns 42`.
    pub fn from_text_token(token: &str) -> Option<Self> {
        match token {
            "up_down" => Some(InstrumentKind::UpDownSumObserver),
            "sum" => Some(InstrumentKind::SumObserver),
            "value" => Some(InstrumentKind::ValueObserver),
            _ => None,
        }
    }

    pub fn text_token(self) -> &'static str {
        match self {
            InstrumentKind::UpDownSumObserver => "up_down",
            InstrumentKind::SumObserver => "sum",
            InstrumentKind::ValueObserver => "value",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub kind: InstrumentKind,
    pub name: String,
}

impl Instrument {
    pub fn new(kind: InstrumentKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Live-thread-count gauge, incremented on `CreateThread`, decremented on
    /// a terminal `StopThread` (§4.3).
    pub fn threads() -> Self {
        Self::new(InstrumentKind::UpDownSumObserver, "threads")
    }

    /// Cumulative nanoseconds spent in GC (§4.3 `EndGC`).
    pub fn gc_ns() -> Self {
        Self::new(InstrumentKind::SumObserver, "gc_ns")
    }

    /// Instantaneous live-heap-bytes gauge (§4.3 `HeapLive`).
    pub fn heap_live_bytes() -> Self {
        Self::new(InstrumentKind::ValueObserver, "heap_live_bytes")
    }

    /// Per-capability cumulative allocated-bytes counter (§4.3 `HeapAllocated`).
    pub fn cap_heap_alloc_bytes(cap: u16) -> Self {
        Self::new(
            InstrumentKind::SumObserver,
            format!("cap_{cap}_heap_alloc_bytes"),
        )
    }
}

/// A batch of `(timestamp, value)` points for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub instrument: Instrument,
    pub points: Vec<(u64, i64)>,
}

impl MetricSample {
    pub fn single(instrument: Instrument, ts: u64, value: i64) -> Self {
        Self {
            instrument,
            points: vec![(ts, value)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_tag_round_trips() {
        for kind in [
            InstrumentKind::UpDownSumObserver,
            InstrumentKind::SumObserver,
            InstrumentKind::ValueObserver,
        ] {
            assert_eq!(InstrumentKind::from_tag(kind.tag()), Some(kind));
        }
    }

    #[test]
    fn test_instrument_text_token_round_trips() {
        for kind in [
            InstrumentKind::UpDownSumObserver,
            InstrumentKind::SumObserver,
            InstrumentKind::ValueObserver,
        ] {
            assert_eq!(
                InstrumentKind::from_text_token(kind.text_token()),
                Some(kind)
            );
        }
    }

    #[test]
    fn test_unknown_tag_is_none() {
        assert_eq!(InstrumentKind::from_tag(9), None);
    }
}
