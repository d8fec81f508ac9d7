//! Identifier types and the span-id RNG seam.
//!
//! `TraceId` and `SpanId` are opaque 64-bit integers chosen by the runtime
//! producing the event log; `Serial` is the ephemeral per-callsite id that is
//! only unique between a `BeginSpan` and its matching `EndSpan`.

use std::fmt;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

/// Stable span identifier, assigned once a span is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanId(pub u64);

/// Trace identifier shared by all spans that are causally related.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(pub u64);

impl TraceId {
    /// Sentinel used when a span finishes without ever being assigned a
    /// real trace (data model invariant, not a derived value).
    pub const UNKNOWN: TraceId = TraceId(42);
}

/// Ephemeral identifier chosen by the emitting code; reused freely across
/// the process lifetime once its span has been emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Serial(pub u64);

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pluggable 64-bit source of span ids (design note: "RNG seam").
///
/// Production code should seed from a high-entropy source; tests seed
/// deterministically so emitted span ids are reproducible.
pub trait SpanIdSource {
    fn next_u64(&mut self) -> u64;

    fn next_span_id(&mut self) -> SpanId {
        SpanId(self.next_u64())
    }
}

/// Default span-id source backed by `rand`'s `StdRng`.
#[derive(Debug)]
pub struct EntropySpanIds(StdRng);

impl EntropySpanIds {
    /// Seed from OS entropy, the production path.
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    /// Seed deterministically, for reproducible tests.
    pub fn from_seed(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl SpanIdSource for EntropySpanIds {
    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_seed_is_reproducible() {
        let mut a = EntropySpanIds::from_seed(7);
        let mut b = EntropySpanIds::from_seed(7);
        assert_eq!(a.next_u64(), b.next_u64());
        assert_eq!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn test_span_id_display_is_hex() {
        let id = SpanId(0x00f0_67aa_0ba9_02b7);
        assert_eq!(id.to_string(), "00f067aa0ba902b7");
    }

    #[test]
    fn test_trace_id_unknown_sentinel() {
        assert_eq!(TraceId::UNKNOWN, TraceId(42));
    }
}
