//! Binary "ot2" framing: a 32-bit little-endian header whose low 24 bits
//! are a magic number and whose high 8 bits are a message-type tag, followed
//! by a tag-specific body (§4.1).
//!
//! Message framing (where one `UserMessage` payload ends) is the event-log
//! decoder's job, not this layer's; `parse` decodes exactly one message from
//! a byte slice that already contains exactly one message's payload.

use crate::ids::{Serial, SpanId, TraceId};
use crate::metric::InstrumentKind;
use crate::span::TagValue;

use super::{TracingOp, WireError};

/// Low 24 bits of the header, spelling "OT2" plus a zero pad byte.
pub const MAGIC: u32 = u32::from_le_bytes([b'O', b'T', b'2', 0]) & 0x00FF_FFFF;

const TAG_BEGIN_SPAN: u8 = 1;
const TAG_END_SPAN: u8 = 2;
const TAG_TAG: u8 = 3;
const TAG_EVENT: u8 = 4;
const TAG_SET_PARENT_CONTEXT: u8 = 5;
const TAG_SET_TRACE_ID: u8 = 6;
const TAG_SET_SPAN_ID: u8 = 7;
const TAG_METRIC_CAPTURE: u8 = 8;

/// Decode one message. A header whose magic doesn't match isn't this
/// sublanguage's concern at all (`Ok(None)`), mirroring the textual
/// decoder's treatment of non-`ot2` lines.
pub fn parse(bytes: &[u8]) -> Result<Option<TracingOp>, WireError> {
    if bytes.len() < 4 {
        return Ok(None);
    }
    let header = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if header & 0x00FF_FFFF != MAGIC {
        return Ok(None);
    }
    let tag = (header >> 24) as u8;
    let body = &bytes[4..];
    let mut cursor = Cursor::new(body);

    let op = match tag {
        TAG_BEGIN_SPAN => {
            let serial = Serial(cursor.u64()?);
            let name = cursor.utf8_rest()?;
            TracingOp::BeginSpan { serial, name }
        }
        TAG_END_SPAN => TracingOp::EndSpan {
            serial: Serial(cursor.u64()?),
        },
        TAG_TAG | TAG_EVENT => {
            let serial = Serial(cursor.u64()?);
            let klen = cursor.u32()? as usize;
            let vlen = cursor.u32()? as usize;
            let key = cursor.utf8(klen)?;
            let value = TagValue::Str(cursor.utf8(vlen)?);
            if tag == TAG_TAG {
                TracingOp::Tag { serial, key, value }
            } else {
                TracingOp::Event { serial, key, value }
            }
        }
        TAG_SET_PARENT_CONTEXT => {
            let serial = Serial(cursor.u64()?);
            let span = SpanId(cursor.u64()?);
            let trace = TraceId(cursor.u64()?);
            TracingOp::SetParent { serial, span, trace }
        }
        TAG_SET_TRACE_ID => {
            let serial = Serial(cursor.u64()?);
            let trace = TraceId(cursor.u64()?);
            TracingOp::SetTrace { serial, trace }
        }
        TAG_SET_SPAN_ID => {
            let serial = Serial(cursor.u64()?);
            let span = SpanId(cursor.u64()?);
            TracingOp::SetSpan { serial, span }
        }
        TAG_METRIC_CAPTURE => {
            let tag_byte = cursor.i8()?;
            let kind = InstrumentKind::from_tag(tag_byte)
                .ok_or(WireError::UnknownInstrument(tag_byte))?;
            let value = cursor.i64()?;
            let name = cursor.utf8_rest()?;
            TracingOp::Metric { kind, name, value }
        }
        other => return Err(WireError::UnknownTag(other)),
    };
    Ok(Some(op))
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.pos + n > self.bytes.len() {
            return Err(WireError::Binary("truncated message body".to_string()));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, WireError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes(b.try_into().unwrap()))
    }

    fn u64(&mut self) -> Result<u64, WireError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes(b.try_into().unwrap()))
    }

    fn i64(&mut self) -> Result<i64, WireError> {
        Ok(self.u64()? as i64)
    }

    fn i8(&mut self) -> Result<i8, WireError> {
        let b = self.take(1)?;
        Ok(b[0] as i8)
    }

    fn utf8(&mut self, len: usize) -> Result<String, WireError> {
        let b = self.take(len)?;
        String::from_utf8(b.to_vec())
            .map_err(|_| WireError::Binary("invalid utf-8 payload".to_string()))
    }

    fn utf8_rest(&mut self) -> Result<String, WireError> {
        let b = &self.bytes[self.pos..];
        self.pos = self.bytes.len();
        String::from_utf8(b.to_vec())
            .map_err(|_| WireError::Binary("invalid utf-8 payload".to_string()))
    }
}
