//! A reference event-log decoder: one JSON-encoded [`RuntimeEvent`] per
//! line. Production deployments supply the host profiler's real decoder
//! implementing [`EventLogDecoder`]; this one exists so the crate is
//! runnable end to end against hand-written or generated fixtures.

use super::{DecodeStep, EventLogDecoder, RuntimeEvent};

#[derive(Debug, Default)]
pub struct JsonlEventLogDecoder {
    buf: Vec<u8>,
    eof: bool,
}

impl JsonlEventLogDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
        line.pop(); // drop the newline
        Some(line)
    }
}

impl EventLogDecoder for JsonlEventLogDecoder {
    fn step(&mut self) -> DecodeStep {
        loop {
            match self.take_line() {
                Some(line) if line.is_empty() => continue,
                Some(line) => {
                    let text = match std::str::from_utf8(&line) {
                        Ok(text) => text,
                        Err(_) => return DecodeStep::Error(line, "invalid utf-8".to_string()),
                    };
                    return match serde_json::from_str::<RuntimeEvent>(text) {
                        Ok(event) => DecodeStep::Produce(event),
                        Err(e) => DecodeStep::Error(line, e.to_string()),
                    };
                }
                None if self.eof => {
                    if self.buf.is_empty() {
                        return DecodeStep::Done;
                    }
                    let leftover = std::mem::take(&mut self.buf);
                    return DecodeStep::Error(leftover, "unexpected eof mid-record".to_string());
                }
                None => return DecodeStep::Consume,
            }
        }
    }

    fn feed(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            self.eof = true;
        } else {
            self.buf.extend_from_slice(bytes);
        }
    }
}
