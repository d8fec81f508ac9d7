//! Textual "ot2" grammar: human-authored, whitespace-tokenized lines such as
//! `ot2 begin span 7 fetch-user` or `ot2 metric sum gc_ns 42`.
//!
//! A line that doesn't start with the `ot2` keyword isn't this sublanguage at
//! all and decodes to `Ok(None)`; a line that starts with it but doesn't
//! match any of the eight shapes is a data error.

use crate::ids::{Serial, SpanId, TraceId};
use crate::metric::InstrumentKind;
use crate::span::TagValue;

use super::{TracingOp, WireError};

pub fn parse(line: &str) -> Result<Option<TracingOp>, WireError> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("ot2") {
        return Ok(None);
    }

    let malformed = || WireError::Text(line.to_string());

    match tokens.next().ok_or_else(malformed)? {
        "begin" => {
            expect(&mut tokens, "span", line)?;
            let serial = parse_serial(tokens.next(), line)?;
            let name = rest(tokens);
            if name.is_empty() {
                return Err(malformed());
            }
            Ok(Some(TracingOp::BeginSpan { serial, name }))
        }
        "end" => {
            expect(&mut tokens, "span", line)?;
            let serial = parse_serial(tokens.next(), line)?;
            if tokens.next().is_some() {
                return Err(malformed());
            }
            Ok(Some(TracingOp::EndSpan { serial }))
        }
        "add" => {
            expect(&mut tokens, "event", line)?;
            let serial = parse_serial(tokens.next(), line)?;
            let key = tokens.next().ok_or_else(malformed)?.to_string();
            let value = parse_value(rest(tokens));
            Ok(Some(TracingOp::Event { serial, key, value }))
        }
        "set" => match tokens.next().ok_or_else(malformed)? {
            "tag" => {
                let serial = parse_serial(tokens.next(), line)?;
                let key = tokens.next().ok_or_else(malformed)?.to_string();
                let value = parse_value(rest(tokens));
                Ok(Some(TracingOp::Tag { serial, key, value }))
            }
            "traceid" => {
                let serial = parse_serial(tokens.next(), line)?;
                let trace = TraceId(parse_hex(tokens.next(), line)?);
                if tokens.next().is_some() {
                    return Err(malformed());
                }
                Ok(Some(TracingOp::SetTrace { serial, trace }))
            }
            "spanid" => {
                let serial = parse_serial(tokens.next(), line)?;
                let span = SpanId(parse_hex(tokens.next(), line)?);
                if tokens.next().is_some() {
                    return Err(malformed());
                }
                Ok(Some(TracingOp::SetSpan { serial, span }))
            }
            "parent" => {
                let serial = parse_serial(tokens.next(), line)?;
                let trace = TraceId(parse_hex(tokens.next(), line)?);
                let span = SpanId(parse_hex(tokens.next(), line)?);
                if tokens.next().is_some() {
                    return Err(malformed());
                }
                Ok(Some(TracingOp::SetParent { serial, span, trace }))
            }
            _ => Err(malformed()),
        },
        "metric" => {
            let kind = InstrumentKind::from_text_token(tokens.next().ok_or_else(malformed)?)
                .ok_or_else(malformed)?;
            let name = tokens.next().ok_or_else(malformed)?.to_string();
            let value: i64 = tokens
                .next()
                .ok_or_else(malformed)?
                .parse()
                .map_err(|_| malformed())?;
            if tokens.next().is_some() {
                return Err(malformed());
            }
            Ok(Some(TracingOp::Metric { kind, name, value }))
        }
        _ => Err(malformed()),
    }
}

fn expect<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    expected: &str,
    line: &str,
) -> Result<(), WireError> {
    match tokens.next() {
        Some(tok) if tok == expected => Ok(()),
        _ => Err(WireError::Text(line.to_string())),
    }
}

fn parse_serial<'a>(token: Option<&'a str>, line: &str) -> Result<Serial, WireError> {
    token
        .and_then(|t| t.parse().ok())
        .map(Serial)
        .ok_or_else(|| WireError::Text(line.to_string()))
}

fn parse_hex(token: Option<&str>, line: &str) -> Result<u64, WireError> {
    token
        .and_then(|t| u64::from_str_radix(t, 16).ok())
        .ok_or_else(|| WireError::Text(line.to_string()))
}

fn rest<'a>(tokens: impl Iterator<Item = &'a str>) -> String {
    tokens.collect::<Vec<_>>().join(" ")
}

/// A single token that parses as a whole integer is `Int`; anything else
/// (including multi-word text) is `Str`.
fn parse_value(raw: String) -> TagValue {
    if !raw.contains(' ') {
        if let Ok(n) = raw.parse::<i64>() {
            return TagValue::Int(n);
        }
    }
    TagValue::Str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_ot2_line_is_ignorable() {
        assert_eq!(parse("just some log line"), Ok(None));
    }

    #[test]
    fn test_begin_span() {
        let op = parse("ot2 begin span 7 fetch-user").unwrap().unwrap();
        assert_eq!(
            op,
            TracingOp::BeginSpan {
                serial: Serial(7),
                name: "fetch-user".to_string()
            }
        );
    }

    #[test]
    fn test_begin_span_name_may_contain_spaces() {
        let op = parse("ot2 begin span 7 fetch user by id").unwrap().unwrap();
        assert_eq!(
            op,
            TracingOp::BeginSpan {
                serial: Serial(7),
                name: "fetch user by id".to_string()
            }
        );
    }

    #[test]
    fn test_end_span() {
        let op = parse("ot2 end span 7").unwrap().unwrap();
        assert_eq!(op, TracingOp::EndSpan { serial: Serial(7) });
    }

    #[test]
    fn test_set_tag_int_value() {
        let op = parse("ot2 set tag 7 retries 3").unwrap().unwrap();
        assert_eq!(
            op,
            TracingOp::Tag {
                serial: Serial(7),
                key: "retries".to_string(),
                value: TagValue::Int(3)
            }
        );
    }

    #[test]
    fn test_set_tag_string_value() {
        let op = parse("ot2 set tag 7 status ok done").unwrap().unwrap();
        assert_eq!(
            op,
            TracingOp::Tag {
                serial: Serial(7),
                key: "status".to_string(),
                value: TagValue::Str("ok done".to_string())
            }
        );
    }

    #[test]
    fn test_set_parent() {
        let op = parse("ot2 set parent 7 2a 01").unwrap().unwrap();
        assert_eq!(
            op,
            TracingOp::SetParent {
                serial: Serial(7),
                trace: TraceId(0x2a),
                span: SpanId(0x01),
            }
        );
    }

    #[test]
    fn test_metric() {
        let op = parse("ot2 metric sum gc_ns 42").unwrap().unwrap();
        assert_eq!(
            op,
            TracingOp::Metric {
                kind: InstrumentKind::SumObserver,
                name: "gc_ns".to_string(),
                value: 42,
            }
        );
    }

    #[test]
    fn test_unrecognized_ot2_shape_is_error() {
        assert!(parse("ot2 frobnicate 7").is_err());
    }

    #[test]
    fn test_missing_serial_is_error() {
        assert!(parse("ot2 begin span not-a-number foo").is_err());
    }
}
