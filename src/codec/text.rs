//! Text-delimited wire profile.
//!
//! One frame per line: `SEQUENCE|TIMESTAMP|PAYLOAD|CHECKSUM`, extended with
//! `|INGRESS|EGRESS` per traversed hop, terminated by `\n` (a preceding `\r`
//! is tolerated). All numeric fields are non-negative decimal ASCII. Empty
//! lines and `STATUS|` report lines are skipped, not counted as malformed.

use super::checksum::payload_checksum;
use super::{Extracted, FrameCodec};
use crate::error::{DecodeError, RelayError, Result};
use crate::stats::STATUS_PREFIX;
use crate::types::{Frame, MAX_HOPS, MAX_PAYLOAD_LEN};

/// Field separator for the text profile.
pub const DELIMITER: u8 = b'|';

/// Codec for the pipe-delimited line profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl TextCodec {
    pub fn new() -> Self {
        Self
    }
}

impl FrameCodec for TextCodec {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>> {
        if frame.payload.len() > MAX_PAYLOAD_LEN {
            return Err(RelayError::payload_rejected(format!(
                "payload of {} bytes exceeds the {MAX_PAYLOAD_LEN}-byte limit",
                frame.payload.len()
            )));
        }
        if frame.payload.iter().any(|&b| b == DELIMITER || b == b'\n' || b == b'\r') {
            // Delimiter collision would make the line ambiguous on decode.
            return Err(RelayError::payload_rejected(
                "payload contains a delimiter or line terminator byte",
            ));
        }
        if frame.hops() > MAX_HOPS {
            return Err(RelayError::payload_rejected(format!(
                "frame carries {} hop stamps, limit is {MAX_HOPS}",
                frame.hops()
            )));
        }

        let mut line = Vec::with_capacity(32 + frame.payload.len() + frame.hops() * 22);
        line.extend_from_slice(frame.sequence.to_string().as_bytes());
        line.push(DELIMITER);
        line.extend_from_slice(frame.origin_ms.to_string().as_bytes());
        line.push(DELIMITER);
        line.extend_from_slice(&frame.payload);
        line.push(DELIMITER);
        line.extend_from_slice(frame.checksum().to_string().as_bytes());
        for stamp in &frame.hop_stamps {
            line.push(DELIMITER);
            line.extend_from_slice(stamp.ingress_ms.to_string().as_bytes());
            line.push(DELIMITER);
            line.extend_from_slice(stamp.egress_ms.to_string().as_bytes());
        }
        line.push(b'\n');
        Ok(line)
    }

    fn extract(&self, buf: &[u8]) -> Extracted {
        let Some(terminator) = buf.iter().position(|&b| b == b'\n') else {
            return Extracted::Incomplete;
        };
        let consumed = terminator + 1;

        let mut line = &buf[..terminator];
        if line.ends_with(b"\r") {
            line = &line[..line.len() - 1];
        }
        if line.is_empty() || line.starts_with(STATUS_PREFIX) {
            return Extracted::Skip { consumed };
        }

        match parse_line(line) {
            Ok(frame) => Extracted::Frame { frame, consumed },
            Err(error) => Extracted::Malformed { error, consumed },
        }
    }
}

fn parse_line(line: &[u8]) -> std::result::Result<Frame, DecodeError> {
    let fields: Vec<&[u8]> = line.split(|&b| b == DELIMITER).collect();
    if fields.len() < 4 || (fields.len() - 4) % 2 != 0 {
        return Err(DecodeError::FieldCount { count: fields.len() });
    }
    let hop_pairs = (fields.len() - 4) / 2;
    if hop_pairs > MAX_HOPS {
        return Err(DecodeError::TooManyHops { count: hop_pairs });
    }

    let sequence = parse_u32(fields[0], "sequence")?;
    let origin_ms = parse_u32(fields[1], "timestamp")?;

    let payload = fields[2];
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(DecodeError::PayloadTooLong { len: payload.len() });
    }
    let carried = parse_u16(fields[3], "checksum")?;

    let mut frame = Frame::new(sequence, origin_ms, payload.to_vec());
    for pair in 0..hop_pairs {
        let ingress_ms = parse_u32(fields[4 + pair * 2], "ingress")?;
        let egress_ms = parse_u32(fields[5 + pair * 2], "egress")?;
        frame.push_hop(ingress_ms, egress_ms);
    }

    let computed = payload_checksum(payload);
    if carried != computed {
        return Err(DecodeError::ChecksumMismatch { carried, computed });
    }
    Ok(frame)
}

fn parse_u32(bytes: &[u8], field: &'static str) -> std::result::Result<u32, DecodeError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| DecodeError::NonNumeric { field, value: lossy(bytes) })
}

fn parse_u16(bytes: &[u8], field: &'static str) -> std::result::Result<u16, DecodeError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| DecodeError::NonNumeric { field, value: lossy(bytes) })
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
