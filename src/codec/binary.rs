//! Binary-framed wire profile.
//!
//! Layout, all multi-byte fields little-endian:
//!
//! ```text
//! [sync0][sync1][seq:u32][origin:u32][hop_count:u8]
//! ([hop:u8][ingress:u32][egress:u32]) * hop_count
//! [payload_len:u8][payload...]([checksum:u16])
//! ```
//!
//! There is no terminator — the length is implicit from the counts. The
//! checksum field is optional and must be explicitly enabled or disabled;
//! minimal fixed-rate sampling links run without it. A decoder that loses
//! the frame boundary scans forward for the next sync occurrence.

use super::checksum::payload_checksum;
use super::{Extracted, FrameCodec};
use crate::error::{DecodeError, RelayError, Result};
use crate::types::{Frame, MAX_HOPS, MAX_PAYLOAD_LEN};

/// Default sync pattern preceding every binary frame.
pub const DEFAULT_SYNC: [u8; 2] = [0xAA, 0x55];

// sync(2) + seq(4) + origin(4) + hop_count(1)
const HEADER_LEN: usize = 11;
const STAMP_LEN: usize = 9;

/// Codec for the sync-pattern binary profile.
#[derive(Debug, Clone, Copy)]
pub struct BinaryCodec {
    sync: [u8; 2],
    checksum_enabled: bool,
}

impl Default for BinaryCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryCodec {
    /// Default profile: `0xAA 0x55` sync, checksum enabled.
    pub fn new() -> Self {
        Self { sync: DEFAULT_SYNC, checksum_enabled: true }
    }

    /// Replace the sync pattern.
    pub fn with_sync(mut self, sync: [u8; 2]) -> Self {
        self.sync = sync;
        self
    }

    /// Enable or disable the trailing checksum field.
    pub fn with_checksum(mut self, enabled: bool) -> Self {
        self.checksum_enabled = enabled;
        self
    }

    fn frame_len(&self, hop_count: usize, payload_len: usize) -> usize {
        HEADER_LEN
            + hop_count * STAMP_LEN
            + 1
            + payload_len
            + if self.checksum_enabled { 2 } else { 0 }
    }

    fn find_sync(&self, buf: &[u8]) -> Option<usize> {
        buf.windows(2).position(|window| window == self.sync)
    }
}

impl FrameCodec for BinaryCodec {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>> {
        if frame.payload.len() > MAX_PAYLOAD_LEN {
            return Err(RelayError::payload_rejected(format!(
                "payload of {} bytes exceeds the {MAX_PAYLOAD_LEN}-byte limit",
                frame.payload.len()
            )));
        }
        if frame.hops() > MAX_HOPS {
            return Err(RelayError::payload_rejected(format!(
                "frame carries {} hop stamps, limit is {MAX_HOPS}",
                frame.hops()
            )));
        }

        let mut wire = Vec::with_capacity(self.frame_len(frame.hops(), frame.payload.len()));
        wire.extend_from_slice(&self.sync);
        wire.extend_from_slice(&frame.sequence.to_le_bytes());
        wire.extend_from_slice(&frame.origin_ms.to_le_bytes());
        wire.push(frame.hops() as u8);
        for stamp in &frame.hop_stamps {
            wire.push(stamp.hop);
            wire.extend_from_slice(&stamp.ingress_ms.to_le_bytes());
            wire.extend_from_slice(&stamp.egress_ms.to_le_bytes());
        }
        wire.push(frame.payload.len() as u8);
        wire.extend_from_slice(&frame.payload);
        if self.checksum_enabled {
            wire.extend_from_slice(&frame.checksum().to_le_bytes());
        }
        Ok(wire)
    }

    fn extract(&self, buf: &[u8]) -> Extracted {
        let Some(start) = self.find_sync(buf) else {
            // Nothing here can begin a frame, except possibly a trailing
            // first sync byte still waiting for its partner.
            let keep = usize::from(buf.last() == Some(&self.sync[0]));
            return match buf.len().saturating_sub(keep) {
                0 => Extracted::Incomplete,
                consumed => Extracted::Skip { consumed },
            };
        };
        if start > 0 {
            return Extracted::Skip { consumed: start };
        }

        if buf.len() < HEADER_LEN {
            return Extracted::Incomplete;
        }
        let hop_count = buf[10] as usize;
        if hop_count > MAX_HOPS {
            // Skip this sync pattern and rescan from behind it.
            return Extracted::Malformed {
                error: DecodeError::TooManyHops { count: hop_count },
                consumed: 2,
            };
        }

        let payload_len_at = HEADER_LEN + hop_count * STAMP_LEN;
        if buf.len() <= payload_len_at {
            return Extracted::Incomplete;
        }
        let payload_len = buf[payload_len_at] as usize;
        if payload_len > MAX_PAYLOAD_LEN {
            return Extracted::Malformed {
                error: DecodeError::PayloadTooLong { len: payload_len },
                consumed: 2,
            };
        }

        let total = self.frame_len(hop_count, payload_len);
        if buf.len() < total {
            return Extracted::Incomplete;
        }

        let mut frame =
            Frame::new(read_u32_le(buf, 2), read_u32_le(buf, 6), Vec::with_capacity(payload_len));
        for stamp in 0..hop_count {
            let at = HEADER_LEN + stamp * STAMP_LEN;
            frame.push_hop(read_u32_le(buf, at + 1), read_u32_le(buf, at + 5));
        }
        frame.payload.extend_from_slice(&buf[payload_len_at + 1..payload_len_at + 1 + payload_len]);

        if self.checksum_enabled {
            let carried = read_u16_le(buf, total - 2);
            let computed = payload_checksum(&frame.payload);
            if carried != computed {
                return Extracted::Malformed {
                    error: DecodeError::ChecksumMismatch { carried, computed },
                    consumed: total,
                };
            }
        }
        Extracted::Frame { frame, consumed: total }
    }
}

fn read_u32_le(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn read_u16_le(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_layout_is_stable() {
        let frame = Frame::new(1, 2, b"AB".to_vec());
        let wire = BinaryCodec::new().encode(&frame).unwrap();
        assert_eq!(
            wire,
            [
                0xAA, 0x55, // sync
                1, 0, 0, 0, // sequence
                2, 0, 0, 0, // origin
                0,    // hop count
                2,    // payload length
                b'A', b'B', // payload
                0x83, 0x00, // checksum: 65 + 66
            ]
        );
    }

    #[test]
    fn checksum_field_is_absent_when_disabled() {
        let codec = BinaryCodec::new().with_checksum(false);
        let frame = Frame::new(1, 2, b"AB".to_vec());
        let wire = codec.encode(&frame).unwrap();
        assert_eq!(wire.len(), HEADER_LEN + 1 + 2);
        assert_eq!(codec.decode(&wire).unwrap(), frame);
    }

    #[test]
    fn custom_sync_pattern_round_trips() {
        let codec = BinaryCodec::new().with_sync([0x5A, 0xA5]);
        let mut frame = Frame::new(9, 10, b"XYZ".to_vec());
        frame.push_hop(11, 12);
        let wire = codec.encode(&frame).unwrap();
        assert_eq!(wire[..2], [0x5A, 0xA5]);
        assert_eq!(codec.decode(&wire).unwrap(), frame);
    }

    #[test]
    fn garbage_before_sync_is_skipped_silently() {
        let codec = BinaryCodec::new();
        let frame = Frame::new(4, 5, b"OK".to_vec());
        let mut buf = vec![0x00, 0x11, 0x22];
        buf.extend_from_slice(&codec.encode(&frame).unwrap());

        assert_eq!(codec.extract(&buf), Extracted::Skip { consumed: 3 });
        assert!(matches!(codec.extract(&buf[3..]), Extracted::Frame { .. }));
    }

    #[test]
    fn syncless_garbage_is_discarded_keeping_a_trailing_half_sync() {
        let codec = BinaryCodec::new();
        assert_eq!(codec.extract(&[0x01, 0x02, 0x03]), Extracted::Skip { consumed: 3 });
        // Last byte might be the first half of a split sync pattern.
        assert_eq!(codec.extract(&[0x01, 0x02, 0xAA]), Extracted::Skip { consumed: 2 });
        assert_eq!(codec.extract(&[0xAA]), Extracted::Incomplete);
    }

    #[test]
    fn corrupted_payload_fails_checksum_and_consumes_the_unit() {
        let codec = BinaryCodec::new();
        let frame = Frame::new(4, 5, b"GOOD".to_vec());
        let mut wire = codec.encode(&frame).unwrap();
        let payload_at = HEADER_LEN + 1;
        wire[payload_at] ^= 0x01;

        match codec.extract(&wire) {
            Extracted::Malformed { error: DecodeError::ChecksumMismatch { .. }, consumed } => {
                assert_eq!(consumed, wire.len());
            }
            other => panic!("expected checksum mismatch, got {other:?}"),
        }
    }

    #[test]
    fn absurd_counts_resync_past_the_sync_pattern() {
        let codec = BinaryCodec::new();
        let mut buf = vec![0xAA, 0x55];
        buf.extend_from_slice(&[0u8; 8]);
        buf.push(200); // hop count far over the limit
        buf.extend_from_slice(&[0u8; 16]);

        match codec.extract(&buf) {
            Extracted::Malformed { error: DecodeError::TooManyHops { count: 200 }, consumed } => {
                assert_eq!(consumed, 2);
            }
            other => panic!("expected hop bound failure, got {other:?}"),
        }
    }

    #[test]
    fn split_delivery_is_incomplete_until_whole() {
        let codec = BinaryCodec::new();
        let frame = Frame::new(77, 88, b"SPLIT".to_vec());
        let wire = codec.encode(&frame).unwrap();

        for cut in 1..wire.len() {
            match codec.extract(&wire[..cut]) {
                Extracted::Incomplete => {}
                other => panic!("prefix of {cut} bytes should be incomplete, got {other:?}"),
            }
        }
        assert!(matches!(codec.extract(&wire), Extracted::Frame { .. }));
    }
}
