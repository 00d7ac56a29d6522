//! Wire codecs for telemetry frames.
//!
//! Two profiles are supported, matching the two framing styles seen on real
//! links:
//!
//! - [`TextCodec`] — pipe-delimited decimal ASCII fields, one frame per line.
//! - [`BinaryCodec`] — a 2-byte sync pattern followed by fixed-width
//!   little-endian fields, no terminator.
//!
//! Both implement [`FrameCodec`], which pairs `encode` with an incremental
//! [`extract`](FrameCodec::extract) that scans a receive buffer for the next
//! complete unit. Malformed units come back as values ([`DecodeError`]), so a
//! receiver can count them and resynchronize without ever aborting the
//! stream.

mod binary;
mod checksum;
mod text;

pub use binary::{BinaryCodec, DEFAULT_SYNC};
pub use checksum::payload_checksum;
pub use text::{DELIMITER, TextCodec};

use crate::error::{DecodeError, Result};
use crate::types::Frame;

/// Upper bound on bytes a receiver buffers while waiting for a frame
/// boundary. Past this, the buffer is discarded as one malformed unit.
pub const MAX_UNIT_LEN: usize = 4096;

/// Outcome of scanning a receive buffer for one wire unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// A complete, valid frame. `consumed` bytes are spent from the buffer.
    Frame { frame: Frame, consumed: usize },

    /// A complete unit was recognized but failed validation. `consumed`
    /// advances past it (or past the failed boundary) so the caller
    /// resynchronizes on the next call.
    Malformed { error: DecodeError, consumed: usize },

    /// Bytes that can never begin a frame — inter-frame garbage, empty
    /// lines, status lines. Discarded without counting as malformed.
    Skip { consumed: usize },

    /// No complete unit yet; keep the buffer and wait for more bytes.
    Incomplete,
}

/// Encode/decode a telemetry frame to and from its wire representation.
pub trait FrameCodec: Send + Sync {
    /// Produce the self-delimited wire representation of `frame`.
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>>;

    /// Scan `buf` from the front for the next complete wire unit.
    ///
    /// Implementations never consume bytes beyond the unit they report, so
    /// callers drain exactly `consumed` bytes and call again.
    fn extract(&self, buf: &[u8]) -> Extracted;

    /// Decode a single unit from `bytes`.
    ///
    /// Convenience over [`extract`](Self::extract) for callers holding one
    /// complete unit rather than a rolling buffer.
    fn decode(&self, bytes: &[u8]) -> std::result::Result<Frame, DecodeError> {
        match self.extract(bytes) {
            Extracted::Frame { frame, .. } => Ok(frame),
            Extracted::Malformed { error, .. } => Err(error),
            Extracted::Skip { .. } | Extracted::Incomplete => {
                Err(DecodeError::Truncated { context: "no complete frame unit in input" })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_frame;

    fn codecs() -> Vec<Box<dyn FrameCodec>> {
        vec![Box::new(TextCodec::new()), Box::new(BinaryCodec::new())]
    }

    #[test]
    fn round_trip_both_profiles() {
        for codec in codecs() {
            let frame = sample_frame(42, 123_456, b"TELEMETRY");
            let wire = codec.encode(&frame).unwrap();
            assert_eq!(codec.decode(&wire).unwrap(), frame);
        }
    }

    #[test]
    fn round_trip_with_hop_stamps() {
        for codec in codecs() {
            let mut frame = sample_frame(7, 900, b"HOPPED");
            frame.push_hop(1000, 1002);
            frame.push_hop(2000, 2001);

            let wire = codec.encode(&frame).unwrap();
            assert_eq!(codec.decode(&wire).unwrap(), frame);
        }
    }

    #[test]
    fn decode_of_incomplete_unit_is_truncated() {
        for codec in codecs() {
            let frame = sample_frame(1, 1, b"X");
            let wire = codec.encode(&frame).unwrap();
            let result = codec.decode(&wire[..wire.len() - 1]);
            assert!(result.is_err());
        }
    }

    mod property_tests {
        use super::*;
        use crate::types::Frame;
        use proptest::prelude::*;

        fn arbitrary_text_payload() -> impl Strategy<Value = Vec<u8>> {
            proptest::collection::vec(
                prop::sample::select(
                    (b'0'..=b'9').chain(b'A'..=b'Z').chain(b'a'..=b'z').collect::<Vec<u8>>(),
                ),
                0..=crate::types::MAX_PAYLOAD_LEN,
            )
        }

        proptest! {
            #[test]
            fn text_round_trip(
                sequence in any::<u32>(),
                origin in any::<u32>(),
                payload in arbitrary_text_payload(),
            ) {
                let codec = TextCodec::new();
                let frame = Frame::new(sequence, origin, payload);
                let wire = codec.encode(&frame).unwrap();
                prop_assert_eq!(codec.decode(&wire).unwrap(), frame);
            }

            #[test]
            fn binary_round_trip(
                sequence in any::<u32>(),
                origin in any::<u32>(),
                payload in proptest::collection::vec(any::<u8>(), 0..=crate::types::MAX_PAYLOAD_LEN),
            ) {
                let codec = BinaryCodec::new();
                let frame = Frame::new(sequence, origin, payload);
                let wire = codec.encode(&frame).unwrap();
                prop_assert_eq!(codec.decode(&wire).unwrap(), frame);
            }
        }
    }
}
