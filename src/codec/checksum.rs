//! Payload integrity checksum.

/// 16-bit unsigned sum of the payload bytes, modulo 65536.
///
/// Covers payload integrity only — sequence and timestamp fields are not
/// included. A pure sum is order-insensitive and collisions are possible;
/// this detects line noise, not adversaries.
pub fn payload_checksum(payload: &[u8]) -> u16 {
    payload.iter().fold(0u16, |sum, &byte| sum.wrapping_add(byte as u16))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reference_values() {
        assert_eq!(payload_checksum(b""), 0);
        assert_eq!(payload_checksum(b"ABC"), 198);
        // 300 * 0xFF spills past 16 bits and wraps.
        assert_eq!(payload_checksum(&[0xFF; 300]), (300u32 * 0xFF % 65536) as u16);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn deterministic(payload in proptest::collection::vec(any::<u8>(), 0..256)) {
                prop_assert_eq!(payload_checksum(&payload), payload_checksum(&payload));
            }

            #[test]
            fn order_insensitive(payload in proptest::collection::vec(any::<u8>(), 0..256)) {
                // A pure sum cannot see byte order: any permutation checksums
                // identically. Documented limitation, verified explicitly.
                let mut reversed = payload.clone();
                reversed.reverse();
                let mut sorted = payload.clone();
                sorted.sort_unstable();
                prop_assert_eq!(payload_checksum(&payload), payload_checksum(&reversed));
                prop_assert_eq!(payload_checksum(&payload), payload_checksum(&sorted));
            }

            #[test]
            fn single_byte_corruption_shifts_the_sum(
                payload in proptest::collection::vec(any::<u8>(), 1..64),
                index in any::<prop::sample::Index>(),
                delta in 1u8..=255,
            ) {
                // Changing one byte by a non-zero delta always changes a pure
                // modular sum (the delta lands directly in the accumulator).
                let index = index.index(payload.len());
                let mut corrupted = payload.clone();
                corrupted[index] = corrupted[index].wrapping_add(delta);
                prop_assert_ne!(payload_checksum(&payload), payload_checksum(&corrupted));
            }
        }
    }
}
