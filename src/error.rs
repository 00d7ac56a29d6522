//! Error types for frame relay processing.
//!
//! Two families of failure exist in this crate and they deliberately do not
//! mix:
//!
//! - [`DecodeError`] — a malformed wire unit. This is an expected, recoverable
//!   condition: receivers count it, drop the unit, and keep going. It never
//!   crosses the decode boundary as a process-level failure.
//! - [`RelayError`] — operational failures around the protocol: an egress
//!   link that cannot accept a write, a payload that cannot be represented in
//!   the selected wire profile, or invalid configuration.
//!
//! No error in this crate is fatal to a node loop; the protocol prioritizes
//! continued operation over strict delivery guarantees.

use thiserror::Error;

use crate::types::{MAX_HOPS, MAX_PAYLOAD_LEN};

/// Result type alias for relay operations.
pub type Result<T, E = RelayError> = std::result::Result<T, E>;

/// Operational error type for relay nodes and links.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RelayError {
    #[error("link unavailable: {reason}")]
    LinkUnavailable {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("payload rejected: {details}")]
    Payload { details: String },

    #[error("config error in {context}: {details}")]
    Config { context: String, details: String },
}

impl RelayError {
    /// Whether the node loop should keep running after this error.
    ///
    /// A down egress link is expected on radio profiles and the relay keeps
    /// polling; bad payloads and bad configuration are caller mistakes.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RelayError::LinkUnavailable { .. } => true,
            RelayError::Payload { .. } => false,
            RelayError::Config { .. } => false,
        }
    }

    /// Helper constructor for egress send failures.
    pub fn link_unavailable(reason: impl Into<String>) -> Self {
        RelayError::LinkUnavailable { reason: reason.into(), source: None }
    }

    /// Helper constructor for egress send failures with a transport source.
    pub fn link_unavailable_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        RelayError::LinkUnavailable { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for payloads the wire profile cannot carry.
    pub fn payload_rejected(details: impl Into<String>) -> Self {
        RelayError::Payload { details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        RelayError::Config { context: context.into(), details: details.into() }
    }
}

/// Why a wire unit failed validation.
///
/// Produced by [`FrameCodec`](crate::codec::FrameCodec) implementations.
/// Callers count these and continue — a malformed unit is dropped, never
/// repaired and never retransmitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("wrong field count: {count} fields cannot form a frame")]
    FieldCount { count: usize },

    #[error("non-numeric {field} field: {value:?}")]
    NonNumeric { field: &'static str, value: String },

    #[error("checksum mismatch: frame carries {carried:#06x}, payload sums to {computed:#06x}")]
    ChecksumMismatch { carried: u16, computed: u16 },

    #[error("payload length {len} exceeds the {MAX_PAYLOAD_LEN}-byte limit")]
    PayloadTooLong { len: usize },

    #[error("hop stamp count {count} exceeds the {MAX_HOPS}-hop limit")]
    TooManyHops { count: usize },

    #[error("truncated frame: {context}")]
    Truncated { context: &'static str },

    #[error("unit of {len} bytes exceeds the maximum frame size")]
    OversizedUnit { len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_constructors_produce_expected_variants() {
        let link = RelayError::link_unavailable("peer not reachable");
        assert!(matches!(link, RelayError::LinkUnavailable { .. }));

        let payload = RelayError::payload_rejected("embedded delimiter");
        assert!(matches!(payload, RelayError::Payload { .. }));

        let config = RelayError::config_error("relay", "zero report interval");
        assert!(matches!(config, RelayError::Config { .. }));
    }

    #[test]
    fn recoverability_classification() {
        assert!(RelayError::link_unavailable("radio peer lost").is_recoverable());
        assert!(!RelayError::payload_rejected("too long").is_recoverable());
        assert!(!RelayError::config_error("codec", "bad sync").is_recoverable());
    }

    #[test]
    fn error_traits() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<RelayError>();
        assert_send_sync_static::<DecodeError>();

        let error = RelayError::link_unavailable("test");
        let _: &dyn std::error::Error = &error;
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn messages_carry_their_context(reason in ".*", details in ".*") {
                let link = RelayError::link_unavailable(reason.clone());
                prop_assert!(link.to_string().contains(&reason));

                let payload = RelayError::payload_rejected(details.clone());
                prop_assert!(payload.to_string().contains(&details));
            }

            #[test]
            fn checksum_mismatch_displays_both_values(carried in any::<u16>(), computed in any::<u16>()) {
                let error = DecodeError::ChecksumMismatch { carried, computed };
                let message = error.to_string();
                let carried_hex = format!("{:#06x}", carried);
                let computed_hex = format!("{:#06x}", computed);
                prop_assert!(message.contains(&carried_hex));
                prop_assert!(message.contains(&computed_hex));
            }
        }
    }
}
