//! Core types for frame relay.

mod frame;

pub use frame::{Frame, HopStamp, MAX_HOPS, MAX_PAYLOAD_LEN};
