//! Multi-hop telemetry frame relay with per-hop latency accounting.
//!
//! Hopwire moves sequenced, timestamped, checksummed frames across a chain
//! of links between clock-unsynchronized nodes, so a downstream collector
//! can reconstruct per-hop latency, detect loss, and flag corruption.
//!
//! # Features
//!
//! - **Two wire profiles**: pipe-delimited text lines and sync-pattern
//!   framed binary, both resynchronizing past garbage
//! - **Hop stamping**: each relay appends its own ingress/egress timestamp
//!   pair; stamps are append-only and never rewritten
//! - **Honest clocks**: per-node [`ClockSource`] injection; cross-node
//!   deltas are only computed under an explicit [`ClockDomains`] policy
//! - **Drop, count, continue**: malformed frames and dead links are counted,
//!   never fatal, never retried
//!
//! # Example
//!
//! A single-process chain — generator, one relay, analyzer:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hopwire::{
//!     ChannelLink, ClockDomains, FrameGenerator, GeneratorConfig, LatencyAnalyzer,
//!     MonotonicClock, RelayConfig, RelayNode,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let clock = Arc::new(MonotonicClock::new());
//!     let cancel = CancellationToken::new();
//!
//!     let (generator_out, relay_in) = ChannelLink::pair(64);
//!     let (relay_out, sink_in) = ChannelLink::pair(64);
//!
//!     let generator = FrameGenerator::new(GeneratorConfig::default(), clock.clone());
//!     let relay = RelayNode::new(RelayConfig::default(), clock.clone());
//!     let mut analyzer =
//!         LatencyAnalyzer::new(RelayConfig::default().codec.build(), ClockDomains::Shared);
//!
//!     tokio::spawn(generator.run(generator_out, cancel.clone()));
//!     tokio::spawn(relay.run(relay_in, relay_out, cancel.clone()));
//!     let reports = analyzer.run(sink_in, cancel.clone()).await;
//!     println!("{} frames analyzed", reports.len());
//! }
//! ```

// Core protocol
pub mod codec;
mod error;
pub mod stats;
pub mod types;

// Node roles
pub mod analyzer;
pub mod generator;
pub mod relay;

// Capabilities and plumbing
pub mod clock;
pub mod config;
pub mod link;
pub mod stream;

#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;

// Core exports
pub use codec::{BinaryCodec, Extracted, FrameCodec, TextCodec, payload_checksum};
pub use error::*;
pub use stats::{LinkStats, STATUS_PREFIX};
pub use types::*;

// Node role exports
pub use analyzer::{
    AnalyzerStats, AnalyzerSummary, ClockDomains, FrameReport, HopSummary, LatencyAnalyzer,
};
pub use generator::{FrameGenerator, GeneratorStats};
pub use relay::RelayNode;

// Capability exports
pub use clock::{Cadence, ClockSource, MonotonicClock, delta_ms};
pub use config::{CodecConfig, GeneratorConfig, RelayConfig, WireProfile};
pub use link::{ChannelLink, Link};
pub use stream::PaceExt;
