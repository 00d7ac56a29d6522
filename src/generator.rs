//! Frame generation at a fixed cadence.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::clock::{Cadence, ClockSource};
use crate::codec::FrameCodec;
use crate::config::GeneratorConfig;
use crate::link::Link;
use crate::stream::PaceExt;
use crate::types::Frame;

/// Cumulative generator counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorStats {
    /// Frames successfully written to the egress link.
    pub sent: u64,

    /// Egress writes that failed; the frame is dropped, never retried.
    pub send_failures: u64,

    /// Frames the wire profile refused to encode.
    pub rejected: u64,
}

/// Produces a deterministic-cadence stream of sequenced, timestamped frames.
///
/// The sequence counter starts at 0, increments by 1 per frame, and is not
/// persisted — a restarted generator starts over at 0. Payloads come from an
/// application-supplied stream, or from a pseudo-random alphanumeric source
/// seeded once at construction.
pub struct FrameGenerator {
    config: GeneratorConfig,
    codec: Arc<dyn FrameCodec>,
    clock: Arc<dyn ClockSource>,
    rng: SmallRng,
    sequence: u32,
    stats: GeneratorStats,
}

impl FrameGenerator {
    pub fn new(config: GeneratorConfig, clock: Arc<dyn ClockSource>) -> Self {
        let codec = config.codec.build();
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Self { config, codec, clock, rng, sequence: 0, stats: GeneratorStats::default() }
    }

    /// Counters so far.
    pub fn stats(&self) -> GeneratorStats {
        self.stats
    }

    /// Build the next frame with a generated payload.
    pub fn next_frame(&mut self) -> Frame {
        let payload = self.random_payload();
        self.build_frame(payload)
    }

    fn build_frame(&mut self, payload: Vec<u8>) -> Frame {
        let frame = Frame::new(self.sequence, self.clock.now_ms(), payload);
        self.sequence = self.sequence.wrapping_add(1);
        frame
    }

    fn random_payload(&mut self) -> Vec<u8> {
        (&mut self.rng).sample_iter(rand::distr::Alphanumeric).take(self.config.payload_len).collect()
    }

    async fn emit<L: Link>(&mut self, egress: &mut L, frame: Frame) {
        let sequence = frame.sequence;
        let wire = match self.codec.encode(&frame) {
            Ok(wire) => wire,
            Err(error) => {
                self.stats.rejected += 1;
                warn!("frame {sequence} rejected by codec: {error}");
                return;
            }
        };
        match egress.send(&wire).await {
            Ok(()) => {
                self.stats.sent += 1;
                trace!("sent frame {sequence} ({} bytes)", wire.len());
            }
            Err(error) => {
                // Best-effort-at-most-once: count it and move to the next tick.
                self.stats.send_failures += 1;
                warn!("egress unavailable for frame {sequence}: {error}");
            }
        }
    }

    /// Run with generated payloads until cancelled.
    ///
    /// One frame per cadence deadline; a slow egress write delays emission
    /// but the deadline schedule itself never drifts.
    pub async fn run<L: Link>(mut self, mut egress: L, cancel: CancellationToken) -> GeneratorStats {
        info!("generator started ({} ms cadence)", self.config.send_interval_ms);
        let mut cadence = Cadence::new(self.config.send_interval());

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("generator cancelled");
                    break;
                }
                _ = cadence.wait() => {
                    let frame = self.next_frame();
                    self.emit(&mut egress, frame).await;
                }
            }
        }

        info!("generator ended after {} frames", self.stats.sent);
        self.stats
    }

    /// Run with application-supplied payloads until the source ends or the
    /// token is cancelled.
    ///
    /// Payloads are paced to the send cadence with latest-wins semantics: a
    /// source faster than the cadence has stale readings replaced, never
    /// queued.
    pub async fn run_with_payloads<S, L>(
        mut self,
        payloads: S,
        mut egress: L,
        cancel: CancellationToken,
    ) -> GeneratorStats
    where
        S: Stream<Item = Vec<u8>> + Send,
        L: Link,
    {
        info!("generator started ({} ms cadence, external payloads)", self.config.send_interval_ms);
        let paced = payloads.pace(self.config.send_interval());
        tokio::pin!(paced);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("generator cancelled");
                    break;
                }
                item = paced.next() => match item {
                    Some(payload) => {
                        let frame = self.build_frame(payload);
                        self.emit(&mut egress, frame).await;
                    }
                    None => {
                        debug!("payload source ended");
                        break;
                    }
                }
            }
        }

        info!("generator ended after {} frames", self.stats.sent);
        self.stats
    }
}
