//! Relay node: decode on ingress, stamp, re-encode, forward.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval_at};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::clock::ClockSource;
use crate::codec::{Extracted, FrameCodec, MAX_UNIT_LEN};
use crate::config::RelayConfig;
use crate::error::{DecodeError, Result};
use crate::link::Link;
use crate::stats::LinkStats;
use crate::types::Frame;

/// Forwards frames from an ingress link to an egress link, appending one
/// hop-stamp pair per frame from this node's own clock.
///
/// The relay owns its accumulation buffer exclusively: it is idle when the
/// buffer is empty and accumulating while a partial unit is buffered. Frames
/// are forwarded in the order their terminating boundary is recognized.
/// A malformed unit is counted and dropped, never fatal; an unavailable
/// egress link is counted and the frame is not retried.
pub struct RelayNode {
    config: RelayConfig,
    codec: Arc<dyn FrameCodec>,
    clock: Arc<dyn ClockSource>,
    buf: Vec<u8>,
    stats: LinkStats,
    stats_tx: watch::Sender<LinkStats>,
}

impl RelayNode {
    pub fn new(config: RelayConfig, clock: Arc<dyn ClockSource>) -> Self {
        let codec = config.codec.build();
        let (stats_tx, _) = watch::channel(LinkStats::default());
        Self { config, codec, clock, buf: Vec::new(), stats: LinkStats::default(), stats_tx }
    }

    /// Counters so far.
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Subscribe to stats snapshots, published once per reporting tick and
    /// once at shutdown.
    pub fn stats_updates(&self) -> watch::Receiver<LinkStats> {
        self.stats_tx.subscribe()
    }

    /// Stats snapshots as a stream.
    pub fn stats_stream(&self) -> WatchStream<LinkStats> {
        WatchStream::new(self.stats_tx.subscribe())
    }

    /// Consume one chunk of ingress bytes; returns decoded frames paired
    /// with the clock reading taken when each complete unit was recognized.
    ///
    /// The ingress stamp is captured here, before any re-encoding or egress
    /// work, to keep forwarding jitter out of the latency measurement.
    fn ingest(&mut self, bytes: &[u8]) -> Vec<(Frame, u32)> {
        self.buf.extend_from_slice(bytes);
        let mut ready = Vec::new();

        loop {
            match self.codec.extract(&self.buf) {
                Extracted::Frame { frame, consumed } => {
                    let ingress_ms = self.clock.now_ms();
                    self.stats.received += 1;
                    self.buf.drain(..consumed);
                    ready.push((frame, ingress_ms));
                }
                Extracted::Malformed { error, consumed } => {
                    self.stats.received += 1;
                    self.stats.dropped_malformed += 1;
                    warn!("malformed unit dropped: {error}");
                    self.buf.drain(..consumed);
                }
                Extracted::Skip { consumed } => {
                    trace!("skipped {consumed} non-frame bytes");
                    self.buf.drain(..consumed);
                }
                Extracted::Incomplete => {
                    if self.buf.len() > MAX_UNIT_LEN {
                        let error = DecodeError::OversizedUnit { len: self.buf.len() };
                        warn!("discarding buffer: {error}");
                        self.stats.dropped_malformed += 1;
                        self.buf.clear();
                    }
                    break;
                }
            }
        }
        ready
    }

    /// Stamp the egress time and produce the wire bytes for forwarding.
    fn seal(&mut self, mut frame: Frame, ingress_ms: u32) -> Result<Vec<u8>> {
        let egress_ms = self.clock.now_ms();
        frame.push_hop(ingress_ms, egress_ms);
        self.codec.encode(&frame)
    }

    async fn relay_chunk<E: Link>(&mut self, bytes: &[u8], egress: &mut E) {
        for (frame, ingress_ms) in self.ingest(bytes) {
            let sequence = frame.sequence;
            match self.seal(frame, ingress_ms) {
                Ok(wire) => match egress.send(&wire).await {
                    Ok(()) => {
                        self.stats.forwarded += 1;
                        trace!("forwarded frame {sequence}");
                    }
                    Err(error) => {
                        self.stats.dropped_other += 1;
                        warn!("egress unavailable for frame {sequence}: {error}");
                    }
                },
                Err(error) => {
                    self.stats.dropped_other += 1;
                    warn!("frame {sequence} not representable on egress: {error}");
                }
            }
        }
    }

    async fn report<E: Link>(&mut self, egress: &mut E) {
        let line = self.stats.status_line();
        info!("{line}");
        let _ = self.stats_tx.send(self.stats);

        if self.config.status_on_egress {
            let mut wire = line.into_bytes();
            wire.push(b'\n');
            if let Err(error) = egress.send(&wire).await {
                debug!("status line not delivered: {error}");
            }
        }
    }

    /// Run until the ingress link closes or the token is cancelled.
    ///
    /// One cooperative loop multiplexes the two concerns — ingress chunks
    /// and the reporting timer — so status reporting never blocks frame
    /// relay and neither starves the other.
    pub async fn run<I, E>(mut self, mut ingress: I, mut egress: E, cancel: CancellationToken) -> LinkStats
    where
        I: Link,
        E: Link,
    {
        info!("relay started ({} ms reporting)", self.config.report_interval_ms);
        let period = self.config.report_interval();
        let mut report = interval_at(tokio::time::Instant::now() + period, period);
        report.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("relay cancelled");
                    break;
                }
                chunk = ingress.recv() => match chunk {
                    Some(bytes) => self.relay_chunk(&bytes, &mut egress).await,
                    None => {
                        info!("ingress link closed");
                        break;
                    }
                },
                _ = report.tick() => self.report(&mut egress).await,
            }
        }

        let _ = self.stats_tx.send(self.stats);
        info!("relay ended: {}", self.stats.status_line());
        self.stats
    }
}
