//! Latency and loss analysis at the terminal sink.
//!
//! The analyzer consumes the wire stream emitted by the last relay (or
//! directly by a generator) and reconstructs what the chain did to each
//! frame: per-hop residence time, forwarding gaps between hops, sequence
//! gaps (loss), and checksum failures (corruption).
//!
//! Timestamps from different nodes live in different clock domains. Per-hop
//! latency (`egress − ingress` of the same stamp) is always meaningful;
//! anything spanning two nodes is only computed when a [`ClockDomains`]
//! policy says the two clocks are comparable, and is reported as `None` —
//! cross-domain, unmeasurable — otherwise.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::clock::delta_ms;
use crate::codec::{Extracted, FrameCodec, MAX_UNIT_LEN};
use crate::error::DecodeError;
use crate::link::Link;
use crate::types::Frame;

/// Which nodes of the chain share a clock.
///
/// Positions are chain positions: 0 is the generator, position `i + 1` is
/// the relay that appended hop stamp `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockDomains {
    /// Every node has its own clock — the honest default for independent
    /// microcontrollers. Cross-node deltas are unmeasurable.
    Distinct,

    /// All nodes read one clock, as in a single-process simulation.
    Shared,

    /// Explicit domain id per chain position.
    Explicit(Vec<u16>),
}

impl ClockDomains {
    fn comparable(&self, a: usize, b: usize) -> bool {
        match self {
            ClockDomains::Distinct => a == b,
            ClockDomains::Shared => true,
            ClockDomains::Explicit(ids) => match (ids.get(a), ids.get(b)) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

/// What the chain did to one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    pub sequence: u32,

    /// Relay residence time per hop, `egress − ingress` of the same stamp.
    /// Same clock domain by construction, always valid.
    pub hop_latency_ms: Vec<u32>,

    /// Link forwarding time between consecutive hops,
    /// `ingress[i + 1] − egress[i]`; `None` when the two relays do not share
    /// a clock domain.
    pub inter_hop_ms: Vec<Option<u32>>,

    /// `ingress[0] − origin`; `None` when the generator and first relay do
    /// not share a clock domain.
    pub origin_to_first_hop_ms: Option<u32>,

    /// `egress[last] − origin`; `None` without a shared clock domain.
    pub end_to_end_ms: Option<u32>,
}

/// Cumulative analyzer counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzerStats {
    /// Valid frames observed.
    pub received: u64,

    /// Frames implied missing by sequence gaps; each gap counted once.
    pub lost: u64,

    /// Units dropped for a checksum mismatch — corruption in flight.
    pub checksum_failures: u64,

    /// Units dropped for structural failure other than the checksum.
    pub malformed: u64,

    /// Frames whose sequence did not advance — duplicates or reordering.
    pub out_of_order: u64,
}

impl AnalyzerStats {
    /// Percentage of expected frames that never arrived.
    pub fn loss_rate(&self) -> f64 {
        let expected = self.received + self.lost;
        if expected == 0 { 0.0 } else { self.lost as f64 * 100.0 / expected as f64 }
    }
}

/// Per-hop latency aggregate over all observed frames.
#[derive(Debug, Clone, Copy, Default)]
struct HopAggregate {
    frames: u64,
    latency_sum: u64,
    last_latency: Option<u32>,
    jitter_sum: u64,
    jitter_samples: u64,
}

/// Mean latency and jitter for one hop position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HopSummary {
    pub frames: u64,
    pub mean_latency_ms: f64,
    pub mean_jitter_ms: f64,
}

/// Analyzer summary over the whole session.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerSummary {
    pub stats: AnalyzerStats,
    pub loss_rate: f64,
    pub hops: Vec<HopSummary>,
}

/// Reconstructs loss, corruption, and latency from a relayed wire stream.
pub struct LatencyAnalyzer {
    codec: Arc<dyn FrameCodec>,
    domains: ClockDomains,
    buf: Vec<u8>,
    last_seq: Option<u32>,
    stats: AnalyzerStats,
    hops: Vec<HopAggregate>,
}

impl LatencyAnalyzer {
    pub fn new(codec: Arc<dyn FrameCodec>, domains: ClockDomains) -> Self {
        Self {
            codec,
            domains,
            buf: Vec::new(),
            last_seq: None,
            stats: AnalyzerStats::default(),
            hops: Vec::new(),
        }
    }

    /// Counters so far.
    pub fn stats(&self) -> AnalyzerStats {
        self.stats
    }

    /// Session summary with per-hop latency and jitter means.
    pub fn summary(&self) -> AnalyzerSummary {
        let hops = self
            .hops
            .iter()
            .map(|aggregate| HopSummary {
                frames: aggregate.frames,
                mean_latency_ms: if aggregate.frames == 0 {
                    0.0
                } else {
                    aggregate.latency_sum as f64 / aggregate.frames as f64
                },
                mean_jitter_ms: if aggregate.jitter_samples == 0 {
                    0.0
                } else {
                    aggregate.jitter_sum as f64 / aggregate.jitter_samples as f64
                },
            })
            .collect();
        AnalyzerSummary { stats: self.stats, loss_rate: self.stats.loss_rate(), hops }
    }

    /// Consume a chunk of the wire stream; returns one report per valid
    /// frame found in it.
    pub fn ingest(&mut self, bytes: &[u8]) -> Vec<FrameReport> {
        self.buf.extend_from_slice(bytes);
        let mut reports = Vec::new();

        loop {
            match self.codec.extract(&self.buf) {
                Extracted::Frame { frame, consumed } => {
                    self.buf.drain(..consumed);
                    reports.push(self.observe(&frame));
                }
                Extracted::Malformed { error, consumed } => {
                    match error {
                        DecodeError::ChecksumMismatch { .. } => {
                            self.stats.checksum_failures += 1;
                            warn!("corrupted frame dropped: {error}");
                        }
                        _ => {
                            self.stats.malformed += 1;
                            warn!("malformed unit dropped: {error}");
                        }
                    }
                    self.buf.drain(..consumed);
                }
                Extracted::Skip { consumed } => {
                    trace!("skipped {consumed} non-frame bytes");
                    self.buf.drain(..consumed);
                }
                Extracted::Incomplete => {
                    if self.buf.len() > MAX_UNIT_LEN {
                        warn!("discarding {} buffered bytes with no frame boundary", self.buf.len());
                        self.stats.malformed += 1;
                        self.buf.clear();
                    }
                    break;
                }
            }
        }
        reports
    }

    /// Consume a link until it closes or the token is cancelled.
    pub async fn run<L: Link>(
        &mut self,
        mut ingress: L,
        cancel: CancellationToken,
    ) -> Vec<FrameReport> {
        info!("analyzer started");
        let mut reports = Vec::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("analyzer cancelled");
                    break;
                }
                chunk = ingress.recv() => match chunk {
                    Some(bytes) => reports.extend(self.ingest(&bytes)),
                    None => {
                        info!("stream ended");
                        break;
                    }
                }
            }
        }

        let stats = self.stats;
        info!(
            "analyzer ended: {} received, {} lost ({:.2}%), {} corrupt",
            stats.received,
            stats.lost,
            stats.loss_rate(),
            stats.checksum_failures
        );
        reports
    }

    fn observe(&mut self, frame: &Frame) -> FrameReport {
        self.stats.received += 1;
        self.track_sequence(frame.sequence);

        if self.hops.len() < frame.hops() {
            self.hops.resize(frame.hops(), HopAggregate::default());
        }

        let mut hop_latency_ms = Vec::with_capacity(frame.hops());
        for (index, stamp) in frame.hop_stamps.iter().enumerate() {
            let latency = stamp.latency_ms();
            hop_latency_ms.push(latency);

            let aggregate = &mut self.hops[index];
            aggregate.frames += 1;
            aggregate.latency_sum += u64::from(latency);
            if let Some(previous) = aggregate.last_latency {
                aggregate.jitter_sum += u64::from(previous.abs_diff(latency));
                aggregate.jitter_samples += 1;
            }
            aggregate.last_latency = Some(latency);
        }

        let inter_hop_ms = frame
            .hop_stamps
            .windows(2)
            .enumerate()
            .map(|(index, pair)| {
                // Chain positions: relay i sits at position i + 1.
                self.domains
                    .comparable(index + 1, index + 2)
                    .then(|| delta_ms(pair[0].egress_ms, pair[1].ingress_ms))
            })
            .collect();

        let origin_to_first_hop_ms = frame
            .hop_stamps
            .first()
            .filter(|_| self.domains.comparable(0, 1))
            .map(|stamp| delta_ms(frame.origin_ms, stamp.ingress_ms));

        let end_to_end_ms = frame
            .hop_stamps
            .last()
            .filter(|_| self.domains.comparable(0, frame.hops()))
            .map(|stamp| delta_ms(frame.origin_ms, stamp.egress_ms));

        FrameReport {
            sequence: frame.sequence,
            hop_latency_ms,
            inter_hop_ms,
            origin_to_first_hop_ms,
            end_to_end_ms,
        }
    }

    fn track_sequence(&mut self, sequence: u32) {
        match self.last_seq {
            None => self.last_seq = Some(sequence),
            Some(last) if sequence > last => {
                let gap = sequence - last - 1;
                if gap > 0 {
                    self.stats.lost += u64::from(gap);
                    warn!("packet loss detected: {gap} frames missing after {last}");
                }
                self.last_seq = Some(sequence);
            }
            Some(_) => {
                // Duplicate or reordering; never negative loss.
                self.stats.out_of_order += 1;
                debug!("sequence {sequence} did not advance");
            }
        }
    }
}
