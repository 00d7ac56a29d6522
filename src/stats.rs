//! Per-node relay counters and the periodic status line.

/// Prefix marking a status report line on a text link.
///
/// Codecs treat units starting with this prefix as control units and skip
/// them, so mid-chain status reports never count as malformed frames.
pub const STATUS_PREFIX: &[u8] = b"STATUS|";

/// Rolling per-node counters, cumulative for the node's lifetime.
///
/// Mutated on every receive/forward decision, reported periodically, never
/// reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Complete units recognized on ingress, valid or not.
    pub received: u64,

    /// Frames successfully written to the egress link.
    pub forwarded: u64,

    /// Units dropped for structural or checksum failure.
    pub dropped_malformed: u64,

    /// Frames dropped for any other reason — egress send failure or a frame
    /// the egress profile cannot represent.
    pub dropped_other: u64,
}

impl LinkStats {
    /// Render the periodic report line: `STATUS|RX:<received>|TX:<forwarded>`.
    pub fn status_line(&self) -> String {
        format!("STATUS|RX:{}|TX:{}", self.received, self.forwarded)
    }

    /// Total frames dropped for any reason.
    pub fn dropped(&self) -> u64 {
        self.dropped_malformed + self.dropped_other
    }
}
