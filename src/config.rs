//! Node construction options.
//!
//! Everything tunable lives here as named options with the defaults observed
//! on real deployments: 100 ms send cadence for the high-rate packet
//! profile, 8-byte payloads, 5 s status reporting, `0xAA 0x55` sync. Configs
//! are plain serde structs and can be loaded from YAML.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::codec::{BinaryCodec, DEFAULT_SYNC, FrameCodec, TextCodec};
use crate::error::{RelayError, Result};

/// Which wire representation a node speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireProfile {
    /// Pipe-delimited decimal ASCII lines.
    Text,
    /// Sync-pattern framed little-endian fields.
    Binary,
}

/// Codec selection and its profile-specific options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub profile: WireProfile,

    /// Sync pattern bytes, binary profile only.
    pub sync: [u8; 2],

    /// Whether the binary profile carries a checksum field. The text profile
    /// always does.
    pub checksum: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self { profile: WireProfile::Text, sync: DEFAULT_SYNC, checksum: true }
    }
}

impl CodecConfig {
    /// Build the configured codec.
    pub fn build(&self) -> Arc<dyn FrameCodec> {
        match self.profile {
            WireProfile::Text => Arc::new(TextCodec::new()),
            WireProfile::Binary => {
                Arc::new(BinaryCodec::new().with_sync(self.sync).with_checksum(self.checksum))
            }
        }
    }
}

/// Options for a frame generator node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Send cadence in milliseconds.
    pub send_interval_ms: u64,

    /// Length of generated pseudo-random payloads, in bytes.
    pub payload_len: usize,

    /// Fixed RNG seed; OS entropy when absent.
    pub seed: Option<u64>,

    pub codec: CodecConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self { send_interval_ms: 100, payload_len: 8, seed: None, codec: CodecConfig::default() }
    }
}

impl GeneratorConfig {
    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }

    /// Parse a config from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml)
            .map_err(|e| RelayError::config_error("generator config", e.to_string()))
    }
}

/// Options for a relay node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Status reporting cadence in milliseconds.
    pub report_interval_ms: u64,

    /// Also write `STATUS|` lines to the egress link, as the terminal hop of
    /// a chain does for its collector. Off by default: mid-chain status is
    /// noise for downstream decoders.
    pub status_on_egress: bool,

    pub codec: CodecConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { report_interval_ms: 5000, status_on_egress: false, codec: CodecConfig::default() }
    }
}

impl RelayConfig {
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    /// Parse a config from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml)
            .map_err(|e| RelayError::config_error("relay config", e.to_string()))
    }
}
