//! Probe tuning parameters.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Standard DNS port.
pub const DEFAULT_PORT: u16 = 53;

/// Per-query timeout in milliseconds; also the latency recorded for a timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Replies at or above this latency are counted as degraded.
pub const DEFAULT_LATENCY_THRESHOLD_MS: u64 = 500;

/// Pause between iterations in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 1_000;

/// EDNS payload size advertised on UDP queries.
pub const DEFAULT_EDNS_PAYLOAD: u16 = 1232;

/// Tuning parameters for a probe run.
///
/// Every field has a default, so a config file only needs to name the
/// values it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Destination port on the target server
    pub port: u16,
    /// Query timeout in milliseconds
    pub timeout_ms: u64,
    /// Latency threshold in milliseconds
    pub latency_threshold_ms: u64,
    /// Delay between iterations in milliseconds (0 disables)
    pub delay_ms: u64,
    /// EDNS UDP payload size
    pub edns_payload: u16,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            latency_threshold_ms: DEFAULT_LATENCY_THRESHOLD_MS,
            delay_ms: DEFAULT_DELAY_MS,
            edns_payload: DEFAULT_EDNS_PAYLOAD,
        }
    }
}

impl ProbeSettings {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Disable the pause between iterations.
    #[must_use]
    pub fn without_delay(mut self) -> Self {
        self.delay_ms = 0;
        self
    }
}
