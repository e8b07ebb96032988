//! Realtime stream timing.
//!
//! These values are read once at startup and stay fixed for the life of the
//! process: the heartbeat cadence, the client's dead-peer window, and the
//! client's reconnect delay. There is no backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_heartbeat_interval_secs() -> u64 {
    30
}

const fn default_heartbeat_timeout_secs() -> u64 {
    60
}

const fn default_reconnect_delay_ms() -> u64 {
    3_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RealtimeConfig {
    /// Interval between server heartbeats on every stream.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Client-side silence window after which a stream is considered dead.
    #[serde(default = "default_heartbeat_timeout_secs")]
    pub heartbeat_timeout_secs: u64,

    /// Fixed delay before the client reconnects.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            heartbeat_timeout_secs: default_heartbeat_timeout_secs(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl RealtimeConfig {
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub const fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }

    pub const fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Reject zero intervals and a timeout that a healthy stream could trip.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "realtime.heartbeat_interval_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.heartbeat_timeout_secs <= self.heartbeat_interval_secs {
            return Err(ConfigError::InvalidValue {
                field: "realtime.heartbeat_timeout_secs".into(),
                reason: format!(
                    "must be greater than heartbeat_interval_secs ({})",
                    self.heartbeat_interval_secs
                ),
            });
        }
        if self.reconnect_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "realtime.reconnect_delay_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}
