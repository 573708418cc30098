//! Configuration for the multiplexing layer

use crate::error::{MuxError, Result};
use std::time::Duration;
use udpmux_core::{EngineConfig, LatencyProfile};

/// Reassembled payloads a session buffers before new ones are dropped
pub const DELIVERY_CAPACITY: usize = 64;

/// Endpoint-level configuration builder.
///
/// Engine tuning (windows, MTU, pacing) nests under [`EngineConfig`];
/// everything here is about the multiplexing layer itself.
#[derive(Debug, Clone)]
pub struct MuxConfig {
    /// Reliability engine tuning shared by every session
    pub engine: EngineConfig,
    /// Cadence of the endpoint update tick driving retransmission
    pub update_interval: Duration,
    /// Inactivity span after which a session is evicted
    pub idle_timeout: Duration,
    /// Delivery channel capacity per session
    pub delivery_capacity: usize,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            update_interval: Duration::from_millis(10),
            idle_timeout: Duration::from_secs(30),
            delivery_capacity: DELIVERY_CAPACITY,
        }
    }
}

impl MuxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn profile(mut self, profile: LatencyProfile) -> Self {
        self.engine.profile = profile;
        self
    }

    pub fn update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn delivery_capacity(mut self, capacity: usize) -> Self {
        self.delivery_capacity = capacity;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.engine.mtu < 64 || self.engine.mtu > 65535 {
            return Err(MuxError::config("MTU must be between 64 and 65535"));
        }

        if self.engine.snd_wnd == 0 || self.engine.rcv_wnd == 0 {
            return Err(MuxError::config("window sizes must be greater than 0"));
        }

        if self.engine.profile.interval == 0 {
            return Err(MuxError::config("flush interval must be greater than 0"));
        }

        if self.update_interval.is_zero() {
            return Err(MuxError::config("update interval must be greater than 0"));
        }

        if self.delivery_capacity == 0 {
            return Err(MuxError::config("delivery capacity must be greater than 0"));
        }

        Ok(())
    }
}
