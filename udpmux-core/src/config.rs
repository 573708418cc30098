//! Configuration types for the reliability engine

use crate::protocol::constants;

/// Retransmission pacing profile.
///
/// `nodelay` switches the minimum-RTO clamp from 100ms to 30ms and makes
/// timeout backoff grow by half-steps instead of doubling, so a lossy or
/// idle link does not stall delivery.
#[derive(Debug, Clone)]
pub struct LatencyProfile {
    /// Enable the low-latency RTO clamp and backoff
    pub nodelay: bool,
    /// Internal flush interval in milliseconds
    pub interval: u32,
    /// Duplicate-ack count that triggers fast retransmission (0 = off)
    pub resend: u32,
    /// Disable congestion control entirely
    pub no_congestion_control: bool,
}

impl LatencyProfile {
    /// Balanced profile: conservative timers, congestion control on
    pub fn standard() -> Self {
        Self {
            nodelay: false,
            interval: 40,
            resend: 0,
            no_congestion_control: false,
        }
    }

    /// Low-latency profile: 10ms flush cadence, fast retransmit after two
    /// duplicate acks, 30ms RTO floor. The default.
    pub fn low_latency() -> Self {
        Self {
            nodelay: true,
            interval: 10,
            resend: 2,
            no_congestion_control: false,
        }
    }

    /// Custom profile
    pub fn custom(nodelay: bool, interval: u32, resend: u32, no_congestion_control: bool) -> Self {
        Self {
            nodelay,
            interval,
            resend,
            no_congestion_control,
        }
    }
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self::low_latency()
    }
}

/// Protocol-only configuration for the engine.
///
/// Contains only the fields the engine reads — no transport or I/O settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum transmission unit
    pub mtu: u32,
    /// Send window size (segments)
    pub snd_wnd: u32,
    /// Receive window size (segments)
    pub rcv_wnd: u32,
    /// Pacing profile
    pub profile: LatencyProfile,
    /// Retransmissions of one segment before the link is considered dead
    pub max_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mtu: constants::MTU_DEFAULT,
            snd_wnd: constants::WND_SND,
            rcv_wnd: constants::WND_RCV,
            profile: LatencyProfile::default(),
            max_retries: constants::DEAD_LINK,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = mtu;
        self
    }

    pub fn window_size(mut self, snd_wnd: u32, rcv_wnd: u32) -> Self {
        self.snd_wnd = snd_wnd;
        self.rcv_wnd = rcv_wnd;
        self
    }

    pub fn profile(mut self, profile: LatencyProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}
