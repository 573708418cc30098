//! Transport endpoint address type

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::warn;

/// Opaque, hashable transport endpoint (IP + port).
///
/// Decouples the multiplexing layers from the socket library's endpoint
/// type: sessions and endpoint tables key on `Addr`, and only the UDP
/// transport converts back to `SocketAddr` at the syscall boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Addr {
    ip: IpAddr,
    port: u16,
}

impl Addr {
    /// Build an address from an IP string and port.
    ///
    /// An unparseable IP string falls back to the IPv4 wildcard address; the
    /// fallback is logged so a bad configuration value is at least visible.
    pub fn new(ip: &str, port: u16) -> Self {
        let ip = ip.parse().unwrap_or_else(|_| {
            warn!(ip, "unparseable IP address, falling back to 0.0.0.0");
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        });
        Self { ip, port }
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Concrete socket address for the syscall boundary
    pub(crate) fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl From<SocketAddr> for Addr {
    fn from(addr: SocketAddr) -> Self {
        Self {
            ip: addr.ip(),
            port: addr.port(),
        }
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}
