//! Network identity of a registered game server.
//!
//! [`ServerId`] is the `(host, port)` identity key. At most one entry per
//! key exists in a snapshot at any time.

use std::fmt;
use std::net::IpAddr;

/// Identity key of a game server: normalized host plus game port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerId {
    host: String,
    port: u16,
}

impl ServerId {
    /// Creates an identity from an already-normalized host string.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Creates an identity from a peer address, normalizing the host with
    /// [`normalize_host`].
    #[must_use]
    pub fn from_ip(ip: IpAddr, port: u16) -> Self {
        Self::new(normalize_host(ip), port)
    }

    /// Returns the host part.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port part.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.host, self.port)
    }
}

/// Renders a caller address the way it is stored and published.
///
/// IPv4-mapped IPv6 addresses (`::ffff:1.2.3.4`) lose their prefix so that
/// dual-stack listeners and plain IPv4 listeners agree on the same key.
#[must_use]
pub fn normalize_host(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
    }
}
