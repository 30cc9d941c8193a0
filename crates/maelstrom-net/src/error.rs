//! Transport error types.

use std::fmt;
use std::net::SocketAddr;

/// Address family of a gossip channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// IPv4 broadcast channel.
    V4,
    /// IPv6 multicast channel.
    V6,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => f.write_str("ipv4"),
            Self::V6 => f.write_str("ipv6"),
        }
    }
}

/// Errors raised while opening the gossip transport.
///
/// Once bound, the transport never fails: send and receive errors are
/// logged and dropped.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// `bind` was called outside a Tokio runtime.
    #[error("gossip transport requires a running Tokio runtime: {source}")]
    NoRuntime {
        /// The underlying runtime lookup error.
        source: tokio::runtime::TryCurrentError,
    },

    /// A socket could not be created, configured, or bound.
    #[error("failed to open {family} socket on {addr}: {source}")]
    Bind {
        /// Which channel failed.
        family: Family,
        /// The local address the socket was being bound to.
        addr: SocketAddr,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
