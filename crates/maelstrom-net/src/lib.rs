//! UDP gossip between Maelstrom stations.
//!
//! Every station broadcasts its intensity on IPv4 and multicasts it on IPv6,
//! both on the same port, and listens on both families for the other
//! stations. Received beacons land in a shared [`PeerStateStore`].
//!
//! # Modules
//!
//! - [`error`] -- [`TransportError`] for bind-time failures.
//! - [`socket`] -- Raw socket construction with the options tokio does not
//!   expose.
//! - [`transport`] -- [`GossipTransport`], its receive loops, and
//!   [`integrate_datagram`].
//!
//! [`PeerStateStore`]: maelstrom_core::peers::PeerStateStore

pub mod error;
pub mod socket;
pub mod transport;

pub use error::{Family, TransportError};
pub use transport::{GossipTransport, Ingest, integrate_datagram};
