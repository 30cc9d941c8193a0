//! The gossip transport: one socket and one receive loop per address family.
//!
//! [`GossipTransport::bind`] opens the sockets synchronously so bind errors
//! surface to the caller, then spawns the receive loops on the current Tokio
//! runtime. Publishing never blocks or awaits: each beacon is one
//! non-blocking `send_to` per family on a cloned handle of the bound socket,
//! so it reaches the kernel even if the runtime has not yet polled the
//! receive side. A full send buffer simply drops the beacon.
//!
//! Shutdown is a `watch` channel. Raising it wakes both loops immediately;
//! [`GossipTransport::shutdown`] then joins them.

use std::io;
use std::net::{SocketAddr, SocketAddrV4, SocketAddrV6};
use std::sync::{Arc, Mutex, PoisonError};

use maelstrom_core::config::NetworkConfig;
use maelstrom_core::peers::PeerStateStore;
use maelstrom_types::{IntensityDatagram, Role, WireError};
use tokio::net::UdpSocket;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::error::{Family, TransportError};
use crate::socket;

/// Receive buffer size. Anything longer than a datagram is malformed anyway.
const RECV_BUFFER_LEN: usize = 64;

/// What happened to a received payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ingest {
    /// The value was written to the peer store.
    Stored {
        /// The sending station.
        role: Role,
        /// The clamped value that was stored.
        value: f32,
    },
    /// Wrong length.
    Malformed,
    /// The role id does not name a station.
    UnknownRole,
    /// Our own beacon came back to us.
    SelfEcho,
    /// A station beacon the store refused to record.
    Rejected {
        /// The sending station.
        role: Role,
    },
}

/// Decode `payload` and record it in `store` unless it is malformed, names
/// no station, or carries `local_role`.
///
/// A station role the store itself refuses (its own local role differs from
/// `local_role`) is reported as [`Ingest::Rejected`].
pub fn integrate_datagram(payload: &[u8], local_role: Role, store: &PeerStateStore) -> Ingest {
    match IntensityDatagram::decode(payload) {
        Ok(datagram) if datagram.role() == local_role => Ingest::SelfEcho,
        Ok(datagram) => {
            if store.set_role(datagram.role(), datagram.value()) {
                Ingest::Stored {
                    role: datagram.role(),
                    value: datagram.value(),
                }
            } else {
                Ingest::Rejected {
                    role: datagram.role(),
                }
            }
        }
        Err(WireError::UnknownRole { .. }) => Ingest::UnknownRole,
        Err(WireError::Length { .. } | WireError::InvalidRole) => Ingest::Malformed,
    }
}

/// Send side of a bound socket plus where its beacons go.
///
/// `sender` shares the file description of the socket the receive loop
/// owns, so it is non-blocking and bound to the same port.
#[derive(Debug)]
struct Channel {
    family: Family,
    sender: std::net::UdpSocket,
    destination: SocketAddr,
}

/// Split a freshly opened socket into its send handle and the tokio socket
/// for the receive loop.
fn split_socket(
    opened: io::Result<std::net::UdpSocket>,
) -> io::Result<(std::net::UdpSocket, UdpSocket)> {
    let socket = opened?;
    let sender = socket.try_clone()?;
    let receiver = UdpSocket::from_std(socket)?;
    Ok((sender, receiver))
}

/// Dual-stack UDP gossip endpoint for one station.
#[derive(Debug)]
pub struct GossipTransport {
    local_role: Role,
    store: Arc<PeerStateStore>,
    channels: Mutex<Vec<Channel>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    local_addrs: Vec<SocketAddr>,
    shutdown_tx: watch::Sender<bool>,
}

impl GossipTransport {
    /// Open the sockets described by `config` and start listening.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NoRuntime`] outside a runtime and
    /// [`TransportError::Bind`] if any socket cannot be opened.
    pub fn bind(
        config: &NetworkConfig,
        local_role: Role,
        store: Arc<PeerStateStore>,
    ) -> Result<Self, TransportError> {
        let runtime =
            Handle::try_current().map_err(|source| TransportError::NoRuntime { source })?;

        let mut channels = Vec::with_capacity(2);
        let mut receivers = Vec::with_capacity(2);

        let v4_addr = socket::ipv4_bind_addr(config.port);
        let (v4_sender, v4_receiver) =
            split_socket(socket::open_ipv4(config.port)).map_err(|source| {
                TransportError::Bind {
                    family: Family::V4,
                    addr: v4_addr,
                    source,
                }
            })?;
        channels.push(Channel {
            family: Family::V4,
            sender: v4_sender,
            destination: SocketAddr::V4(SocketAddrV4::new(config.ipv4_broadcast, config.port)),
        });
        receivers.push((Family::V4, v4_receiver));

        if config.ipv6_enabled {
            let v6_addr = socket::ipv6_bind_addr(config.port);
            let (v6_sender, v6_receiver) = split_socket(socket::open_ipv6(
                config.port,
                &config.ipv6_group,
                config.ipv6_interface,
            ))
            .map_err(|source| TransportError::Bind {
                family: Family::V6,
                addr: v6_addr,
                source,
            })?;
            channels.push(Channel {
                family: Family::V6,
                sender: v6_sender,
                destination: SocketAddr::V6(SocketAddrV6::new(
                    config.ipv6_group,
                    config.port,
                    0,
                    config.ipv6_interface,
                )),
            });
            receivers.push((Family::V6, v6_receiver));
        }

        let local_addrs: Vec<SocketAddr> = channels
            .iter()
            .filter_map(|channel| channel.sender.local_addr().ok())
            .collect();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let tasks = receivers
            .into_iter()
            .map(|(family, receiver)| {
                runtime.spawn(receive_loop(
                    family,
                    receiver,
                    local_role,
                    Arc::clone(&store),
                    shutdown_rx.clone(),
                ))
            })
            .collect();

        info!(
            role = %local_role,
            port = config.port,
            ipv4_broadcast = %config.ipv4_broadcast,
            ipv6_group = %config.ipv6_group,
            ipv6_enabled = config.ipv6_enabled,
            "gossip transport bound"
        );

        Ok(Self {
            local_role,
            store,
            channels: Mutex::new(channels),
            tasks: Mutex::new(tasks),
            local_addrs,
            shutdown_tx,
        })
    }

    /// The role stamped on outgoing beacons.
    pub const fn local_role(&self) -> Role {
        self.local_role
    }

    /// The store the receive loops write into.
    pub const fn store(&self) -> &Arc<PeerStateStore> {
        &self.store
    }

    /// Addresses the sockets were bound to, IPv4 first.
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.local_addrs
    }

    /// Whether shutdown has been requested.
    pub fn is_shut_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Send `value` on every open channel.
    ///
    /// Best effort: failures are traced and dropped. A transport with role
    /// `none` never sends.
    pub fn publish(&self, value: f32) {
        let bytes = match IntensityDatagram::new(self.local_role, value).encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                trace!(role = %self.local_role, error = %e, "not publishing");
                return;
            }
        };

        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        for channel in channels.iter() {
            if let Err(e) = channel.sender.send_to(&bytes, channel.destination) {
                trace!(
                    family = %channel.family,
                    destination = %channel.destination,
                    error = %e,
                    "beacon dropped"
                );
            }
        }
    }

    /// Signal the receive loops to stop and release the send sockets.
    ///
    /// Idempotent. Returns immediately; use [`shutdown`](Self::shutdown) to
    /// wait for the loops.
    pub fn request_shutdown(&self) {
        let already = self.shutdown_tx.send_replace(true);
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        if !already {
            debug!(role = %self.local_role, "gossip transport shutdown requested");
        }
    }

    /// Stop the receive loops and wait for them to exit. Idempotent.
    pub async fn shutdown(&self) {
        self.request_shutdown();
        let tasks: Vec<JoinHandle<()>> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "receive loop ended abnormally");
            }
        }
    }
}

impl Drop for GossipTransport {
    fn drop(&mut self) {
        self.request_shutdown();
    }
}

async fn receive_loop(
    family: Family,
    socket: UdpSocket,
    local_role: Role,
    store: Arc<PeerStateStore>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = [0_u8; RECV_BUFFER_LEN];
    debug!(%family, "receive loop started");

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            received = socket.recv_from(&mut buf) => match received {
                Ok((len, from)) => {
                    let payload = buf.get(..len).unwrap_or_default();
                    let outcome = integrate_datagram(payload, local_role, &store);
                    trace!(%family, %from, len, ?outcome, "datagram");
                }
                Err(e) => {
                    debug!(%family, error = %e, "receive error");
                }
            }
        }
    }

    debug!(%family, "receive loop stopped");
}
