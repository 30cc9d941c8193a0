//! Integration tests for the gossip transport over the loopback interface.
//!
//! Each test binds a real transport on an ephemeral port with the IPv6
//! channel disabled, then talks to it with an ordinary UDP socket on
//! `127.0.0.1`.

#![allow(clippy::unwrap_used)]

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use maelstrom_core::config::NetworkConfig;
use maelstrom_core::peers::PeerStateStore;
use maelstrom_net::GossipTransport;
use maelstrom_types::{IntensityDatagram, Role};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

fn loopback_config(port: u16) -> NetworkConfig {
    NetworkConfig {
        port,
        ipv4_broadcast: Ipv4Addr::LOCALHOST,
        ipv6_enabled: false,
        ..NetworkConfig::default()
    }
}

fn loopback_target(transport: &GossipTransport) -> SocketAddr {
    let port = transport.local_addrs().first().unwrap().port();
    SocketAddr::from((Ipv4Addr::LOCALHOST, port))
}

async fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[tokio::test]
async fn malformed_payload_is_ignored_and_loop_keeps_running() {
    let store = Arc::new(PeerStateStore::with_local_role(Role::Corals));
    let transport =
        GossipTransport::bind(&loopback_config(0), Role::Corals, Arc::clone(&store)).unwrap();
    let target = loopback_target(&transport);

    let sender = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();

    // Five bytes: one short of a datagram.
    sender.send_to(&[0, 3, 0x3F, 0x00, 0x00], target).await.unwrap();
    // Our own role echoed back.
    let echo = IntensityDatagram::new(Role::Corals, 0.9).encode().unwrap();
    sender.send_to(&echo, target).await.unwrap();
    // Unknown role id.
    sender.send_to(&[0, 9, 0x3F, 0x00, 0x00, 0x00], target).await.unwrap();
    // Finally a valid beacon from the feed station.
    let valid = IntensityDatagram::new(Role::Feed, 0.5).encode().unwrap();
    sender.send_to(&valid, target).await.unwrap();

    assert!(wait_for(|| store.get_role(Role::Feed).is_some()).await);
    assert_eq!(store.len(), 1);
    assert!((store.get("feed").unwrap() - 0.5).abs() < 1e-6);
    assert_eq!(store.get_role(Role::Corals), None);

    tokio::time::timeout(Duration::from_secs(2), transport.shutdown())
        .await
        .unwrap();
    assert!(transport.is_shut_down());
}

#[tokio::test]
async fn later_beacons_overwrite_earlier_ones() {
    let store = Arc::new(PeerStateStore::new());
    let transport =
        GossipTransport::bind(&loopback_config(0), Role::None, Arc::clone(&store)).unwrap();
    let target = loopback_target(&transport);
    let sender = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();

    for value in [0.1_f32, 0.2, 0.3] {
        let bytes = IntensityDatagram::new(Role::GhostNet, value).encode().unwrap();
        sender.send_to(&bytes, target).await.unwrap();
    }

    assert!(
        wait_for(|| store
            .get_role(Role::GhostNet)
            .is_some_and(|value| (value - 0.3).abs() < 1e-6))
        .await
    );

    transport.shutdown().await;
}

/// A listener on the exact loopback address that tolerates the transport's
/// wildcard socket on the same port. Unicast beacons to 127.0.0.1 land here
/// rather than on the transport.
fn beacon_listener() -> (UdpSocket, u16) {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).unwrap();
    socket.set_reuse_address(true).unwrap();
    socket.set_nonblocking(true).unwrap();
    socket
        .bind(&SocketAddr::from((Ipv4Addr::LOCALHOST, 0)).into())
        .unwrap();
    let listener = UdpSocket::from_std(socket.into()).unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

#[tokio::test]
async fn publish_reaches_a_listener_on_the_beacon_port() {
    let (listener, port) = beacon_listener();
    let store = Arc::new(PeerStateStore::with_local_role(Role::GhostNet));
    let transport = GossipTransport::bind(&loopback_config(port), Role::GhostNet, store).unwrap();

    transport.publish(0.25);

    let mut buf = [0_u8; 16];
    let (len, _) = tokio::time::timeout(Duration::from_secs(2), listener.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    let datagram = IntensityDatagram::decode(buf.get(..len).unwrap()).unwrap();
    assert_eq!(datagram.role(), Role::GhostNet);
    assert!((datagram.value() - 0.25).abs() < 1e-6);

    transport.shutdown().await;
}

#[tokio::test]
async fn back_to_back_publishes_all_go_out() {
    let (listener, port) = beacon_listener();
    let store = Arc::new(PeerStateStore::with_local_role(Role::Feed));
    let transport = GossipTransport::bind(&loopback_config(port), Role::Feed, store).unwrap();

    // A frame loop publishes without ever yielding to the runtime.
    for step in 0..20_u8 {
        transport.publish(f32::from(step) / 20.0);
    }

    let mut buf = [0_u8; 16];
    for step in 0..20_u8 {
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), listener.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let datagram = IntensityDatagram::decode(buf.get(..len).unwrap()).unwrap();
        assert_eq!(datagram.role(), Role::Feed);
        assert!((datagram.value() - f32::from(step) / 20.0).abs() < 1e-6);
    }

    transport.shutdown().await;
}

#[tokio::test]
async fn monitor_role_never_publishes() {
    let (listener, port) = beacon_listener();
    let transport = GossipTransport::bind(
        &loopback_config(port),
        Role::None,
        Arc::new(PeerStateStore::new()),
    )
    .unwrap();

    transport.publish(0.8);

    let mut buf = [0_u8; 16];
    let received =
        tokio::time::timeout(Duration::from_millis(200), listener.recv_from(&mut buf)).await;
    assert!(received.is_err());

    transport.shutdown().await;
}

#[tokio::test]
async fn dropping_the_transport_stops_the_loops() {
    let store = Arc::new(PeerStateStore::new());
    let transport =
        GossipTransport::bind(&loopback_config(0), Role::Feed, Arc::clone(&store)).unwrap();
    let target = loopback_target(&transport);
    drop(transport);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let sender = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let bytes = IntensityDatagram::new(Role::Corals, 0.4).encode().unwrap();
    // The socket may already be closed; either way nothing is stored.
    let _ = sender.send_to(&bytes, target).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(store.is_empty());
}
