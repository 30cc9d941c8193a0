//! Socket construction.
//!
//! Several stations may share one host, so both sockets set `SO_REUSEADDR`
//! before binding. The IPv6 socket is `IPV6_V6ONLY` so it never competes
//! with the IPv4 socket for the same port. Both are returned non-blocking,
//! ready for [`tokio::net::UdpSocket::from_std`].

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use socket2::{Domain, Protocol, Socket, Type};

/// Wildcard IPv4 address for `port`.
pub const fn ipv4_bind_addr(port: u16) -> SocketAddr {
    SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)
}

/// Wildcard IPv6 address for `port`.
pub const fn ipv6_bind_addr(port: u16) -> SocketAddr {
    SocketAddr::new(std::net::IpAddr::V6(Ipv6Addr::UNSPECIFIED), port)
}

/// Open the IPv4 broadcast socket bound to `0.0.0.0:port`.
pub fn open_ipv4(port: u16) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_broadcast(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&ipv4_bind_addr(port).into())?;
    Ok(socket.into())
}

/// Open the IPv6 multicast socket bound to `[::]:port` and joined to `group`
/// on `interface` (0 lets the OS choose).
pub fn open_ipv6(port: u16, group: &Ipv6Addr, interface: u32) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_only_v6(true)?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&ipv6_bind_addr(port).into())?;
    socket.join_multicast_v6(group, interface)?;
    if interface != 0 {
        socket.set_multicast_if_v6(interface)?;
    }
    socket.set_multicast_loop_v6(true)?;
    Ok(socket.into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_socket_binds_ephemeral_port() {
        let socket = open_ipv4(0).unwrap();
        let addr = socket.local_addr().unwrap();
        assert!(addr.is_ipv4());
        assert_ne!(addr.port(), 0);
        assert!(socket.broadcast().unwrap());
    }

    #[test]
    fn two_ipv4_sockets_share_a_port() {
        let first = open_ipv4(0).unwrap();
        let port = first.local_addr().unwrap().port();
        let second = open_ipv4(port).unwrap();
        assert_eq!(second.local_addr().unwrap().port(), port);
    }

    #[test]
    fn bind_addrs_are_wildcards() {
        assert_eq!(ipv4_bind_addr(5000).to_string(), "0.0.0.0:5000");
        assert_eq!(ipv6_bind_addr(5000).to_string(), "[::]:5000");
    }
}
