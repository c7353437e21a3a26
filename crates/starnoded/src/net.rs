//! Address helpers.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket};

use anyhow::{Context, Result};

/// Point-of-contact address argument that means "start a new network".
pub const NO_POC: &str = "0";

/// TEST-NET-1; only used to pick a route when there is no point-of-contact.
const ROUTE_PROBE: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 9);

/// Resolve the point-of-contact arguments. `0` means none.
pub fn point_of_contact(addr: &str, port: u16) -> Result<Option<SocketAddr>> {
    if addr == NO_POC {
        return Ok(None);
    }
    let resolved = (addr, port)
        .to_socket_addrs()
        .with_context(|| format!("failed to resolve point-of-contact {addr}:{port}"))?
        .next()
        .with_context(|| format!("point-of-contact {addr}:{port} resolved to nothing"))?;
    Ok(Some(resolved))
}

/// The address peers should reach this host on.
///
/// Connects an unbound UDP socket toward the point-of-contact (nothing is
/// sent) and reads back the local address the kernel picked. Falls back to
/// loopback when there is no route.
pub fn local_address(poc: Option<SocketAddr>) -> IpAddr {
    let target = poc.unwrap_or(ROUTE_PROBE);
    match route_source(target) {
        Ok(ip) if !ip.is_unspecified() => ip,
        Ok(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Err(e) => {
            tracing::warn!(error = %e, %target, "no route for local address, using loopback");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

fn route_source(target: SocketAddr) -> io::Result<IpAddr> {
    let probe = UdpSocket::bind(wildcard(Some(target), 0))?;
    probe.connect(target)?;
    Ok(probe.local_addr()?.ip())
}

/// Wildcard bind address on `port`, in the same family as `peer` (IPv4 when
/// there is none).
pub fn wildcard(peer: Option<SocketAddr>, port: u16) -> SocketAddr {
    match peer {
        Some(SocketAddr::V6(_)) => SocketAddr::from(([0u16; 8], port)),
        _ => SocketAddr::from(([0, 0, 0, 0], port)),
    }
}
