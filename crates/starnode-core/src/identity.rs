//! Node and peer identity.

use std::fmt;
use std::net::{AddrParseError, IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Identifies a remote peer by its `address:port`.
///
/// Used as the key into both the peer directory and the latency table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerKey(String);

impl PeerKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve the key back into a transmittable address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.0.parse()
    }
}

impl From<SocketAddr> for PeerKey {
    fn from(addr: SocketAddr) -> Self {
        Self(addr.to_string())
    }
}

impl fmt::Display for PeerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// This node's identity. Created at startup, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    name: String,
    addr: IpAddr,
    port: u16,
}

impl NodeIdentity {
    pub fn new(name: impl Into<String>, addr: IpAddr, port: u16) -> Self {
        Self {
            name: name.into(),
            addr,
            port,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }

    /// The key other peers file this node under.
    pub fn key(&self) -> PeerKey {
        PeerKey::from(self.socket_addr())
    }

    /// Whether a record received from the network describes this node.
    ///
    /// Peers on the same host may see us on loopback rather than our
    /// resolved address, so a loopback or unspecified address on our port
    /// also counts.
    pub fn is_self(&self, addr: SocketAddr) -> bool {
        addr.port() == self.port
            && (addr.ip() == self.addr || addr.ip().is_loopback() || addr.ip().is_unspecified())
    }
}

/// Renders as `name:address:port`.
impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.name, self.addr, self.port)
    }
}
