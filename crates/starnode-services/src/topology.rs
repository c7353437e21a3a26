//! Topology state: the peer directory, the latency table, and the hub flag.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use starnode_core::{PeerKey, PeerRecord};

/// Directory entry for a known peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub addr: IpAddr,
    pub port: u16,
    /// Display name, once the peer has told us.
    pub name: Option<String>,
    /// Whether the peer last described itself as the hub.
    pub hub: bool,
}

impl PeerInfo {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr: addr.ip(),
            port: addr.port(),
            name: None,
            hub: false,
        }
    }

    pub fn named(addr: SocketAddr, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(addr)
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }

    pub fn to_record(&self) -> PeerRecord {
        PeerRecord {
            name: self.name.clone(),
            addr: self.addr,
            port: self.port,
            hub: self.hub,
        }
    }
}

impl From<&PeerRecord> for PeerInfo {
    fn from(record: &PeerRecord) -> Self {
        Self {
            addr: record.addr,
            port: record.port,
            name: record.name.clone(),
            hub: record.hub,
        }
    }
}

/// A measured round-trip time. Displays as milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rtt(pub Duration);

impl Rtt {
    pub fn from_millis(ms: u64) -> Self {
        Rtt(Duration::from_millis(ms))
    }

    pub fn duration(&self) -> Duration {
        self.0
    }
}

impl fmt::Display for Rtt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.subsec_nanos() % 1_000_000 == 0 {
            write!(f, "{}ms", self.0.as_millis())
        } else {
            write!(f, "{:.3}ms", self.0.as_secs_f64() * 1000.0)
        }
    }
}

impl FromStr for Rtt {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms: f64 = s
            .strip_suffix("ms")
            .ok_or_else(|| format!("latency {s:?} is missing the ms suffix"))?
            .parse()
            .map_err(|e| format!("latency {s:?}: {e}"))?;
        if !ms.is_finite() || ms < 0.0 {
            return Err(format!("latency {s:?} is out of range"));
        }
        Ok(Rtt(Duration::from_micros((ms * 1000.0).round() as u64)))
    }
}

/// One line of `show-status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub key: PeerKey,
    pub info: PeerInfo,
    pub rtt: Option<Rtt>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("unknown peer {key}")]
    NotFound { key: PeerKey },
}

/// Peer directory (`star_map`), latency table (`rtt_vector`) and hub flag.
///
/// The directory and the latency table are guarded independently. Peers are
/// only ever added or updated, never removed.
#[derive(Debug, Default)]
pub struct Topology {
    peers: DashMap<PeerKey, PeerInfo>,
    latencies: DashMap<PeerKey, Rtt>,
    hub: AtomicBool,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a directory entry.
    pub fn update_peer(&self, key: PeerKey, info: PeerInfo) {
        tracing::trace!(peer = %key, "directory updated");
        self.peers.insert(key, info);
    }

    pub fn lookup_peer(&self, key: &PeerKey) -> Result<PeerInfo, TopologyError> {
        self.peers
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| TopologyError::NotFound { key: key.clone() })
    }

    pub fn contains_peer(&self, key: &PeerKey) -> bool {
        self.peers.contains_key(key)
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Point-in-time copy of the directory, ordered by key.
    pub fn snapshot_peers(&self) -> Vec<(PeerKey, PeerInfo)> {
        let mut peers: Vec<_> = self
            .peers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        peers.sort_by(|a, b| a.0.cmp(&b.0));
        peers
    }

    /// `None` means the peer has not been measured yet.
    pub fn latency_of(&self, key: &PeerKey) -> Option<Rtt> {
        self.latencies.get(key).map(|entry| *entry.value())
    }

    /// Insert or overwrite a latency. The peer must already be in the directory.
    pub fn record_latency(&self, key: PeerKey, rtt: Rtt) -> Result<(), TopologyError> {
        // Directory guard is released before the latency table is touched.
        if !self.contains_peer(&key) {
            return Err(TopologyError::NotFound { key });
        }
        tracing::debug!(peer = %key, %rtt, "latency recorded");
        self.latencies.insert(key, rtt);
        Ok(())
    }

    /// Sum of every measured RTT.
    pub fn rtt_sum(&self) -> Rtt {
        Rtt(self.latencies.iter().map(|entry| entry.value().0).sum())
    }

    /// Flip the local hub flag, returning the new value.
    pub fn toggle_hub(&self) -> bool {
        let now = !self.hub.fetch_xor(true, Ordering::SeqCst);
        tracing::info!(hub = now, "hub flag flipped");
        now
    }

    pub fn is_hub(&self) -> bool {
        self.hub.load(Ordering::SeqCst)
    }

    /// The remote peer currently flagged as hub, lowest key first.
    pub fn hub_peer(&self) -> Option<PeerKey> {
        self.snapshot_peers()
            .into_iter()
            .find(|(_, info)| info.hub)
            .map(|(key, _)| key)
    }

    /// Directory snapshot joined with latencies.
    pub fn status_rows(&self) -> Vec<StatusRow> {
        self.snapshot_peers()
            .into_iter()
            .map(|(key, info)| {
                let rtt = self.latency_of(&key);
                StatusRow { key, info, rtt }
            })
            .collect()
    }
}
