//! Datagram wire format.
//!
//! Every datagram is one JSON-encoded [`Frame`]. The sender's UDP source
//! address is its `PeerKey`, so frames never repeat it.
//!
//! The transmission queue carries serialized [`Dispatch`] entries: a frame
//! plus where it should go. The receiver produces them (replies, relays,
//! introductions); the transmitter is the only worker that writes to the socket.

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::identity::PeerKey;

/// Largest UDP payload over IPv4.
pub const MAX_DATAGRAM: usize = 65507;

/// A peer as described to other peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub name: Option<String>,
    pub addr: IpAddr,
    pub port: u16,
    pub hub: bool,
}

impl PeerRecord {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }

    pub fn key(&self) -> PeerKey {
        PeerKey::from(self.socket_addr())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frame {
    /// Newcomer → point-of-contact.
    Join { name: String },

    /// Point-of-contact → newcomer. Lists every known peer except the newcomer.
    Welcome {
        name: String,
        hub: bool,
        peers: Vec<PeerRecord>,
    },

    /// Point-of-contact → existing peers, announcing a newcomer.
    Introduce { peer: PeerRecord },

    Ping { nonce: u64 },
    Pong { nonce: u64 },

    /// A serialized `Packet` from `origin` (the author's own key) and `name`.
    /// With `forward` set, the hub relays it to every peer except the one it
    /// arrived from.
    Data {
        origin: PeerKey,
        name: String,
        forward: bool,
        packet: String,
    },
}

impl Frame {
    pub fn label(&self) -> &'static str {
        match self {
            Frame::Join { .. } => "join",
            Frame::Welcome { .. } => "welcome",
            Frame::Introduce { .. } => "introduce",
            Frame::Ping { .. } => "ping",
            Frame::Pong { .. } => "pong",
            Frame::Data { .. } => "data",
        }
    }
}

/// Where a dispatched frame goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "to", rename_all = "snake_case")]
pub enum Route {
    Peer { key: PeerKey },
    AllPeers { except: Option<PeerKey> },
}

/// A transmission-queue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispatch {
    pub route: Route,
    pub frame: Frame,
}

impl Dispatch {
    pub fn to_peer(key: PeerKey, frame: Frame) -> Self {
        Self {
            route: Route::Peer { key },
            frame,
        }
    }

    pub fn to_all(except: Option<PeerKey>, frame: Frame) -> Self {
        Self {
            route: Route::AllPeers { except },
            frame,
        }
    }

    pub fn to_json_string(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Encode a frame into a single datagram.
pub fn encode(frame: &Frame) -> Result<Vec<u8>, WireError> {
    let bytes = serde_json::to_vec(frame)?;
    if bytes.len() > MAX_DATAGRAM {
        return Err(WireError::TooLarge(bytes.len()));
    }
    Ok(bytes)
}

/// Check that `packet` fits in a single data frame from `origin`. Uses the
/// longer of the two `forward` encodings, so the check holds on either route.
pub fn check_data_fits(origin: &PeerKey, name: &str, packet: &str) -> Result<(), WireError> {
    let frame = Frame::Data {
        origin: origin.clone(),
        name: name.to_string(),
        forward: false,
        packet: packet.to_string(),
    };
    encode(&frame).map(drop)
}

pub fn decode(datagram: &[u8]) -> Result<Frame, WireError> {
    Ok(serde_json::from_slice(datagram)?)
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame length {0} exceeds maximum {}", MAX_DATAGRAM)]
    TooLarge(usize),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
