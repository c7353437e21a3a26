//! Receiver worker: reads datagrams, updates the topology, and feeds the
//! print and transmission queues.

use std::fs;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};

use starnode_core::wire;
use starnode_core::{Dispatch, Frame, Packet, PeerKey, PeerRecord};
use starnode_services::{PeerInfo, SharedContext, SignalCode};

use crate::transmitter::probe_token;

pub struct Receiver {
    socket: UdpSocket,
    handler: FrameHandler,
    recv_buffer: usize,
}

impl Receiver {
    /// `idle_tick` bounds each blocking read so shutdown is noticed.
    pub fn new(
        ctx: SharedContext,
        socket: UdpSocket,
        storage: PathBuf,
        recv_buffer: usize,
        idle_tick: Duration,
    ) -> io::Result<Self> {
        socket.set_read_timeout(Some(idle_tick))?;
        Ok(Self {
            socket,
            handler: FrameHandler::new(ctx, storage),
            recv_buffer,
        })
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("recv".to_string())
            .spawn(move || self.run())
    }

    fn run(self) {
        tracing::info!("receiver starting");
        let mut buf = vec![0u8; self.recv_buffer];

        while !self.handler.ctx.is_shutting_down() {
            let (len, src) = match self.socket.recv_from(&mut buf) {
                Ok(r) => r,
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    continue
                }
                Err(e) => {
                    tracing::warn!(error = %e, "recv_from failed");
                    continue;
                }
            };

            match wire::decode(&buf[..len]) {
                Ok(frame) => self.handler.handle(src, frame),
                Err(e) => tracing::warn!(%src, error = %e, "dropping malformed datagram"),
            }
        }

        tracing::info!("receiver shutting down");
    }
}

/// Reacts to one decoded frame. Never touches the socket; anything to send
/// goes onto the transmission queue.
pub struct FrameHandler {
    ctx: SharedContext,
    storage: PathBuf,
}

impl FrameHandler {
    pub fn new(ctx: SharedContext, storage: PathBuf) -> Self {
        Self { ctx, storage }
    }

    pub fn handle(&self, src: SocketAddr, frame: Frame) {
        let key = PeerKey::from(src);
        tracing::trace!(peer = %key, kind = frame.label(), "frame received");

        match frame {
            Frame::Join { name } => self.on_join(key, src, name),
            Frame::Welcome { name, hub, peers } => self.on_welcome(key, src, name, hub, &peers),
            Frame::Introduce { peer } => self.learn(&peer),
            Frame::Ping { nonce } => self.queue(Dispatch::to_peer(key, Frame::Pong { nonce })),
            Frame::Pong { nonce } => self.on_pong(&key, nonce),
            Frame::Data {
                origin,
                name,
                forward,
                packet,
            } => self.on_data(key, origin, name, forward, packet),
        }
    }

    fn on_join(&self, key: PeerKey, src: SocketAddr, name: String) {
        let topology = self.ctx.topology();
        if self.ctx.at_capacity() {
            tracing::warn!(
                peer = %key,
                max_peers = self.ctx.max_peers(),
                "peer limit reached, admitting anyway"
            );
        }

        let newcomer = PeerInfo::named(src, name.as_str());
        let record = newcomer.to_record();
        topology.update_peer(key.clone(), newcomer);
        tracing::info!(peer = %key, name = %name, "peer joined");

        let peers = topology
            .snapshot_peers()
            .into_iter()
            .filter(|(k, _)| *k != key)
            .map(|(_, info)| info.to_record())
            .collect();
        self.queue(Dispatch::to_peer(
            key.clone(),
            Frame::Welcome {
                name: self.ctx.name().to_string(),
                hub: topology.is_hub(),
                peers,
            },
        ));
        self.queue(Dispatch::to_all(Some(key), Frame::Introduce { peer: record }));
    }

    fn on_welcome(&self, key: PeerKey, src: SocketAddr, name: String, hub: bool, peers: &[PeerRecord]) {
        let mut contact = PeerInfo::named(src, name);
        contact.hub = hub;
        self.ctx.topology().update_peer(key.clone(), contact);
        for record in peers {
            self.learn(record);
        }
        tracing::info!(via = %key, peers = self.ctx.topology().peer_count(), "joined network");
    }

    fn learn(&self, record: &PeerRecord) {
        if self.ctx.identity().is_self(record.socket_addr()) {
            return;
        }
        let key = record.key();
        let topology = self.ctx.topology();
        let known = topology.contains_peer(&key);
        topology.update_peer(key.clone(), PeerInfo::from(record));
        if !known {
            tracing::info!(peer = %key, hub = record.hub, "peer discovered");
        }
    }

    fn on_pong(&self, key: &PeerKey, nonce: u64) {
        let token = probe_token(key, nonce);
        let answered = self.ctx.signal().post_if(
            |s| s.code == SignalCode::Request && s.payload == token,
            SignalCode::Response,
            token.as_str(),
        );
        if !answered {
            tracing::debug!(peer = %key, nonce, "late or unsolicited pong");
        }
    }

    fn on_data(&self, key: PeerKey, origin: PeerKey, name: String, forward: bool, raw: String) {
        let packet = match Packet::from_json_str(&raw) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(peer = %key, error = %e, "dropping malformed packet");
                return;
            }
        };
        self.ctx.print_queue().push(self.render(&name, &origin, &packet));

        if !forward {
            return;
        }
        if !self.ctx.topology().is_hub() {
            tracing::warn!(peer = %key, "asked to relay but this node is not the hub");
            return;
        }
        tracing::debug!(from = %key, kind = %packet.kind(), "relaying packet");
        self.queue(Dispatch::to_all(
            Some(key),
            Frame::Data {
                origin,
                name,
                forward: false,
                packet: raw,
            },
        ));
    }

    fn render(&self, name: &str, origin: &PeerKey, packet: &Packet) -> String {
        match packet {
            Packet::Message { message } => format!("[{name}@{origin}] MSG: {message}"),
            Packet::File { filename, .. } => match self.save_file(filename, packet) {
                Ok((path, len)) => format!(
                    "[{name}@{origin}] FILE: {filename} ({len} bytes) saved to {}",
                    path.display()
                ),
                Err(e) => {
                    tracing::warn!(filename = %filename, error = %e, "file not saved");
                    format!("[{name}@{origin}] FILE: {filename} rejected: {e:#}")
                }
            },
        }
    }

    fn save_file(&self, filename: &str, packet: &Packet) -> Result<(PathBuf, usize)> {
        let bytes = packet.file_bytes()?;
        let base = Path::new(filename)
            .file_name()
            .context("file packet has no usable name")?;
        fs::create_dir_all(&self.storage)
            .with_context(|| format!("failed to create {}", self.storage.display()))?;
        let path = self.storage.join(base);
        fs::write(&path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
        Ok((path, bytes.len()))
    }

    fn queue(&self, dispatch: Dispatch) {
        match dispatch.to_json_string() {
            Ok(raw) => self.ctx.transmission_queue().push(raw),
            Err(e) => tracing::warn!(error = %e, "failed to queue dispatch"),
        }
    }
}
