//! Transmitter worker: the only writer to the socket.
//!
//! Drains the transmission queue (replies, relays and introductions queued by
//! the receiver) and the send queue (packets from the console), and runs
//! periodic latency probes.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use starnode_core::config::ProbeConfig;
use starnode_core::wire;
use starnode_core::{Dispatch, Frame, PeerKey, Route};
use starnode_services::{NodeContext, Rtt, SharedContext, SignalCode};

/// Signal payload identifying one probe exchange.
pub fn probe_token(peer: &PeerKey, nonce: u64) -> String {
    format!("{peer}#{nonce}")
}

pub struct Transmitter {
    ctx: SharedContext,
    socket: UdpSocket,
    probe: ProbeConfig,
    idle_tick: Duration,
    nonce: u64,
    next_probe: Instant,
}

impl Transmitter {
    pub fn new(
        ctx: SharedContext,
        socket: UdpSocket,
        probe: ProbeConfig,
        idle_tick: Duration,
    ) -> Self {
        let next_probe = Instant::now() + probe.interval();
        Self {
            ctx,
            socket,
            probe,
            idle_tick,
            nonce: 0,
            next_probe,
        }
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("trans".to_string())
            .spawn(move || self.run())
    }

    fn run(mut self) {
        tracing::info!("transmitter starting");

        while !self.ctx.is_shutting_down() {
            self.flush_transmissions();

            while let Some(packet) = self.ctx.send_queue().try_pop() {
                let dispatch = route_packet(&self.ctx, packet);
                let sent = self.deliver(&dispatch);
                tracing::debug!(sent, route = ?dispatch.route, "packet sent");
            }

            if Instant::now() >= self.next_probe {
                self.probe_round();
                self.next_probe = Instant::now() + self.probe.interval();
            }

            if let Some(raw) = self.ctx.transmission_queue().pop_timeout(self.idle_tick) {
                self.dispatch(&raw);
            }
        }

        tracing::info!("transmitter shutting down");
    }

    fn flush_transmissions(&self) {
        while let Some(raw) = self.ctx.transmission_queue().try_pop() {
            self.dispatch(&raw);
        }
    }

    fn dispatch(&self, raw: &str) {
        match Dispatch::from_json_str(raw) {
            Ok(dispatch) => {
                self.deliver(&dispatch);
            }
            Err(e) => tracing::warn!(error = %e, "dropping malformed transmission entry"),
        }
    }

    /// Send one frame along its route. Returns how many datagrams went out.
    fn deliver(&self, dispatch: &Dispatch) -> usize {
        let bytes = match wire::encode(&dispatch.frame) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, kind = dispatch.frame.label(), "frame not sent");
                return 0;
            }
        };

        let mut sent = 0;
        for target in resolve_route(&self.ctx, &dispatch.route) {
            match self.socket.send_to(&bytes, target) {
                Ok(_) => {
                    sent += 1;
                    tracing::trace!(%target, kind = dispatch.frame.label(), "frame sent");
                }
                Err(e) => {
                    tracing::warn!(%target, error = %e, kind = dispatch.frame.label(), "send_to failed")
                }
            }
        }
        sent
    }

    fn probe_round(&mut self) {
        for (key, _) in self.ctx.topology().snapshot_peers() {
            if self.ctx.is_shutting_down() {
                return;
            }
            self.probe(&key);
        }
    }

    /// One ping/pong exchange through the signal channel. The receiver
    /// answers our request when the matching pong arrives; meanwhile the
    /// transmission queue keeps draining so our own pongs still go out.
    fn probe(&mut self, key: &PeerKey) -> Option<Rtt> {
        self.nonce += 1;
        let token = probe_token(key, self.nonce);
        let signal = self.ctx.signal();

        signal.post(SignalCode::Request, token.clone());
        let started = Instant::now();
        let sent = self.deliver(&Dispatch::to_peer(
            key.clone(),
            Frame::Ping { nonce: self.nonce },
        ));
        if sent == 0 {
            signal.clear();
            return None;
        }

        let deadline = started + self.probe.timeout();
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let answered = signal.wait_until((deadline - now).min(self.idle_tick), |s| {
                s.code == SignalCode::Response && s.payload == token
            });
            if answered.is_some() {
                let rtt = Rtt(started.elapsed());
                signal.clear();
                return match self.ctx.topology().record_latency(key.clone(), rtt) {
                    Ok(()) => Some(rtt),
                    Err(e) => {
                        tracing::warn!(error = %e, "latency for unknown peer discarded");
                        None
                    }
                };
            }
            self.flush_transmissions();
        }

        signal.clear();
        tracing::debug!(peer = %key, "probe timed out");
        None
    }
}

/// Decide where a console packet goes.
///
/// The hub, or a node that knows of no hub, sends straight to every peer.
/// Anyone else hands the packet to the hub to relay.
pub fn route_packet(ctx: &NodeContext, packet: String) -> Dispatch {
    let topology = ctx.topology();
    let origin = ctx.key();
    let name = ctx.name().to_string();
    match topology.hub_peer() {
        Some(hub) if !topology.is_hub() => Dispatch::to_peer(
            hub,
            Frame::Data {
                origin,
                name,
                forward: true,
                packet,
            },
        ),
        _ => Dispatch::to_all(
            None,
            Frame::Data {
                origin,
                name,
                forward: false,
                packet,
            },
        ),
    }
}

pub fn resolve_route(ctx: &NodeContext, route: &Route) -> Vec<SocketAddr> {
    match route {
        Route::Peer { key } => match key.socket_addr() {
            Ok(addr) => vec![addr],
            Err(e) => {
                tracing::warn!(peer = %key, error = %e, "peer key is not an address");
                Vec::new()
            }
        },
        Route::AllPeers { except } => ctx
            .topology()
            .snapshot_peers()
            .into_iter()
            .filter(|(key, _)| Some(key) != except.as_ref())
            .map(|(_, info)| info.socket_addr())
            .collect(),
    }
}
