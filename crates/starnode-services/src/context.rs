//! Node context: one shared handle over identity, topology, queues and the
//! signal channel.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use starnode_core::{NodeIdentity, PeerKey};

use crate::queue::WorkQueue;
use crate::signal::SignalChannel;
use crate::topology::Topology;

/// The context as handed to each worker at spawn time.
pub type SharedContext = Arc<NodeContext>;

#[derive(Debug)]
pub struct NodeContext {
    identity: NodeIdentity,
    max_peers: usize,
    poc: Option<SocketAddr>,
    topology: Topology,
    transmission: WorkQueue,
    send: WorkQueue,
    print: WorkQueue,
    signal: SignalChannel,
    shutdown: AtomicBool,
}

impl NodeContext {
    /// `max_peers` is advisory. `poc` is the point-of-contact; `None` makes
    /// this node the network's seed.
    pub fn new(identity: NodeIdentity, max_peers: usize, poc: Option<SocketAddr>) -> Self {
        Self {
            identity,
            max_peers,
            poc,
            topology: Topology::new(),
            transmission: WorkQueue::new("transmission"),
            send: WorkQueue::new("send"),
            print: WorkQueue::new("print"),
            signal: SignalChannel::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn shared(self) -> SharedContext {
        Arc::new(self)
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn addr(&self) -> IpAddr {
        self.identity.addr()
    }

    pub fn port(&self) -> u16 {
        self.identity.port()
    }

    pub fn key(&self) -> PeerKey {
        self.identity.key()
    }

    pub fn max_peers(&self) -> usize {
        self.max_peers
    }

    pub fn poc(&self) -> Option<SocketAddr> {
        self.poc
    }

    pub fn is_seed(&self) -> bool {
        self.poc.is_none()
    }

    /// Whether the directory has reached the advisory peer limit.
    pub fn at_capacity(&self) -> bool {
        self.topology.peer_count() >= self.max_peers
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn transmission_queue(&self) -> &WorkQueue {
        &self.transmission
    }

    pub fn send_queue(&self) -> &WorkQueue {
        &self.send
    }

    pub fn print_queue(&self) -> &WorkQueue {
        &self.print
    }

    pub fn signal(&self) -> &SignalChannel {
        &self.signal
    }

    /// Ask every worker to stop at its next idle tick.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}
