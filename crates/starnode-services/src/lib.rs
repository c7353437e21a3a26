//! starnode-services: the node's shared concurrent state.
//!
//! Everything here is shared between the console, transmitter, receiver and
//! printer threads through one [`SharedContext`]. Each resource carries its
//! own lock and no operation takes two of them at once.

pub mod console;
pub mod context;
pub mod queue;
pub mod signal;
pub mod status;
pub mod topology;

pub use console::{Console, ConsoleError, Flow};
pub use context::{NodeContext, SharedContext};
pub use queue::{QueueError, WorkQueue};
pub use signal::{Signal, SignalChannel, SignalCode};
pub use topology::{PeerInfo, Rtt, StatusRow, Topology, TopologyError};
