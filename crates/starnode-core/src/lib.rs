//! starnode-core: shared types, packet and datagram formats, console commands,
//! and configuration. All other star-node crates depend on this one.

pub mod command;
pub mod config;
pub mod identity;
pub mod packet;
pub mod wire;

pub use command::{Command, CommandError};
pub use identity::{NodeIdentity, PeerKey};
pub use packet::{Packet, PacketError, PacketKind};
pub use wire::{Dispatch, Frame, PeerRecord, Route, WireError};
