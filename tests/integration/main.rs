//! Star node integration tests.
//!
//! These drive the shared state the way the node's workers do: several
//! threads against one context, and the console against the same queues
//! the transmitter drains. No sockets are opened here.
//!
//!   cargo test --test integration

use std::net::SocketAddr;
use std::path::PathBuf;

use starnode_core::NodeIdentity;
use starnode_services::{NodeContext, SharedContext};

mod console;
mod queues;
mod topology;

// ── Harness ───────────────────────────────────────────────────────────────────

/// A fresh node context on loopback. `poc` of `None` makes a seed node.
pub fn node(name: &str, port: u16, poc: Option<SocketAddr>) -> SharedContext {
    NodeContext::new(
        NodeIdentity::new(name, "127.0.0.1".parse().unwrap(), port),
        16,
        poc,
    )
    .shared()
}

/// A per-process scratch path; callers clean up.
pub fn scratch(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("starnode-it-{tag}-{}", std::process::id()))
}

/// Run a console command line and return what it printed.
pub fn run_line(console: &starnode_services::Console, line: &str) -> String {
    let mut out = Vec::new();
    console
        .handle_line(line, &mut out)
        .unwrap_or_else(|e| panic!("{line:?} failed: {e}"));
    String::from_utf8(out).unwrap()
}
