//! starnoded: star-topology overlay peer node.

use std::io;
use std::net::UdpSocket;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use starnode_core::config::StarConfig;
use starnode_core::{Dispatch, Frame, NodeIdentity, PeerKey};
use starnode_services::{Console, NodeContext};

mod logging;
mod net;
mod printer;
mod receiver;
mod transmitter;

use receiver::Receiver;
use transmitter::Transmitter;

/// Peer node for a self-organizing star overlay.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Display name; also names the log file.
    name: String,
    /// Local UDP port to bind.
    port: u16,
    /// Point-of-contact address, or 0 to start a new network.
    poc_addr: String,
    /// Point-of-contact port.
    poc_port: u16,
    /// Maximum number of peers (advisory).
    max_nodes: usize,
    /// Path to the configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = StarConfig::load(args.config.as_deref()).context("failed to load config")?;
    let log_path = logging::init(&args.name, &config.log)?;

    let poc = net::point_of_contact(&args.poc_addr, args.poc_port)?;
    let local_addr = net::local_address(poc);

    let bind_addr = net::wildcard(poc, args.port);
    let socket = UdpSocket::bind(bind_addr)
        .with_context(|| format!("failed to bind UDP {bind_addr}"))?;

    let identity = NodeIdentity::new(args.name.as_str(), local_addr, args.port);
    let ctx = NodeContext::new(identity, args.max_nodes, poc).shared();
    tracing::info!(
        "Initialized node {} on {}:{}, max nodes {}, POC: {}",
        ctx.name(),
        ctx.addr(),
        ctx.port(),
        ctx.max_peers(),
        poc.map(|p| p.to_string()).unwrap_or_else(|| "none".to_string()),
    );

    bootstrap(&ctx)?;

    let idle_tick = config.network.idle_tick();
    let workers = [
        Transmitter::new(
            ctx.clone(),
            socket.try_clone().context("failed to clone socket")?,
            config.probe.clone(),
            idle_tick,
        )
        .spawn()
        .context("failed to start transmitter")?,
        Receiver::new(
            ctx.clone(),
            socket,
            config.files.storage_path.clone(),
            config.network.recv_buffer,
            idle_tick,
        )
        .context("failed to configure receiver socket")?
        .spawn()
        .context("failed to start receiver")?,
        printer::spawn(ctx.clone(), idle_tick).context("failed to start printer")?,
    ];

    let stdin = io::stdin();
    Console::new(ctx.clone(), log_path)
        .run(stdin.lock(), &mut io::stdout())
        .context("console failed")?;

    for worker in workers {
        let name = worker.thread().name().unwrap_or("worker").to_string();
        if worker.join().is_err() {
            tracing::error!(worker = %name, "worker panicked");
        }
    }
    tracing::info!("node stopped");
    Ok(())
}

/// Local hub policy: a seed node starts as the hub. A joining node queues a
/// `join` to its point-of-contact and learns the hub from the reply.
fn bootstrap(ctx: &NodeContext) -> Result<()> {
    match ctx.poc() {
        None => {
            ctx.topology().toggle_hub();
            tracing::info!("no point-of-contact, starting a new network as hub");
        }
        Some(poc) => {
            let join = Dispatch::to_peer(
                PeerKey::from(poc),
                Frame::Join {
                    name: ctx.name().to_string(),
                },
            );
            ctx.transmission_queue().push(join.to_json_string()?);
            tracing::info!(%poc, "joining via point-of-contact");
        }
    }
    Ok(())
}
