use starnode_core::{Packet, PeerKey};
use starnode_services::{Console, Flow, PeerInfo, Rtt};

use crate::*;

#[test]
fn send_hello_queues_one_msg_packet() {
    let ctx = node("A", 4000, None);
    assert!(ctx.is_seed());
    let console = Console::new(ctx.clone(), scratch("unused.log"));

    run_line(&console, "send \"hello\"");
    assert_eq!(ctx.send_queue().len(), 1);

    let raw = ctx.send_queue().try_pop().expect("queued packet");
    assert_eq!(Packet::from_json_str(&raw).unwrap(), Packet::message("hello"));
    assert_eq!(ctx.send_queue().len(), 0);
}

#[test]
fn status_shows_measured_peer() {
    let ctx = node("A", 4000, None);
    let console = Console::new(ctx.clone(), scratch("unused.log"));

    // What the receiver and transmitter record for a measured peer.
    let addr = "10.0.0.5:9000".parse().unwrap();
    ctx.topology()
        .update_peer(PeerKey::new("10.0.0.5:9000"), PeerInfo::new(addr));
    ctx.topology()
        .record_latency(PeerKey::new("10.0.0.5:9000"), "42ms".parse::<Rtt>().unwrap())
        .unwrap();

    let text = run_line(&console, "show-status");
    let line = text
        .lines()
        .find(|l| l.contains("10.0.0.5"))
        .unwrap_or_else(|| panic!("no line for peer in:\n{text}"));
    assert!(line.contains("PORT: 9000"), "{line}");
    assert!(line.contains("42ms"), "{line}");
    assert!(text.starts_with("--BEGIN STATUS--"));
    assert!(text.trim_end().ends_with("--END STATUS--"));
}

#[test]
fn unknown_commands_are_recoverable() {
    let ctx = node("A", 4000, None);
    let console = Console::new(ctx.clone(), scratch("unused.log"));

    let mut out = Vec::new();
    assert!(console.handle_line("launch", &mut out).is_err());
    assert_eq!(
        console.handle_line("show-status", &mut out).unwrap(),
        Flow::Continue
    );
    assert_eq!(
        console.handle_line("disconnect", &mut out).unwrap(),
        Flow::Disconnect
    );
}

#[test]
fn show_log_prints_the_log_file() {
    let ctx = node("A", 4000, None);
    let path = scratch("node-A.log");
    std::fs::write(&path, "2026-10-17 - main - INFO - Initialized node A\n").unwrap();
    let console = Console::new(ctx, path.clone());

    let text = run_line(&console, "show-log");
    assert!(text.contains("Initialized node A"));
    assert!(text.starts_with("--BEGIN LOG--\n"));
    assert!(text.ends_with("--END LOG--\n"));

    let _ = std::fs::remove_file(&path);
}
