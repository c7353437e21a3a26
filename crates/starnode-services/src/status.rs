//! `show-status` rendering.

use std::io::{self, Write};

use crate::context::NodeContext;
use crate::topology::StatusRow;

pub const BEGIN: &str = "--BEGIN STATUS--";
pub const END: &str = "--END STATUS--";

/// Write the status block: the hub, one line per known peer, then the RTT sum.
pub fn render(ctx: &NodeContext, out: &mut impl Write) -> io::Result<()> {
    let topology = ctx.topology();
    writeln!(out, "{BEGIN}")?;

    if topology.is_hub() {
        writeln!(out, "HUB: this node ({})", ctx.identity())?;
    } else {
        match topology.hub_peer() {
            Some(key) => writeln!(out, "HUB: {key}")?,
            None => writeln!(out, "HUB: none known")?,
        }
    }

    for row in topology.status_rows() {
        writeln!(out, "{}", peer_line(&row))?;
    }

    writeln!(out, "RTT SUM: {}", topology.rtt_sum())?;
    writeln!(out, "{END}")
}

/// `ADDRESS: <ip> PORT: <port> RTT: <rtt|unmeasured>`, then the name and hub
/// marker when known.
pub fn peer_line(row: &StatusRow) -> String {
    let rtt = row
        .rtt
        .map(|r| r.to_string())
        .unwrap_or_else(|| "unmeasured".to_string());
    let mut line = format!(
        "ADDRESS: {} PORT: {} RTT: {}",
        row.info.addr, row.info.port, rtt
    );
    if let Some(name) = &row.info.name {
        line.push_str(&format!(" NAME: {name}"));
    }
    if row.info.hub {
        line.push_str(" (hub)");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{PeerInfo, Rtt};
    use starnode_core::{NodeIdentity, PeerKey};
    use std::net::SocketAddr;

    fn render_to_string(ctx: &NodeContext) -> String {
        let mut buf = Vec::new();
        render(ctx, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn ctx() -> NodeContext {
        NodeContext::new(
            NodeIdentity::new("a", "10.0.0.1".parse().unwrap(), 4000),
            8,
            None,
        )
    }

    #[test]
    fn empty_directory() {
        let text = render_to_string(&ctx());
        assert_eq!(
            text,
            "--BEGIN STATUS--\nHUB: none known\nRTT SUM: 0ms\n--END STATUS--\n"
        );
    }

    #[test]
    fn measured_and_unmeasured_peers() {
        let ctx = ctx();
        let a: SocketAddr = "10.0.0.5:9000".parse().unwrap();
        let b: SocketAddr = "10.0.0.6:9001".parse().unwrap();
        ctx.topology().update_peer(PeerKey::from(a), PeerInfo::named(a, "bob"));
        ctx.topology().update_peer(PeerKey::from(b), PeerInfo::new(b));
        ctx.topology()
            .record_latency(PeerKey::from(a), Rtt::from_millis(42))
            .unwrap();

        let text = render_to_string(&ctx);
        assert!(text.contains("ADDRESS: 10.0.0.5 PORT: 9000 RTT: 42ms NAME: bob\n"));
        assert!(text.contains("ADDRESS: 10.0.0.6 PORT: 9001 RTT: unmeasured\n"));
        assert!(text.contains("RTT SUM: 42ms"));
    }

    #[test]
    fn hub_line_follows_flags() {
        let ctx = ctx();
        let h: SocketAddr = "10.0.0.9:1".parse().unwrap();
        let mut info = PeerInfo::new(h);
        info.hub = true;
        ctx.topology().update_peer(PeerKey::from(h), info);
        assert!(render_to_string(&ctx).contains("HUB: 10.0.0.9:1\n"));
        assert!(render_to_string(&ctx).contains("(hub)"));

        ctx.topology().toggle_hub();
        assert!(render_to_string(&ctx).contains("HUB: this node (a:10.0.0.1:4000)"));
    }
}
