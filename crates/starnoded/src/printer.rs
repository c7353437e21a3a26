//! Printer worker: sole consumer of the print queue.

use std::io::{self, Write};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use starnode_services::{NodeContext, SharedContext};

pub fn spawn(ctx: SharedContext, idle_tick: Duration) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("print".to_string())
        .spawn(move || run(&ctx, idle_tick, &mut io::stdout()))
}

fn run(ctx: &NodeContext, idle_tick: Duration, out: &mut impl Write) {
    while !ctx.is_shutting_down() {
        if let Some(line) = ctx.print_queue().pop_timeout(idle_tick) {
            emit(out, &line);
        }
    }
    for line in ctx.print_queue().drain() {
        emit(out, &line);
    }
}

fn emit(out: &mut impl Write, line: &str) {
    if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
        tracing::warn!(error = %e, "failed to print");
    }
    tracing::debug!(line, "printed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use starnode_core::NodeIdentity;

    #[test]
    fn flushes_queue_on_shutdown() {
        let ctx = NodeContext::new(
            NodeIdentity::new("a", "127.0.0.1".parse().unwrap(), 4000),
            4,
            None,
        );
        ctx.print_queue().push("first".into());
        ctx.print_queue().push("second".into());
        ctx.request_shutdown();

        let mut out = Vec::new();
        run(&ctx, Duration::from_millis(5), &mut out);

        assert_eq!(String::from_utf8(out).unwrap(), "first\nsecond\n");
        assert!(ctx.print_queue().is_empty());
    }
}
