use std::sync::Arc;
use std::thread;

use starnode_services::{QueueError, WorkQueue};

use crate::*;

#[test]
fn fifo_law_holds_for_single_consumer() {
    let q = WorkQueue::new("send");
    let pushed: Vec<String> = (0..100).map(|i| format!("packet-{i}")).collect();
    for item in &pushed {
        q.push(item.clone());
    }
    let popped: Vec<String> = (0..pushed.len()).map(|_| q.pop().unwrap()).collect();
    assert_eq!(popped, pushed);
    assert_eq!(q.pop(), Err(QueueError::Empty { queue: "send" }));
}

#[test]
fn concurrent_pushes_preserve_cardinality() {
    const PER_PRODUCER: usize = 2_000;
    let ctx = node("a", 4000, None);

    let producers: Vec<_> = ["console", "receiver"]
        .into_iter()
        .map(|who| {
            let ctx = ctx.clone();
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    ctx.transmission_queue().push(format!("{who}-{i}"));
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }

    let mut items = ctx.transmission_queue().drain();
    assert_eq!(items.len(), 2 * PER_PRODUCER);
    items.sort();
    items.dedup();
    assert_eq!(items.len(), 2 * PER_PRODUCER, "an item was duplicated");
}

#[test]
fn each_producer_keeps_its_own_order() {
    const PER_PRODUCER: usize = 1_000;
    let q = Arc::new(WorkQueue::new("print"));

    let producers: Vec<_> = (0..2)
        .map(|p| {
            let q = q.clone();
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    q.push((p, i));
                }
            })
        })
        .collect();

    // Single consumer draining while producers run.
    let mut seen = Vec::new();
    while seen.len() < 2 * PER_PRODUCER {
        if let Some(item) = q.pop_timeout(std::time::Duration::from_secs(5)) {
            seen.push(item);
        } else {
            panic!("producers stalled");
        }
    }
    for p in producers {
        p.join().unwrap();
    }

    for producer in 0..2 {
        let order: Vec<usize> = seen
            .iter()
            .filter(|(p, _)| *p == producer)
            .map(|(_, i)| *i)
            .collect();
        assert_eq!(order, (0..PER_PRODUCER).collect::<Vec<_>>());
    }
}

#[test]
fn busy_queue_does_not_block_the_others() {
    let ctx = node("a", 4000, None);
    let waiter = {
        let ctx = ctx.clone();
        thread::spawn(move || ctx.send_queue().pop_timeout(std::time::Duration::from_secs(5)))
    };
    // The send-queue waiter holds no lock while parked.
    ctx.print_queue().push("printed".into());
    assert_eq!(ctx.print_queue().try_pop().as_deref(), Some("printed"));
    ctx.send_queue().push("sent".into());
    assert_eq!(waiter.join().unwrap().as_deref(), Some("sent"));
}
