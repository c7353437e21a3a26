use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use starnode_core::PeerKey;
use starnode_services::{PeerInfo, Rtt, Topology, TopologyError};

use crate::*;

fn peer(addr: &str) -> (PeerKey, PeerInfo) {
    let addr: SocketAddr = addr.parse().unwrap();
    (PeerKey::from(addr), PeerInfo::new(addr))
}

#[test]
fn directory_and_latency_laws() {
    let topo = Topology::new();
    let (key, info) = peer("10.0.0.5:9000");

    assert!(matches!(topo.lookup_peer(&key), Err(TopologyError::NotFound { .. })));

    topo.update_peer(key.clone(), info.clone());
    let mut renamed = info.clone();
    renamed.name = Some("bob".into());
    topo.update_peer(key.clone(), renamed.clone());
    assert_eq!(topo.lookup_peer(&key).unwrap(), renamed);
    assert_eq!(topo.snapshot_peers().len(), 1);

    assert_eq!(topo.latency_of(&key), None);
    topo.record_latency(key.clone(), Rtt::from_millis(42)).unwrap();
    assert_eq!(topo.latency_of(&key), Some(Rtt::from_millis(42)));

    let before = topo.is_hub();
    topo.toggle_hub();
    topo.toggle_hub();
    assert_eq!(topo.is_hub(), before);
}

#[test]
fn every_measured_peer_is_known() {
    let ctx = node("a", 4000, None);
    let workers: Vec<_> = (0..4)
        .map(|w| {
            let ctx = ctx.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    let (key, info) = peer(&format!("10.0.{w}.{}:9000", i % 250));
                    let known = i % 2 == 0;
                    if known {
                        ctx.topology().update_peer(key.clone(), info);
                    }
                    let recorded = ctx.topology().record_latency(key, Rtt::from_millis(i));
                    assert_eq!(recorded.is_ok(), known, "peer 10.0.{w}.{i}");
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let topo = ctx.topology();
    assert_eq!(topo.peer_count(), 4 * 100);
    for w in 0..4 {
        for i in 0..200u64 {
            let key = PeerKey::new(format!("10.0.{w}.{}:9000", i % 250));
            if topo.latency_of(&key).is_some() {
                assert!(topo.contains_peer(&key), "{key} measured but unknown");
            }
            if i % 2 == 1 {
                assert_eq!(topo.latency_of(&key), None);
            }
        }
    }
}

#[test]
fn readers_see_a_consistent_snapshot_while_writers_run() {
    let topo = Arc::new(Topology::new());
    let writer = {
        let topo = topo.clone();
        thread::spawn(move || {
            for i in 0..500u16 {
                let (key, info) = peer(&format!("10.1.0.1:{}", 1000 + i));
                topo.update_peer(key, info);
            }
        })
    };

    let mut last = 0;
    while last < 500 {
        let snap = topo.snapshot_peers();
        assert!(snap.len() >= last, "directory shrank");
        assert!(snap.windows(2).all(|w| w[0].0 < w[1].0), "snapshot out of order");
        last = snap.len();
    }
    writer.join().unwrap();
}
