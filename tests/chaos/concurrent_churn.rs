//! Chaos test: many reader tasks route keys while one task churns the ring.
//!
//! The writer's churn script is replayed on a private ring first, so every
//! state it will publish is known. Each lookup must match one of those
//! states, and a pinned snapshot must never change underneath a reader.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cachering::{Ring, Snapshot};

const REPLICAS: usize = 40;
const STABLE: [&str; 3] = ["stable-0", "stable-1", "stable-2"];

/// Add `churn-i`, then drop the node added five steps earlier.
fn churn(ring: &Ring, i: usize) {
    ring.add_node(&format!("churn-{i}"));
    if i >= 5 {
        ring.remove(&format!("churn-{}", i - 5));
    }
}

/// Every snapshot the churn script publishes, in order.
fn published_states() -> Vec<Arc<Snapshot>> {
    let shadow = Ring::new(REPLICAS, None);
    shadow.add(STABLE);
    let mut states = vec![shadow.snapshot()];
    for i in 0..100 {
        shadow.add_node(&format!("churn-{i}"));
        states.push(shadow.snapshot());
        if i >= 5 {
            shadow.remove(&format!("churn-{}", i - 5));
            states.push(shadow.snapshot());
        }
    }
    states
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(60000)]
async fn test_readers_never_observe_torn_state() {
    let states = Arc::new(published_states());
    let ring = Arc::new(Ring::new(REPLICAS, None));
    ring.add(STABLE);
    let done = Arc::new(AtomicBool::new(false));

    let mut readers = Vec::new();
    for t in 0..8 {
        let ring = Arc::clone(&ring);
        let states = Arc::clone(&states);
        let done = Arc::clone(&done);
        readers.push(tokio::spawn(async move {
            let mut n = 0u64;
            while !done.load(Ordering::Acquire) || n < 2_000 {
                let key = format!("t{t}-k{}", n % 97);
                let got = ring.get(&key);
                let h = ring.hash_fn().hash(key.as_bytes());
                assert!(
                    states.iter().any(|s| s.locate(h) == got.as_deref()),
                    "owner {got:?} of {key} matches no published state"
                );

                if n % 100 == 0 {
                    let pinned = ring.snapshot();
                    let copy = (*pinned).clone();
                    tokio::task::yield_now().await;
                    assert_eq!(*pinned, copy, "pinned snapshot changed");
                    assert!(states.iter().any(|s| **s == *pinned));
                }
                n += 1;
                if n % 256 == 0 {
                    tokio::task::yield_now().await;
                }
            }
            n
        }));
    }

    let writer = {
        let ring = Arc::clone(&ring);
        let done = Arc::clone(&done);
        tokio::spawn(async move {
            for i in 0..100 {
                churn(&ring, i);
                tokio::task::yield_now().await;
            }
            done.store(true, Ordering::Release);
        })
    };

    writer.await.unwrap();
    for r in readers {
        assert!(r.await.unwrap() >= 2_000);
    }

    let snap = ring.snapshot();
    assert_eq!(*snap, **states.last().unwrap());
    // Three stable nodes plus the last five churned ones.
    assert_eq!(snap.node_count(), 8);
}
