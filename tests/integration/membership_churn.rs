//! Integration test: membership churn.
//!
//! Repeated joins and leaves keep the ring consistent and never lose an
//! object that the pool migrated.

use cachering::HashFn;
use cachering_tests::{PeerPool, test_data_seeded};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[tokio::test]
#[ntest::timeout(60000)]
async fn test_random_churn_keeps_objects_readable() {
    let mut rng = StdRng::seed_from_u64(7);
    let pool = PeerPool::new(64);
    let mut live: Vec<String> = Vec::new();

    for i in 0..4 {
        let name = format!("peer-{i}");
        pool.join(&name).await;
        live.push(name);
    }
    for i in 0..400u32 {
        pool.put(&format!("obj-{i}"), test_data_seeded(24, i)).await;
    }

    let mut next_id = 4;
    for round in 0..20 {
        if live.len() > 2 && rng.random_bool(0.5) {
            let idx = rng.random_range(0..live.len());
            let name = live.swap_remove(idx);
            pool.leave(&name).await;
        } else {
            let name = format!("peer-{next_id}");
            next_id += 1;
            pool.join(&name).await;
            live.push(name);
        }

        let snap = pool.ring().snapshot();
        assert!(snap.is_consistent(), "ring inconsistent after round {round}");
        assert_eq!(snap.node_count(), live.len());

        for i in 0..400u32 {
            assert_eq!(
                pool.get(&format!("obj-{i}")).await,
                Some(test_data_seeded(24, i)),
                "obj-{i} lost in round {round}"
            );
        }
    }
}

#[tokio::test]
#[ntest::timeout(30000)]
async fn test_join_then_leave_restores_ring() {
    let pool = PeerPool::new(32);
    for peer in ["a", "b", "c"] {
        pool.join(peer).await;
    }
    let before = pool.ring().snapshot();

    pool.join("temp").await;
    pool.leave("temp").await;

    assert_eq!(*pool.ring().snapshot(), *before);
}

#[tokio::test]
#[ntest::timeout(30000)]
async fn test_last_peer_leaving_empties_ring() {
    let pool = PeerPool::new(16);
    pool.join("solo").await;
    pool.put("k", vec![9]).await;

    pool.leave("solo").await;
    assert!(pool.ring().is_empty());
    assert_eq!(pool.get("k").await, None);
}

/// Parses the input as a decimal number, so labels and keys land at
/// predictable positions ("12" -> 12).
fn numeric_hash() -> HashFn {
    HashFn::custom(|data| {
        std::str::from_utf8(data)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    })
}

#[tokio::test]
#[ntest::timeout(30000)]
async fn test_leave_after_partial_removal_keeps_routed_entries() {
    // Peer "2" sits at 2, 12, 22. Peer "12" sits at 12 ("012"), 112, 212
    // and takes over position 12, so removing "2" stops after position 2.
    let pool = PeerPool::with_hash(3, numeric_hash());
    pool.join("2").await;
    pool.join("12").await;

    // "0" -> 2 and "15" -> 22 belong to "2"; "100" -> 112 belongs to "12".
    for key in ["0", "15", "100"] {
        pool.put(key, key.as_bytes().to_vec()).await;
    }
    assert_eq!(pool.peer_load().await["2"], 2);

    let moved = pool.leave("2").await;
    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].key, "0");
    assert_eq!(moved[0].to.as_deref(), Some("12"));

    // "15" still routes to "2" through position 22 and must stay readable.
    assert_eq!(pool.ring().get("15").as_deref(), Some("2"));
    for key in ["0", "15", "100"] {
        assert_eq!(pool.get(key).await, Some(key.as_bytes().to_vec()), "key {key}");
    }
    let load = pool.peer_load().await;
    assert_eq!(load["2"], 1);
    assert_eq!(load["12"], 2);
}
