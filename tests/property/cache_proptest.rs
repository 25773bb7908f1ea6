//! Property-based tests for the recent-message cache and message counters

use proptest::prelude::*;
use std::time::Duration;
use uuid::Uuid;

use teamchat::backend::cache::{EphemeralCache, MemoryCache};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("test runtime")
}

proptest! {
    #[test]
    fn test_recent_set_never_exceeds_capacity(
        scores in prop::collection::vec(0i64..1_000_000, 1..60),
        capacity in 1usize..20,
    ) {
        let cache = MemoryCache::new();
        let room = Uuid::new_v4();
        let (sizes, entries) = runtime().block_on(async {
            let mut sizes = Vec::new();
            for (i, score) in scores.iter().enumerate() {
                let payload = format!("{}:{}", i, score);
                sizes.push(cache.push_recent_message(room, *score, &payload, capacity).await.unwrap());
            }
            (sizes, cache.recent_messages(room).await.unwrap())
        });

        prop_assert!(sizes.iter().all(|size| *size <= capacity));
        prop_assert_eq!(entries.len(), scores.len().min(capacity));
    }

    #[test]
    fn test_recent_set_keeps_highest_scores(
        scores in prop::collection::hash_set(0i64..1_000_000, 1..40),
        capacity in 1usize..10,
    ) {
        let cache = MemoryCache::new();
        let room = Uuid::new_v4();
        let scores: Vec<i64> = scores.into_iter().collect();
        let entries = runtime().block_on(async {
            for score in &scores {
                cache.push_recent_message(room, *score, &score.to_string(), capacity).await.unwrap();
            }
            cache.recent_messages(room).await.unwrap()
        });

        let mut expected = scores.clone();
        expected.sort_unstable();
        let expected: Vec<String> = expected
            .iter()
            .rev()
            .take(capacity)
            .rev()
            .map(|score| score.to_string())
            .collect();
        prop_assert_eq!(entries, expected);
    }

    #[test]
    fn test_counter_counts_every_increment(increments in 1u64..50) {
        let cache = MemoryCache::new();
        let room = Uuid::new_v4();
        let (last, stored) = runtime().block_on(async {
            let mut last = 0;
            for _ in 0..increments {
                last = cache
                    .increment_message_count("alice", room, Duration::from_secs(60))
                    .await
                    .unwrap();
            }
            (last, cache.message_count("alice", room).await.unwrap())
        });
        prop_assert_eq!(last, increments);
        prop_assert_eq!(stored, increments);
    }
}
