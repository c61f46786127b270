//! Property-Based Tests for the document cache

use proptest::prelude::*;
use serde_json::json;
use std::collections::{HashMap, HashSet};

use crate::cache::CacheStore;
use crate::store::{Document, Fields};

const TEST_DEFAULT_TTL: u64 = 300;

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}".prop_map(|id| format!("users/{}", id))
}

fn doc(key: &str, version: u32) -> Document {
    let mut fields = Fields::new();
    fields.insert("version".into(), json!(version));
    Document {
        id: key.rsplit('/').next().unwrap_or(key).to_string(),
        fields,
        create_time: None,
        update_time: None,
    }
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set(String),
    Get(String),
    Invalidate(String),
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        key_strategy().prop_map(CacheOp::Set),
        key_strategy().prop_map(CacheOp::Get),
        key_strategy().prop_map(CacheOp::Invalidate),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Hit and miss counters match the outcome of every read.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let mut cache = CacheStore::new(16, TEST_DEFAULT_TTL);
        let mut hits = 0u64;
        let mut misses = 0u64;

        for (version, op) in ops.into_iter().enumerate() {
            match op {
                CacheOp::Set(key) => {
                    cache.set(&key, doc(&key, version as u32), None).unwrap();
                }
                CacheOp::Get(key) => match cache.get(&key) {
                    Ok(_) => hits += 1,
                    Err(_) => misses += 1,
                },
                CacheOp::Invalidate(key) => {
                    cache.invalidate(&key);
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, hits);
        prop_assert_eq!(stats.misses, misses);
        prop_assert_eq!(stats.total_entries, cache.len());
    }

    // The cache never exceeds capacity, and reads return the latest write
    // for every key still cached.
    #[test]
    fn prop_capacity_and_latest_write(
        capacity in 1usize..12,
        ops in prop::collection::vec(cache_op_strategy(), 1..80),
    ) {
        let mut cache = CacheStore::new(capacity, TEST_DEFAULT_TTL);
        let mut latest: HashMap<String, u32> = HashMap::new();

        for (version, op) in ops.into_iter().enumerate() {
            let version = version as u32;
            match op {
                CacheOp::Set(key) => {
                    cache.set(&key, doc(&key, version), None).unwrap();
                    latest.insert(key, version);
                }
                CacheOp::Get(key) => {
                    if let Ok(found) = cache.get(&key) {
                        prop_assert_eq!(&found.fields["version"], &json!(latest[&key]));
                    }
                }
                CacheOp::Invalidate(key) => {
                    cache.invalidate(&key);
                    latest.remove(&key);
                }
            }
            prop_assert!(cache.len() <= capacity);
        }
    }

    // Filling past capacity evicts exactly the earliest inserted keys.
    #[test]
    fn prop_lru_eviction_order(
        keys in prop::collection::hash_set(key_strategy(), 2..20),
        capacity in 1usize..10,
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let mut cache = CacheStore::new(capacity, TEST_DEFAULT_TTL);
        for (i, key) in keys.iter().enumerate() {
            cache.set(key, doc(key, i as u32), None).unwrap();
        }

        let kept: HashSet<&String> = keys.iter().rev().take(capacity).collect();
        for key in &keys {
            prop_assert_eq!(cache.get(key).is_ok(), kept.contains(key));
        }
        prop_assert_eq!(
            cache.stats().evictions as usize,
            keys.len().saturating_sub(capacity)
        );
    }
}
