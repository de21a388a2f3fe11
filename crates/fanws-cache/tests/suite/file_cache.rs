use fanws_cache::{estimate_size, FileCache};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Set(u8, usize),
    Get(u8),
    Remove(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..16, 0usize..200).prop_map(|(key, len)| Op::Set(key, len)),
        (0u8..16).prop_map(Op::Get),
        (0u8..16).prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn size_never_exceeds_budget(max_bytes in 0u64..1_000, ops in prop::collection::vec(op(), 1..64)) {
        let cache = FileCache::with_max_bytes(max_bytes);
        for op in ops {
            match op {
                Op::Set(key, len) => cache.set(format!("k{key}"), "x".repeat(len)),
                Op::Get(key) => {
                    cache.get(&format!("k{key}"));
                }
                Op::Remove(key) => {
                    cache.remove(&format!("k{key}"));
                }
            }
            prop_assert!(cache.current_size_bytes() <= max_bytes);
        }

        // The running total always matches the entries actually held.
        let recomputed: u64 = cache
            .keys()
            .iter()
            .filter_map(|key| cache.get(key))
            .map(|value| estimate_size(value.as_str()))
            .sum();
        prop_assert_eq!(recomputed, cache.current_size_bytes());
    }
}

#[test]
fn clear_then_get_is_none_for_every_key() {
    let cache = FileCache::new(1);
    let keys: Vec<String> = (0..32).map(|i| format!("scene-{i}")).collect();
    for key in &keys {
        cache.set(key.clone(), vec![1u32, 2, 3]);
    }
    assert_eq!(cache.len(), keys.len());

    cache.clear();
    assert_eq!(cache.current_size_mb(), 0.0);
    for key in &keys {
        assert!(cache.get(key).is_none());
    }
}

#[test]
fn values_outlive_eviction() {
    let cache = FileCache::with_max_bytes(12);
    cache.set("a", "x".repeat(10));
    let held = cache.get("a").unwrap();
    cache.set("b", "y".repeat(10));

    assert!(cache.get("a").is_none());
    assert_eq!(held.len(), 10);
}
