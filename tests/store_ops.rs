// ==============================================
// STORE BEHAVIOR TESTS (integration)
// ==============================================
//
// End-to-end properties of KvStore across its public surface: round-trips,
// recency ordering, copy-on-write clones, size-class migration, and
// accounting. Unit-level behavior lives with each module.

use bytekv::prelude::*;

fn filled(pairs: &[(&[u8], &[u8])]) -> KvStore {
    let mut store = KvStore::new();
    for (k, v) in pairs {
        store.put(k, v).unwrap();
    }
    store
}

// ==============================================
// Round-trip, overwrite, delete
// ==============================================

#[test]
fn round_trip_returns_stored_value() {
    let mut store = KvStore::new();
    store.put(b"key", b"value").unwrap();
    assert_eq!(store.get(b"key"), Some(&b"value"[..]));
}

#[test]
fn overwrite_replaces_value_without_growing() {
    let mut store = KvStore::new();
    store.put(b"k", b"v1").unwrap();
    store.put(b"k", b"v2").unwrap();
    assert_eq!(store.get(b"k"), Some(&b"v2"[..]));
    assert_eq!(store.len(), 1);
}

#[test]
fn delete_returns_value_and_forgets_key() {
    let mut store = KvStore::new();
    store.put(b"k", b"v").unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.delete(b"k"), Some(b"v".to_vec()));
    assert_eq!(store.get(b"k"), None);
    assert_eq!(store.len(), 0);
}

#[test]
fn absent_key_operations_report_absent() {
    let mut store = KvStore::new();
    assert_eq!(store.get(b"nope"), None);
    assert_eq!(store.delete(b"nope"), None);
    assert_eq!(store.bump_recent(b"nope"), None);
    assert_eq!(store.bump_least_recent(b"nope"), None);
    assert!(!store.contains(b"nope"));
    assert_eq!(store.first(), None);
    assert_eq!(store.pop_first(), None);
}

// ==============================================
// Order preservation
// ==============================================

#[test]
fn insertion_order_is_preserved() {
    let store = filled(&[(b"a", b"1"), (b"b", b"2"), (b"c", b"3")]);
    let keys = store.keys();
    assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
}

#[test]
fn bump_recent_moves_key_to_the_end() {
    let mut store = filled(&[(b"a", b"1"), (b"b", b"2"), (b"c", b"3")]);
    assert_eq!(store.bump_recent(b"a"), Some(&b"1"[..]));
    assert_eq!(store.keys(), vec![b"b".to_vec(), b"c".to_vec(), b"a".to_vec()]);

    assert_eq!(store.bump_least_recent(b"c"), Some(&b"3"[..]));
    assert_eq!(store.keys(), vec![b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);
}

#[test]
fn bump_on_the_end_key_is_a_no_op() {
    let mut store = filled(&[(b"a", b"1"), (b"b", b"2"), (b"c", b"3")]);
    let before = store.entries();
    store.bump_recent(b"c");
    assert_eq!(store.entries(), before);
    store.bump_least_recent(b"a");
    assert_eq!(store.entries(), before);
}

#[test]
fn overwrite_refreshes_recency() {
    let mut store = filled(&[(b"a", b"1"), (b"b", b"2")]);
    store.put(b"a", b"1'").unwrap();
    assert_eq!(store.keys(), vec![b"b".to_vec(), b"a".to_vec()]);
}

#[test]
fn first_and_pop_first_work_from_the_oldest_end() {
    let mut store = filled(&[(b"a", b"1"), (b"b", b"2")]);
    assert_eq!(store.first(), Some((&b"a"[..], &b"1"[..])));
    assert_eq!(store.pop_first(), Some((b"a".to_vec(), b"1".to_vec())));
    assert_eq!(store.first(), Some((&b"b"[..], &b"2"[..])));
    assert_eq!(store.len(), 1);
}

#[test]
fn insert_as_oldest_lands_at_the_front() {
    let mut store = filled(&[(b"a", b"1"), (b"b", b"2")]);
    store.insert_as_oldest(b"z", b"0").unwrap();
    assert_eq!(store.keys(), vec![b"z".to_vec(), b"a".to_vec(), b"b".to_vec()]);

    // Overwriting through insert_as_oldest also moves an existing key.
    store.insert_as_oldest(b"b", b"2'").unwrap();
    assert_eq!(store.keys(), vec![b"b".to_vec(), b"z".to_vec(), b"a".to_vec()]);
    assert_eq!(store.get(b"b"), Some(&b"2'"[..]));
}

#[test]
fn iter_is_lazy_and_restartable() {
    let store = filled(&[(b"a", b"1"), (b"b", b"2"), (b"c", b"3")]);
    let first_pass: Vec<_> = store.iter().map(|(k, _)| k.to_vec()).collect();
    let second_pass: Vec<_> = store.iter().map(|(k, _)| k.to_vec()).collect();
    assert_eq!(first_pass, second_pass);

    let mut it = store.iter();
    assert_eq!(it.next().map(|(k, _)| k), Some(&b"a"[..]));
    drop(it);
    assert_eq!(store.iter().count(), 3);

    let via_ref: Vec<_> = (&store).into_iter().map(|(_, v)| v.to_vec()).collect();
    assert_eq!(via_ref, store.values());
}

// ==============================================
// Copy-on-write clones
// ==============================================

#[test]
fn clone_shares_then_diverges_on_write() {
    let mut original = filled(&[(b"k", b"before"), (b"other", b"same")]);
    let mut copy = original.clone();

    copy.put(b"k", b"after!").unwrap();
    assert_eq!(original.get(b"k"), Some(&b"before"[..]));
    assert_eq!(copy.get(b"k"), Some(&b"after!"[..]));

    // The untouched key is still byte-identical in both.
    assert_eq!(original.get(b"other"), copy.get(b"other"));

    // Writes to the original do not leak into the clone either.
    original.put(b"other", b"diff").unwrap();
    assert_eq!(copy.get(b"other"), Some(&b"same"[..]));

    original.check_invariants().unwrap();
    copy.check_invariants().unwrap();
}

#[test]
fn clone_from_replaces_previous_contents() {
    let source = filled(&[(b"a", b"1"), (b"b", b"2")]);
    let mut target = filled(&[(b"x", b"9")]);
    target.clone_from(&source);
    assert_eq!(target.entries(), source.entries());
    assert_eq!(target.get(b"x"), None);
}

#[test]
fn deleting_in_clone_leaves_original_intact() {
    let original = filled(&[(b"a", b"1"), (b"b", b"2")]);
    let mut copy = original.clone();
    assert_eq!(copy.delete(b"a"), Some(b"1".to_vec()));
    assert_eq!(original.get(b"a"), Some(&b"1"[..]));
    assert_eq!(original.len(), 2);
    assert_eq!(copy.len(), 1);
}

#[test]
fn clone_preserves_reordered_sequence() {
    let mut store = filled(&[(b"a", b"1"), (b"b", b"2"), (b"c", b"3")]);
    store.bump_recent(b"a");
    let copy = store.clone();
    assert_eq!(copy.keys(), store.keys());
}

// ==============================================
// Capacity and accounting
// ==============================================

#[test]
fn thousand_keys_fill_and_drain() {
    let mut store = KvStore::new();
    for i in 0..1000u32 {
        let key = i.to_le_bytes();
        store.put(&key, format!("value-{i}").as_bytes()).unwrap();
    }
    assert_eq!(store.len(), 1000);
    for i in 0..1000u32 {
        let key = i.to_le_bytes();
        assert_eq!(store.get(&key), Some(format!("value-{i}").as_bytes()));
    }
    store.check_invariants().unwrap();

    for i in 0..1000u32 {
        let key = i.to_le_bytes();
        assert!(store.delete(&key).is_some());
    }
    assert!(store.is_empty());
    assert_eq!(store.payload_size(), 0);
    store.check_invariants().unwrap();
}

#[test]
fn payload_size_tracks_live_records() {
    let mut store = KvStore::new();
    assert_eq!(store.payload_size(), 0);
    store.put(b"key", b"value").unwrap();
    // compact header (2) + key (3) + value (5)
    assert_eq!(store.payload_size(), 10);
    store.put(b"key2", &[0u8; 300]).unwrap();
    // extended header (8) + key (4) + value (300)
    assert_eq!(store.payload_size(), 10 + 312);
    store.delete(b"key");
    assert_eq!(store.payload_size(), 312);
}

#[test]
fn footprint_exceeds_payload_once_allocated() {
    let mut store = KvStore::new();
    store.put(b"k", b"v").unwrap();
    assert!(store.footprint() > store.payload_size());
}

#[test]
fn clear_resets_everything() {
    let mut store = filled(&[(b"a", b"1"), (b"b", b"2")]);
    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.payload_size(), 0);
    assert_eq!(store.keys(), Vec::<Vec<u8>>::new());
    store.put(b"a", b"again").unwrap();
    assert_eq!(store.get(b"a"), Some(&b"again"[..]));
    store.check_invariants().unwrap();
}

// ==============================================
// Size-class transitions
// ==============================================

#[test]
fn compact_to_extended_migration() {
    let mut store = KvStore::new();
    store.put(b"k", &[b'a'; 100]).unwrap();
    let big = vec![b'b'; 300];
    store.put(b"k", &big).unwrap();
    assert_eq!(store.get(b"k"), Some(&big[..]));
    assert_eq!(store.len(), 1);
    store.check_invariants().unwrap();
}

#[test]
fn extended_to_compact_migration() {
    let mut store = KvStore::new();
    store.put(b"k", &[b'a'; 300]).unwrap();
    store.put(b"k", b"small").unwrap();
    assert_eq!(store.get(b"k"), Some(&b"small"[..]));
    store.check_invariants().unwrap();
}

#[test]
fn empty_and_binary_keys_are_valid() {
    let mut store = KvStore::new();
    store.put(b"", b"empty-key").unwrap();
    store.put(b"\x00\xff\x00", b"").unwrap();
    assert_eq!(store.get(b""), Some(&b"empty-key"[..]));
    assert_eq!(store.get(b"\x00\xff\x00"), Some(&b""[..]));
    assert_eq!(store.len(), 2);
}

// ==============================================
// Mixed workload sanity
// ==============================================

#[test]
fn interleaved_ops_keep_structures_consistent() {
    let mut store = KvStore::new();
    for round in 0..5u32 {
        for i in 0..100u32 {
            let key = (i * 7 + round).to_le_bytes();
            store.put(&key, &vec![i as u8; (i % 97) as usize]).unwrap();
        }
        for i in (0..100u32).step_by(3) {
            let key = (i * 7 + round).to_le_bytes();
            store.delete(&key);
        }
        for i in (0..100u32).step_by(5) {
            let key = (i * 7 + round).to_le_bytes();
            store.bump_recent(&key);
        }
        store.pop_first();
        store.check_invariants().unwrap();
    }
    assert!(!store.is_empty());
}

#[test]
fn randomized_ops_match_ordered_model() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut store = KvStore::new();
    let mut model: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();

    for _ in 0..5_000 {
        let key = vec![rng.gen_range(0..32u8)];
        match rng.gen_range(0..6u8) {
            0 | 1 => {
                let val = vec![rng.gen::<u8>(); rng.gen_range(0..300)];
                store.put(&key, &val).unwrap();
                if let Some(i) = model.iter().position(|(k, _)| *k == key) {
                    model.remove(i);
                }
                model.push((key, val));
            }
            2 => {
                let got = store.delete(&key);
                let expect = model
                    .iter()
                    .position(|(k, _)| *k == key)
                    .map(|i| model.remove(i).1);
                assert_eq!(got, expect);
            }
            3 => {
                store.bump_recent(&key);
                if let Some(i) = model.iter().position(|(k, _)| *k == key) {
                    let pair = model.remove(i);
                    model.push(pair);
                }
            }
            4 => {
                store.bump_least_recent(&key);
                if let Some(i) = model.iter().position(|(k, _)| *k == key) {
                    let pair = model.remove(i);
                    model.insert(0, pair);
                }
            }
            5 => {
                assert_eq!(
                    store.get(&key),
                    model
                        .iter()
                        .find(|(k, _)| *k == key)
                        .map(|(_, v)| &v[..])
                );
            }
            _ => unreachable!(),
        }
    }

    assert_eq!(store.entries(), model);
    store.check_invariants().unwrap();
}

// ==============================================
// Concurrent wrapper
// ==============================================

#[cfg(feature = "concurrency")]
#[test]
fn concurrent_wrapper_round_trip() {
    let store = ConcurrentKvStore::new();
    store.put(b"a", b"1").unwrap();
    store.insert_as_oldest(b"z", b"0").unwrap();
    assert_eq!(store.first(), Some((b"z".to_vec(), b"0".to_vec())));
    assert_eq!(store.entries().len(), 2);
    assert_eq!(store.pop_first(), Some((b"z".to_vec(), b"0".to_vec())));
    assert_eq!(store.len(), 1);
}
