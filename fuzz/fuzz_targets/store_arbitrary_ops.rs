#![no_main]

use bytekv::prelude::*;
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary operation sequences on KvStore
//
// Tests random sequences of put, get, delete, bump, pop_first, unshift,
// clone, and clear operations to find edge cases and invariant violations.
fuzz_target!(|data: &[u8]| {
    let mut store = KvStore::new();
    let mut clone: Option<KvStore> = None;

    let mut idx = 0;
    while idx + 2 < data.len() {
        let op = data[idx] % 9;
        let key_len = (data[idx + 1] % 9) as usize;
        let val_len = data[idx + 2] as usize;
        idx += 3;

        let key: Vec<u8> = (0..key_len).map(|i| data[(idx + i) % data.len()]).collect();
        let val = vec![data[idx % data.len()]; val_len];

        match op {
            0 | 1 => {
                store.put(&key, &val).unwrap();
            }
            2 => {
                let _ = store.get(&key);
            }
            3 => {
                let _ = store.delete(&key);
            }
            4 => {
                let _ = store.bump_recent(&key);
            }
            5 => {
                let _ = store.bump_least_recent(&key);
            }
            6 => {
                let _ = store.pop_first();
            }
            7 => {
                store.insert_as_oldest(&key, &val).unwrap();
            }
            8 => match clone.take() {
                None => clone = Some(store.clone()),
                Some(c) => {
                    drop(c);
                    store.clear();
                }
            },
            _ => unreachable!(),
        }

        // Validate structural invariants after every operation
        store.check_invariants().unwrap();
        assert_eq!(store.keys().len(), store.len());
    }

    if let Some(c) = clone {
        c.check_invariants().unwrap();
    }
});
