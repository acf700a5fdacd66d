#![no_main]

use bytekv::prelude::*;
use libfuzzer_sys::fuzz_target;

// Model-check KvStore against an ordered reference
//
// Replays the same operation sequence on the store and on a Vec-backed
// ordered map, then compares contents and ordering exactly.
struct Model {
    pairs: Vec<(Vec<u8>, Vec<u8>)>,
}

impl Model {
    fn find(&self, key: &[u8]) -> Option<usize> {
        self.pairs.iter().position(|(k, _)| k == key)
    }

    fn put(&mut self, key: &[u8], val: &[u8]) {
        match self.find(key) {
            Some(i) => {
                let mut pair = self.pairs.remove(i);
                pair.1 = val.to_vec();
                self.pairs.push(pair);
            }
            None => self.pairs.push((key.to_vec(), val.to_vec())),
        }
    }

    fn unshift(&mut self, key: &[u8], val: &[u8]) {
        self.put(key, val);
        let pair = self.pairs.pop().unwrap();
        self.pairs.insert(0, pair);
    }

    fn delete(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        self.find(key).map(|i| self.pairs.remove(i).1)
    }

    fn bump_recent(&mut self, key: &[u8]) {
        if let Some(i) = self.find(key) {
            let pair = self.pairs.remove(i);
            self.pairs.push(pair);
        }
    }

    fn bump_least_recent(&mut self, key: &[u8]) {
        if let Some(i) = self.find(key) {
            let pair = self.pairs.remove(i);
            self.pairs.insert(0, pair);
        }
    }
}

fuzz_target!(|data: &[u8]| {
    let mut store = KvStore::new();
    let mut model = Model { pairs: Vec::new() };

    let mut idx = 0;
    while idx + 2 < data.len() {
        let op = data[idx] % 7;
        let key = vec![data[idx + 1] % 16];
        let val = vec![data[idx + 2]; (data[idx + 2] % 64) as usize];
        idx += 3;

        match op {
            0 | 1 => {
                store.put(&key, &val).unwrap();
                model.put(&key, &val);
            }
            2 => {
                assert_eq!(
                    store.get(&key),
                    model.find(&key).map(|i| &model.pairs[i].1[..])
                );
            }
            3 => {
                assert_eq!(store.delete(&key), model.delete(&key));
            }
            4 => {
                store.bump_recent(&key);
                model.bump_recent(&key);
            }
            5 => {
                store.bump_least_recent(&key);
                model.bump_least_recent(&key);
            }
            6 => {
                store.insert_as_oldest(&key, &val).unwrap();
                model.unshift(&key, &val);
            }
            _ => unreachable!(),
        }

        assert_eq!(store.len(), model.pairs.len());
    }

    assert_eq!(store.entries(), model.pairs);
});
