use std::fmt::Display;
use std::io::{BufRead, Write};
use std::str::FromStr;

use parking_lot::Mutex;

use crate::skiplist::{SkipIndex, DEFAULT_MAX_LEVEL};
use crate::store::{LineFormat, StoreError};

/// A [SkipIndex](SkipIndex) behind one coarse lock, shareable between
/// threads.
///
/// A single mutex serializes every operation across the whole index,
/// regardless of key: correct, not scalable. The inner list never locks on
/// its own, so the search each mutating operation runs as a sub-step cannot
/// re-acquire the mutex.
pub struct SyncSkipIndex<K, V> {
    inner: Mutex<SkipIndex<K, V>>,
}

impl<K, V> SyncSkipIndex<K, V> {
    /// Instantiates a new, empty [SyncSkipIndex](SyncSkipIndex) with the
    /// default level ceiling.
    pub fn new() -> Self {
        Self::with_max_level(DEFAULT_MAX_LEVEL)
    }

    pub fn with_max_level(max_level: usize) -> Self {
        SyncSkipIndex {
            inner: Mutex::new(SkipIndex::with_max_level(max_level)),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl<K, V> SyncSkipIndex<K, V>
where
    K: Ord,
{
    pub fn insert(&self, key: K, value: V) -> bool {
        self.inner.lock().insert(key, value)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().remove(key)
    }

    pub fn update(&self, key: &K, value: V) -> bool
    where
        V: PartialEq,
    {
        self.inner.lock().update(key, value)
    }

    /// Looks up `key` and clones the value out; a borrow cannot outlive the
    /// lock guard.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    /// The per-level chain dump of the inner list, rendered while holding
    /// the lock.
    pub fn debug_dump(&self) -> String
    where
        K: Display,
        V: Display,
    {
        self.inner.lock().to_string()
    }

    /// Dumps every entry to `writer`. The lock is held for the whole pass,
    /// so the snapshot is consistent.
    pub fn dump_to<W>(&self, format: &LineFormat, writer: W) -> Result<(), StoreError>
    where
        K: Display,
        V: Display,
        W: Write,
    {
        format.dump(&self.inner.lock(), writer)
    }

    /// Loads entries from `reader` as a sequence of independently-locked
    /// inserts. Other threads may observe the partially-loaded index while
    /// this runs. Returns how many entries were inserted.
    pub fn load_from<R>(&self, format: &LineFormat, reader: R) -> Result<usize, StoreError>
    where
        K: FromStr,
        V: FromStr,
        R: BufRead,
    {
        let mut inserted = 0;

        for line in reader.lines() {
            let line = line?;
            if let Some((key, value)) = format.parse(&line) {
                if self.insert(key, value) {
                    inserted += 1;
                }
            }
        }

        Ok(inserted)
    }
}

impl<K, V> Default for SyncSkipIndex<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::sync::Arc;

    #[test]
    fn test_shared_between_threads() {
        let index = Arc::new(SyncSkipIndex::with_max_level(16));

        let writers = (0..8)
            .map(|t| {
                let index = Arc::clone(&index);
                std::thread::spawn(move || {
                    for i in 0..500u64 {
                        let key = t * 1_000 + i;
                        assert!(index.insert(key, key.to_string()));
                        if i % 3 == 0 {
                            assert!(index.remove(&key).is_some());
                        }
                    }
                })
            })
            .collect::<Vec<_>>();

        for writer in writers {
            writer.join().unwrap();
        }

        // 167 of every thread's 500 keys were removed again.
        assert_eq!(index.len(), 8 * (500 - 167));
        assert_eq!(index.get(&1), Some("1".to_string()));
        assert_eq!(index.get(&0), None);
    }

    #[test]
    fn test_mixed_readers_and_writers() {
        let index = Arc::new(SyncSkipIndex::with_max_level(16));
        for i in 0..100u64 {
            index.insert(i, i.to_string());
        }

        let handles = (0..4)
            .map(|t| {
                let index = Arc::clone(&index);
                std::thread::spawn(move || {
                    for i in 0..1_000u64 {
                        let key = (t * 31 + i) % 100;
                        match i % 3 {
                            0 => {
                                index.get(&key);
                            }
                            1 => {
                                index.update(&key, format!("{}'", key));
                            }
                            _ => {
                                index.len();
                            }
                        }
                    }
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(index.len(), 100);
    }

    #[test]
    fn test_load_then_dump() {
        let index: SyncSkipIndex<u64, String> = SyncSkipIndex::new();
        let format = LineFormat::default();

        let inserted = index
            .load_from(&format, "2:b\n1:a\nbroken line\n".as_bytes())
            .unwrap();
        assert_eq!(inserted, 2);

        let mut out = Vec::new();
        index.dump_to(&format, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1:a\n2:b\n");

        assert!(index.debug_dump().starts_with("Level 0: 1:a 2:b\n"));
    }
}
