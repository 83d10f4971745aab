/// The operation surface of an ordered key-value index.
///
/// Every operation completes synchronously. Precondition failures are
/// reported through the return value: a duplicate insert and an update or
/// removal of an absent key leave the index untouched.
pub trait OrderedIndex<K, V> {
    /// Stores `value` under `key` if the key is not yet present.
    fn insert(&mut self, key: K, value: V) -> bool;

    /// Replaces the value under an existing `key`.
    fn update(&mut self, key: &K, value: V) -> bool
    where
        V: PartialEq;

    /// Removes the entry under `key`, handing back its value.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Borrows the value under `key`.
    fn get(&self, key: &K) -> Option<&V>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() < 1
    }
}
