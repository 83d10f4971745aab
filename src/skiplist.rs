use std::fmt::{self, Display};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::index::OrderedIndex;

/// Level ceiling used by [SkipIndex::new](SkipIndex::new). Construct with
/// [with_max_level](SkipIndex::with_max_level) to pick a different one.
pub const DEFAULT_MAX_LEVEL: usize = 16;

/// A stored entry and its forward pointers, one per level it spans.
/// `forward[i]` is the arena index of the next node at level `i`.
struct Node<K, V> {
    key: K,
    value: V,
    forward: Vec<Option<usize>>,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V, level: usize) -> Self {
        Node {
            key,
            value,
            forward: vec![None; level + 1],
        }
    }

    /// Highest level this node participates in.
    fn level(&self) -> usize {
        self.forward.len() - 1
    }
}

/// An ordered key-value index backed by a skip list.
///
/// Nodes live in a growable arena and link to each other through stable
/// indices, so the multi-level pointer graph needs no unsafe code and no
/// manual teardown. The head sentinel is not an arena node; its forward
/// pointers hang directly off the list.
///
/// All operations take `&mut self` and never block. Wrap the list in a
/// [SyncSkipIndex](crate::sync_skiplist::SyncSkipIndex) to share it between
/// threads behind a single lock.
pub struct SkipIndex<K, V> {
    nodes: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    head: Vec<Option<usize>>,
    max_level: usize,
    level: usize,
    len: usize,
    rng: SmallRng,
}

impl<K, V> SkipIndex<K, V> {
    /// Instantiates a new, empty [SkipIndex](SkipIndex) with the default
    /// level ceiling.
    pub fn new() -> Self {
        Self::with_max_level(DEFAULT_MAX_LEVEL)
    }

    /// Instantiates a new, empty [SkipIndex](SkipIndex) whose nodes may span
    /// at most `max_level + 1` levels. The ceiling is fixed for the lifetime
    /// of the list.
    pub fn with_max_level(max_level: usize) -> Self {
        Self::with_rng(max_level, SmallRng::from_entropy())
    }

    /// Like [with_max_level](SkipIndex::with_max_level), but draws node
    /// levels from the given generator. Handy for deterministic tests.
    pub fn with_rng(max_level: usize, rng: SmallRng) -> Self {
        SkipIndex {
            nodes: Vec::new(),
            free: Vec::new(),
            head: vec![None; max_level + 1],
            max_level,
            level: 0,
            len: 0,
            rng,
        }
    }

    /// Gets the number of stored entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The configured level ceiling. Never changes, in particular not when
    /// deletions empty the upper levels.
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Flips a fair coin until it comes up tails, capped at the ceiling.
    /// P(level >= k) = 2^-k, which keeps expected search depth logarithmic.
    fn random_level(&mut self) -> usize {
        let mut level = 0;
        while level < self.max_level && self.rng.gen::<bool>() {
            level += 1;
        }
        level
    }

    fn node(&self, idx: usize) -> &Node<K, V> {
        self.nodes[idx].as_ref().expect("forward link to vacant slot")
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<K, V> {
        self.nodes[idx].as_mut().expect("forward link to vacant slot")
    }

    /// Successor at `level`, where `None` as the predecessor means the head.
    fn next(&self, pred: Option<usize>, level: usize) -> Option<usize> {
        match pred {
            Some(idx) => self.node(idx).forward[level],
            None => self.head[level],
        }
    }

    fn set_next(&mut self, pred: Option<usize>, level: usize, succ: Option<usize>) {
        match pred {
            Some(idx) => self.node_mut(idx).forward[level] = succ,
            None => self.head[level] = succ,
        }
    }

    fn alloc(&mut self, node: Node<K, V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn dealloc(&mut self, idx: usize) -> Node<K, V> {
        let node = self.nodes[idx].take().expect("unlinked node already vacant");
        self.free.push(idx);
        node
    }
}

impl<K, V> SkipIndex<K, V>
where
    K: Ord,
{
    /// Walks the list top-down and records, per level, the rightmost node
    /// whose key is strictly below `key` (`None` standing for the head).
    /// Also returns the level-0 successor of that chain, the only node that
    /// can hold `key`. This is the shared traversal under every operation.
    fn find_predecessors(&self, key: &K) -> (Vec<Option<usize>>, Option<usize>) {
        let mut preds = vec![None; self.level + 1];
        let mut cursor: Option<usize> = None;

        for level in (0..=self.level).rev() {
            while let Some(next) = self.next(cursor, level) {
                if self.node(next).key < *key {
                    cursor = Some(next);
                } else {
                    break;
                }
            }
            preds[level] = cursor;
        }

        let candidate = self.next(cursor, 0);
        (preds, candidate)
    }

    /// Looks up the value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        let (_, candidate) = self.find_predecessors(key);
        let node = self.node(candidate?);

        if node.key == *key {
            Some(&node.value)
        } else {
            None
        }
    }

    /// Inserts a key-value pair. Returns false and leaves the list untouched
    /// if the key is already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let (mut preds, candidate) = self.find_predecessors(&key);

        if candidate.is_some_and(|idx| self.node(idx).key == key) {
            return false;
        }

        let new_level = self.random_level();

        // A draw above the occupied top makes the head the predecessor on
        // every fresh level.
        if new_level > self.level {
            preds.resize(new_level + 1, None);
            self.level = new_level;
        }

        let idx = self.alloc(Node::new(key, value, new_level));

        for level in 0..=new_level {
            let succ = self.next(preds[level], level);
            self.node_mut(idx).forward[level] = succ;
            self.set_next(preds[level], level, Some(idx));
        }

        self.len += 1;
        true
    }

    /// Removes the entry stored under `key`, returning its value, or `None`
    /// if the key is absent.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let (preds, candidate) = self.find_predecessors(key);
        let target = candidate.filter(|&idx| self.node(idx).key == *key)?;

        for level in (0..=self.node(target).level()).rev() {
            let succ = self.node(target).forward[level];
            self.set_next(preds[level], level, succ);
        }

        // Drop empty upper levels. The configured ceiling stays put.
        while self.level > 0 && self.head[self.level].is_none() {
            self.level -= 1;
        }

        let node = self.dealloc(target);
        self.len -= 1;
        Some(node.value)
    }

    /// Overwrites the value stored under `key`. Returns false if the key is
    /// absent. Writing the value already stored succeeds without mutating
    /// anything. Forward pointers are never touched.
    pub fn update(&mut self, key: &K, value: V) -> bool
    where
        V: PartialEq,
    {
        let (_, candidate) = self.find_predecessors(key);

        let Some(idx) = candidate.filter(|&idx| self.node(idx).key == *key) else {
            return false;
        };

        if self.node(idx).value != value {
            self.node_mut(idx).value = value;
        }
        true
    }

    /// Entries in ascending key order, off the authoritative level-0 chain.
    pub(crate) fn entries(&self) -> Entries<'_, K, V> {
        Entries {
            list: self,
            cursor: self.head[0],
        }
    }
}

/// Level-0 walk used by the persistence adapter and the level dump.
pub(crate) struct Entries<'a, K, V> {
    list: &'a SkipIndex<K, V>,
    cursor: Option<usize>,
}

impl<'a, K, V> Iterator for Entries<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let node = self.list.node(idx);
        self.cursor = node.forward[0];
        Some((&node.key, &node.value))
    }
}

impl<K, V> Default for SkipIndex<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> OrderedIndex<K, V> for SkipIndex<K, V>
where
    K: Ord,
{
    fn insert(&mut self, key: K, value: V) -> bool {
        self.insert(key, value)
    }

    fn update(&mut self, key: &K, value: V) -> bool
    where
        V: PartialEq,
    {
        self.update(key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.remove(key)
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn len(&self) -> usize {
        self.len()
    }
}

/// Renders every occupied level as one line of `key:value` pairs, level 0
/// first. Level 0 lists every entry; the lines above it thin out.
impl<K, V> Display for SkipIndex<K, V>
where
    K: Display,
    V: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in 0..=self.level {
            write!(f, "Level {}:", level)?;

            let mut cursor = self.head[level];
            while let Some(idx) = cursor {
                let node = self.node(idx);
                write!(f, " {}:{}", node.key, node.value)?;
                cursor = node.forward[level];
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
