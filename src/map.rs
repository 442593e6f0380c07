//! ChainedHashMap: the table engine.
//!
//! Placement is `|hash(key)| mod bins` over a bucket array of chains stored
//! in a slotmap arena (see `chain`). The map keeps a modification counter
//! that moves only on structural change (new key, erase, clear) so that
//! `Cursor`s can detect foreign mutation.

use crate::chain::{Buckets, Node, NodeKey};
use crate::config::{validate_load_threshold, MapConfig};
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::hashing::{compress, resolve, HashFn, NoHash, StdHash, TypeHash};
use crate::reentrancy::DebugReentrancy;
use core::fmt;
use core::hash::Hash;
use core::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_MAP_ID: AtomicU64 = AtomicU64::new(1);

fn next_map_id() -> u64 {
    NEXT_MAP_ID.fetch_add(1, Ordering::Relaxed)
}

/// Separate-chaining hash map whose hash function is fixed at construction.
///
/// `H` is the type-level hash slot: [`NoHash`] (the default) means the
/// constructor must supply the function, [`StdHash`] uses `K: Hash`, and a
/// user type implementing [`TypeHash`] pins a specific function.
pub struct ChainedHashMap<K, V, H = NoHash> {
    buckets: Buckets<K, V>,
    hash: HashFn<K>,
    load_threshold: f64,
    used: usize,
    mod_count: u64,
    id: u64,
    reentrancy: DebugReentrancy,
    _hash_slot: PhantomData<fn() -> H>,
}

impl<K, V, H> ChainedHashMap<K, V, H> {
    fn from_parts(buckets: Buckets<K, V>, hash: HashFn<K>, load_threshold: f64) -> Self {
        Self {
            buckets,
            hash,
            load_threshold,
            used: 0,
            mod_count: 0,
            id: next_map_id(),
            reentrancy: DebugReentrancy::new(),
            _hash_slot: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.used
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Current bucket count.
    pub fn bins(&self) -> usize {
        self.buckets.bins()
    }

    pub fn load_threshold(&self) -> f64 {
        self.load_threshold
    }

    /// The hash function every placement uses.
    pub fn hash_fn(&self) -> HashFn<K> {
        self.hash
    }

    /// Drop every entry. Keeps the bin count; counts as one structural change.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.used = 0;
        self.mod_count += 1;
        tracing::trace!(bins = self.buckets.bins(), "map cleared");
    }

    /// Cursor at the first entry in bucket order, or the end cursor.
    pub fn begin(&self) -> Cursor {
        Cursor::new(self, self.buckets.first_live_from(0))
    }

    /// The exhausted cursor.
    pub fn end(&self) -> Cursor {
        Cursor::new(self, None)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.buckets.values(),
            remaining: self.used,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.buckets.values_mut(),
            remaining: self.used,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|v| v == value)
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn mod_count(&self) -> u64 {
        self.mod_count
    }

    pub(crate) fn buckets(&self) -> &Buckets<K, V> {
        &self.buckets
    }

    pub(crate) fn buckets_mut(&mut self) -> &mut Buckets<K, V> {
        &mut self.buckets
    }

    /// Structural removal of the entry stored at `at`. Runs no user code.
    pub(crate) fn remove_node(&mut self, at: NodeKey) -> Option<(K, V)> {
        let entry = self.buckets.unlink(at)?;
        self.used -= 1;
        self.mod_count += 1;
        Some(entry)
    }

    /// Grow the bucket array if `new_used` entries would exceed the load
    /// threshold. The comparison is done in floating point.
    fn ensure_load_threshold(
        buckets: &mut Buckets<K, V>,
        hash: HashFn<K>,
        load_threshold: f64,
        new_used: usize,
    ) {
        let bins = buckets.bins();
        if new_used as f64 / bins as f64 <= load_threshold {
            return;
        }
        let new_bins = bins * 2;
        buckets.rebuild(new_bins, |k| compress(hash.hash(k), new_bins));
        tracing::debug!(
            old_bins = bins,
            new_bins,
            entries = new_used - 1,
            "bucket array doubled"
        );
    }
}

impl<K, V, H> ChainedHashMap<K, V, H>
where
    K: Eq,
    H: TypeHash<K>,
{
    /// Empty map with one bin.
    pub fn new(load_threshold: f64, hash: Option<HashFn<K>>) -> Result<Self> {
        let config = MapConfig::default().with_load_threshold(load_threshold);
        Self::build("ChainedHashMap::new", config, hash)
    }

    /// Empty map with `bins` bins.
    pub fn with_bins(bins: usize, load_threshold: f64, hash: Option<HashFn<K>>) -> Result<Self> {
        let config = MapConfig::default()
            .with_initial_bins(bins)
            .with_load_threshold(load_threshold);
        Self::build("ChainedHashMap::with_bins", config, hash)
    }

    pub fn with_config(config: MapConfig, hash: Option<HashFn<K>>) -> Result<Self> {
        Self::build("ChainedHashMap::with_config", config, hash)
    }

    fn build(op: &'static str, config: MapConfig, hash: Option<HashFn<K>>) -> Result<Self> {
        config.validate()?;
        let hash = resolve::<K, H>(op, hash)?;
        Ok(Self::from_parts(
            Buckets::new(config.initial_bins),
            hash,
            config.load_threshold,
        ))
    }

    /// Map holding a copy of every literal pair; later duplicates win.
    pub fn from_pairs(
        pairs: &[(K, V)],
        load_threshold: f64,
        hash: Option<HashFn<K>>,
    ) -> Result<Self>
    where
        K: Clone,
        V: Clone,
    {
        let mut m = Self::build(
            "ChainedHashMap::from_pairs",
            MapConfig::default().with_load_threshold(load_threshold),
            hash,
        )?;
        m.put_all(pairs.iter().cloned());
        Ok(m)
    }

    /// Map filled from any one-pass source of entries.
    pub fn from_entries<I>(
        entries: I,
        load_threshold: f64,
        hash: Option<HashFn<K>>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut m = Self::build(
            "ChainedHashMap::from_entries",
            MapConfig::default().with_load_threshold(load_threshold),
            hash,
        )?;
        m.put_all(entries);
        Ok(m)
    }

    /// Copy of `source` under a (possibly) new threshold and hash function.
    ///
    /// With no hash function from either `H` or `hash`, the copy inherits
    /// `source`'s. When the resolved function is the source's, chains are
    /// copied as they are; otherwise every entry is re-inserted.
    pub fn from_map(source: &Self, load_threshold: f64, hash: Option<HashFn<K>>) -> Result<Self>
    where
        K: Clone,
        V: Clone,
    {
        const OP: &str = "ChainedHashMap::from_map";
        validate_load_threshold(load_threshold)?;
        let hash = match resolve::<K, H>(OP, hash) {
            Ok(f) => f,
            Err(Error::HashFunctionUnresolved { .. }) => source.hash,
            Err(e) => return Err(e),
        };
        if hash == source.hash {
            let mut m = Self::from_parts(source.buckets.clone(), hash, load_threshold);
            m.used = source.used;
            return Ok(m);
        }
        let mut m = Self::from_parts(Buckets::new(source.bins()), hash, load_threshold);
        m.put_all(source.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(m)
    }
}

impl<K, V, H> ChainedHashMap<K, V, H>
where
    K: Eq,
{
    #[inline]
    fn slot(&self, key: &K) -> usize {
        compress(self.hash.hash(key), self.buckets.bins())
    }

    /// Bucket of `key` and its node, if present.
    fn lookup(&self, op: &'static str, key: &K) -> (usize, Option<NodeKey>) {
        let _g = self.reentrancy.enter(op);
        let bin = self.slot(key);
        (bin, self.buckets.find(bin, |k| k == key))
    }

    /// Link an entry whose key is known to be absent, growing first if needed.
    fn link_new(&mut self, op: &'static str, key: K, value: V) -> NodeKey {
        let _g = self.reentrancy.enter(op);
        Self::ensure_load_threshold(
            &mut self.buckets,
            self.hash,
            self.load_threshold,
            self.used + 1,
        );
        let bin = compress(self.hash.hash(&key), self.buckets.bins());
        let at = self.buckets.push_front(bin, key, value);
        self.used += 1;
        self.mod_count += 1;
        at
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.lookup("ChainedHashMap::contains_key", key).1.is_some()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let (_, at) = self.lookup("ChainedHashMap::get", key);
        self.buckets.node(at?)?.entry().map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let (_, at) = self.lookup("ChainedHashMap::get_mut", key);
        self.buckets.node_mut(at?)?.entry_mut().map(|(_, v)| v)
    }

    /// Cursor positioned at `key`, or the end cursor if it is absent.
    pub fn find(&self, key: &K) -> Cursor {
        let (bin, at) = self.lookup("ChainedHashMap::find", key);
        Cursor::new(self, at.map(|at| (bin, at)))
    }

    /// Insert or update. Returns the previous value for an existing key,
    /// which is replaced in place without any structural change.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        const OP: &str = "ChainedHashMap::insert";
        if let (_, Some(at)) = self.lookup(OP, &key) {
            if let Some((_, slot)) = self.buckets.node_mut(at).and_then(Node::entry_mut) {
                return Some(core::mem::replace(slot, value));
            }
        }
        self.link_new(OP, key, value);
        None
    }

    /// Like [`insert`](Self::insert), reporting "no previous value" as
    /// `V::default()`.
    pub fn put(&mut self, key: K, value: V) -> V
    where
        V: Default,
    {
        self.insert(key, value).unwrap_or_default()
    }

    /// Insert or update every entry of `source`; returns how many were processed.
    pub fn put_all<I>(&mut self, source: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut count = 0;
        for (k, v) in source {
            self.insert(k, v);
            count += 1;
        }
        count
    }

    /// Mutable indexing: the value for `key`, inserting `V::default()` first
    /// when the key is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        const OP: &str = "ChainedHashMap::get_or_insert_default";
        let at = match self.lookup(OP, &key) {
            (_, Some(at)) => at,
            (_, None) => self.link_new(OP, key, V::default()),
        };
        self.buckets
            .node_mut(at)
            .and_then(Node::entry_mut)
            .map(|(_, v)| v)
            .expect("located node must be live")
    }
}

impl<K, V, H> ChainedHashMap<K, V, H>
where
    K: Eq + fmt::Debug,
{
    /// Remove `key`, returning its value.
    pub fn erase(&mut self, key: &K) -> Result<V> {
        const OP: &str = "ChainedHashMap::erase";
        match self.lookup(OP, key) {
            (_, Some(at)) => self
                .remove_node(at)
                .map(|(_, v)| v)
                .ok_or_else(|| Error::key_not_found(OP, key)),
            (_, None) => Err(Error::key_not_found(OP, key)),
        }
    }

    /// Read-only indexing: the value for `key` or `KeyNotFound`.
    pub fn at(&self, key: &K) -> Result<&V> {
        const OP: &str = "ChainedHashMap::at";
        self.get(key).ok_or_else(|| Error::key_not_found(OP, key))
    }

    /// Bucket-by-bucket dump for debugging.
    pub fn layout(&self) -> String
    where
        V: fmt::Debug,
    {
        use fmt::Write;
        let mut out = format!(
            "bins={} used={} mod_count={} load_threshold={}\n",
            self.bins(),
            self.used,
            self.mod_count,
            self.load_threshold
        );
        for bin in 0..self.bins() {
            let _ = write!(out, "bin[{bin}]:");
            for (k, v) in self.buckets.chain(bin) {
                let _ = write!(out, " {k:?}->{v:?} ->");
            }
            out.push_str(" #\n");
        }
        out
    }
}

impl<K: Eq + Hash, V> Default for ChainedHashMap<K, V, StdHash> {
    fn default() -> Self {
        let config = MapConfig::default();
        Self::from_parts(
            Buckets::new(config.initial_bins),
            HashFn::std(),
            config.load_threshold,
        )
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for ChainedHashMap<K, V, StdHash> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::default();
        m.put_all(iter);
        m
    }
}

impl<K: Eq, V, H> Extend<(K, V)> for ChainedHashMap<K, V, H> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.put_all(iter);
    }
}

impl<K: Clone, V: Clone, H> Clone for ChainedHashMap<K, V, H> {
    /// Structural deep copy; the copy is a new instance for cursor purposes.
    fn clone(&self) -> Self {
        let mut m = Self::from_parts(self.buckets.clone(), self.hash, self.load_threshold);
        m.used = self.used;
        m
    }

    /// Assignment: replaces contents, hash function and threshold. Cursors
    /// over `self` are invalidated.
    fn clone_from(&mut self, source: &Self) {
        self.buckets = source.buckets.clone();
        self.hash = source.hash;
        self.load_threshold = source.load_threshold;
        self.used = source.used;
        self.mod_count += 1;
    }
}

impl<K: Eq, V: PartialEq, H> PartialEq for ChainedHashMap<K, V, H> {
    fn eq(&self, other: &Self) -> bool {
        if core::ptr::eq(self, other) {
            return true;
        }
        self.used == other.used
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |ov| ov == v))
    }
}

impl<K: Eq, V: Eq, H> Eq for ChainedHashMap<K, V, H> {}

impl<K: Eq + fmt::Debug, V, H> core::ops::Index<&K> for ChainedHashMap<K, V, H> {
    type Output = V;

    /// Panics with the `KeyNotFound` message when `key` is absent.
    fn index(&self, key: &K) -> &V {
        match self.at(key) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }
}

impl<K: fmt::Display, V: fmt::Display, H> fmt::Display for ChainedHashMap<K, V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("map[")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{k}->{v}")?;
        }
        f.write_str("]")
    }
}

impl<K: fmt::Debug, V: fmt::Debug, H> fmt::Debug for ChainedHashMap<K, V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over `(&K, &V)`, in arena order.
pub struct Iter<'a, K, V> {
    it: slotmap::basic::Values<'a, NodeKey, Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for node in self.it.by_ref() {
            if let Some(e) = node.entry() {
                self.remaining -= 1;
                return Some(e);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)`. Updating values is not a structural change.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::ValuesMut<'a, NodeKey, Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        for node in self.it.by_ref() {
            if let Some(e) = node.entry_mut() {
                self.remaining -= 1;
                return Some(e);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// Owning iterator over `(K, V)`.
pub struct IntoIter<K, V> {
    it: slotmap::basic::IntoIter<NodeKey, Node<K, V>>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        for (_, node) in self.it.by_ref() {
            if let Node::Live { key, value, .. } = node {
                self.remaining -= 1;
                return Some((key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V, H> IntoIterator for ChainedHashMap<K, V, H> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            remaining: self.used,
            it: self.buckets.into_nodes(),
        }
    }
}

impl<'a, K, V, H> IntoIterator for &'a ChainedHashMap<K, V, H> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, H> IntoIterator for &'a mut ChainedHashMap<K, V, H> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}
