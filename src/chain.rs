//! Bucket array and chain storage.
//!
//! Every bucket is a singly linked chain of arena nodes ending in exactly one
//! `Node::Terminal`. Removal overwrites the removed node with its successor
//! and frees the successor's arena slot, so no predecessor is ever needed and
//! the key of the removed node keeps naming "the next entry in this chain".

use slotmap::{DefaultKey, SlotMap};

pub(crate) type NodeKey = DefaultKey;

#[derive(Clone, Debug)]
pub(crate) enum Node<K, V> {
    Live { key: K, value: V, next: NodeKey },
    Terminal,
}

impl<K, V> Node<K, V> {
    #[inline]
    pub(crate) fn is_live(&self) -> bool {
        matches!(self, Node::Live { .. })
    }

    #[inline]
    pub(crate) fn entry(&self) -> Option<(&K, &V)> {
        match self {
            Node::Live { key, value, .. } => Some((key, value)),
            Node::Terminal => None,
        }
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self) -> Option<(&K, &mut V)> {
        match self {
            Node::Live { key, value, .. } => Some((&*key, value)),
            Node::Terminal => None,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Buckets<K, V> {
    heads: Vec<NodeKey>,
    nodes: SlotMap<NodeKey, Node<K, V>>,
}

impl<K, V> Buckets<K, V> {
    /// `bins` empty chains, each a lone terminal node.
    pub(crate) fn new(bins: usize) -> Self {
        debug_assert!(bins > 0);
        let mut nodes = SlotMap::with_capacity(bins);
        let heads = (0..bins).map(|_| nodes.insert(Node::Terminal)).collect();
        Self { heads, nodes }
    }

    #[inline]
    pub(crate) fn bins(&self) -> usize {
        self.heads.len()
    }

    #[inline]
    pub(crate) fn node(&self, at: NodeKey) -> Option<&Node<K, V>> {
        self.nodes.get(at)
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, at: NodeKey) -> Option<&mut Node<K, V>> {
        self.nodes.get_mut(at)
    }

    /// Walk `bin`'s chain and return the first live node whose key matches.
    pub(crate) fn find<F>(&self, bin: usize, mut matches: F) -> Option<NodeKey>
    where
        F: FnMut(&K) -> bool,
    {
        let mut at = self.heads[bin];
        while let Some(Node::Live { key, next, .. }) = self.nodes.get(at) {
            if matches(key) {
                return Some(at);
            }
            at = *next;
        }
        None
    }

    /// Link a new entry at the front of `bin`'s chain.
    pub(crate) fn push_front(&mut self, bin: usize, key: K, value: V) -> NodeKey {
        let next = self.heads[bin];
        let at = self.nodes.insert(Node::Live { key, value, next });
        self.heads[bin] = at;
        at
    }

    /// Remove the entry stored at `at` by moving its successor into place.
    /// Returns `None` if `at` is not a live node.
    pub(crate) fn unlink(&mut self, at: NodeKey) -> Option<(K, V)> {
        let next = match self.nodes.get(at)? {
            Node::Live { next, .. } => *next,
            Node::Terminal => return None,
        };
        let successor = self.nodes.remove(next)?;
        match core::mem::replace(&mut self.nodes[at], successor) {
            Node::Live { key, value, .. } => Some((key, value)),
            Node::Terminal => None,
        }
    }

    /// True when `at` is live and its successor is the chain's terminal.
    pub(crate) fn is_last_live(&self, at: NodeKey) -> bool {
        match self.nodes.get(at) {
            Some(Node::Live { next, .. }) => !self.nodes[*next].is_live(),
            _ => false,
        }
    }

    /// First live node in buckets `bin..`, with its bucket index.
    pub(crate) fn first_live_from(&self, bin: usize) -> Option<(usize, NodeKey)> {
        (bin..self.heads.len()).find_map(|b| {
            let h = self.heads[b];
            self.nodes[h].is_live().then_some((b, h))
        })
    }

    /// The live node after `at` (in bucket `bin`) in traversal order.
    pub(crate) fn next_live(&self, bin: usize, at: NodeKey) -> Option<(usize, NodeKey)> {
        if let Some(Node::Live { next, .. }) = self.nodes.get(at) {
            if self.nodes[*next].is_live() {
                return Some((bin, *next));
            }
        }
        self.first_live_from(bin + 1)
    }

    /// Drop every entry, leaving one terminal per bucket.
    pub(crate) fn clear(&mut self) {
        let bins = self.heads.len();
        *self = Self::new(bins);
    }

    /// Replace the bucket array with `new_bins` fresh chains and move every
    /// entry into a new node at `place(key)`. The old arena, spine and nodes
    /// alike, is dropped when this returns.
    pub(crate) fn rebuild<F>(&mut self, new_bins: usize, mut place: F)
    where
        F: FnMut(&K) -> usize,
    {
        let old = core::mem::replace(self, Self::new(new_bins));
        for (_, node) in old.nodes {
            if let Node::Live { key, value, .. } = node {
                let bin = place(&key);
                self.push_front(bin, key, value);
            }
        }
    }

    /// Live entries of one chain, head to tail.
    pub(crate) fn chain(&self, bin: usize) -> Chain<'_, K, V> {
        Chain {
            nodes: &self.nodes,
            at: self.heads[bin],
        }
    }

    pub(crate) fn values(&self) -> slotmap::basic::Values<'_, NodeKey, Node<K, V>> {
        self.nodes.values()
    }

    pub(crate) fn values_mut(&mut self) -> slotmap::basic::ValuesMut<'_, NodeKey, Node<K, V>> {
        self.nodes.values_mut()
    }

    pub(crate) fn into_nodes(self) -> slotmap::basic::IntoIter<NodeKey, Node<K, V>> {
        self.nodes.into_iter()
    }

    /// Arena slots in use, terminals included.
    #[cfg(test)]
    pub(crate) fn arena_len(&self) -> usize {
        self.nodes.len()
    }
}

pub(crate) struct Chain<'a, K, V> {
    nodes: &'a SlotMap<NodeKey, Node<K, V>>,
    at: NodeKey,
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self.nodes.get(self.at)? {
            Node::Live { key, value, next } => {
                self.at = *next;
                Some((key, value))
            }
            Node::Terminal => None,
        }
    }
}
