// Copyright (c) 2024-present, Andrew Werner
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::{borrow::Borrow, fmt};

use log::trace;

use crate::arena::Arena;

/// Number of express levels layered over the base chain. Every node
/// carries this many jump slots; its height says how many are linked.
pub const MAX_HEIGHT: usize = 12;

const _: () = assert!(MAX_HEIGHT >= 1);

/// Arena slot reserved for the head sentinel.
const HEAD: u32 = 0;

/// Errors surfaced by [`SkipList`] operations.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The leveling probability lies outside the open interval `(0, 1)`.
    ProbabilityOutOfRange(f64),
    /// The node handle does not name a removable node in this list.
    InvalidNodeRef,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProbabilityOutOfRange(p) => {
                write!(f, "probability must be within (0, 1), got {p}")
            }
            Self::InvalidNodeRef => write!(f, "node handle does not name a removable node"),
        }
    }
}

impl std::error::Error for Error {}

/// An opaque handle to one node of a [`SkipList`].
///
/// Handles are only produced by the list that owns the node and are
/// invalidated when that node is removed; the slot behind a stale handle
/// may be reused by a later insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef(u32);

struct Node<K, V> {
    /// `None` exactly for the head sentinel.
    data: Option<(K, V)>,
    /// Count of populated express links, `0..=MAX_HEIGHT`. A height of
    /// zero means the node sits only on the base chain.
    height: usize,
    /// Express successors; entries at `height` and above are never read.
    jumps: [u32; MAX_HEIGHT],
    /// Base-chain successor. The base chain holds every node and is the
    /// authoritative total order; express levels are a fast path over it.
    next: u32,
}

/// An ordered map from keys to values backed by a skip list.
///
/// Keys need not be unique: inserting an existing key adds a second node
/// rather than overwriting, and the newcomer lands ahead of its
/// equal-keyed siblings on every chain. Lookup, insertion, and removal
/// run in expected logarithmic time; nothing ever rebalances.
///
/// Chains are circular through a head sentinel stored at arena slot 0,
/// so traversal stops on an identity comparison rather than a null
/// check. `find_last_less_than` returns that sentinel when no key
/// qualifies; compare against [`SkipList::head`] to detect it.
pub struct SkipList<K, V> {
    arena: Arena<Node<K, V>>,
    probability: f64,
    /// `probability` rescaled to the u32 draw space.
    threshold: u32,
    rng_state: u32,
    len: usize,
}

impl<K, V> SkipList<K, V> {
    /// Constructs an empty list.
    ///
    /// `probability` controls express-level growth and must lie strictly
    /// between 0 and 1. `seed` feeds the internal xorshift generator
    /// used for leveling; two lists given the same seed and insertion
    /// sequence assign identical heights.
    ///
    /// # Errors
    /// [`Error::ProbabilityOutOfRange`] when `probability` is not in
    /// `(0, 1)`.
    pub fn new(probability: f64, seed: u32) -> Result<Self, Error> {
        if !(probability > 0.0 && probability < 1.0) {
            return Err(Error::ProbabilityOutOfRange(probability));
        }
        let mut arena = Arena::new();
        let head = arena.alloc(Node {
            data: None,
            height: MAX_HEIGHT,
            jumps: [HEAD; MAX_HEIGHT],
            next: HEAD,
        });
        assert_eq!(head, HEAD);
        trace!("created skip list: probability {probability}, seed {seed}");
        Ok(Self {
            arena,
            probability,
            threshold: (f64::from(u32::MAX) * probability) as u32,
            // Zero is a fixed point of xorshift.
            rng_state: if seed == 0 { 1 } else { seed },
            len: 0,
        })
    }

    /// The leveling probability this list was constructed with.
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// The current number of entries in the list.
    pub fn len(&self) -> usize {
        self.len
    }

    /// The list holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The head sentinel terminating every chain. It holds no entry and
    /// can never be removed.
    pub fn head(&self) -> NodeRef {
        NodeRef(HEAD)
    }

    /// Reads the key and value stored at `node`. The head sentinel and
    /// handles whose node has been removed yield `None`.
    pub fn entry(&self, node: NodeRef) -> Option<Entry<'_, K, V>> {
        self.arena
            .get(node.0)
            .and_then(|node| node.data.as_ref())
            .map(Entry)
    }

    /// Iterates the base chain in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            cur: HEAD,
        }
    }

    fn node(&self, index: u32) -> &Node<K, V> {
        let Some(node) = self.arena.get(index) else {
            unreachable!("chain link points at vacant slot {index}")
        };
        node
    }

    fn node_mut(&mut self, index: u32) -> &mut Node<K, V> {
        let Some(node) = self.arena.get_mut(index) else {
            unreachable!("chain link points at vacant slot {index}")
        };
        node
    }

    fn key_of(&self, index: u32) -> &K {
        match &self.node(index).data {
            Some((key, _)) => key,
            None => unreachable!("the head sentinel has no key"),
        }
    }

    fn random_u32(&mut self) -> u32 {
        // Pseudorandom number generation from "Xorshift RNGs" by George
        // Marsaglia. This particular set of operations generates 32-bit
        // integers. See:
        // https://en.wikipedia.org/wiki/Xorshift#Example_implementation
        let mut num = self.rng_state;
        num ^= num << 13;
        num ^= num >> 17;
        num ^= num << 5;
        self.rng_state = num;
        num
    }

    /// Samples the number of express links for a new node: the counter
    /// is bumped while draws keep landing below the probability
    /// threshold, wrapping from `MAX_HEIGHT` back to 1 rather than
    /// saturating. The wrap makes the per-level distribution geometric
    /// only below the cap; it is kept deliberately, tall towers are not
    /// strictly rarer past it.
    pub(crate) fn random_height(&mut self) -> usize {
        let mut height = 0;
        while self.random_u32() < self.threshold {
            height = height % MAX_HEIGHT + 1;
        }
        height
    }
}

impl<K, V> SkipList<K, V>
where
    K: Ord,
{
    /// Inserts a key/value pair and returns a handle to the new node.
    ///
    /// Duplicate keys are allowed; the new node is linked ahead of any
    /// node already holding an equal key, on the base chain and on every
    /// express level it reaches.
    pub fn insert(&mut self, key: K, value: V) -> NodeRef {
        let height = self.random_height();

        // Descend from the sentinel's top level, remembering where the
        // walk stopped on each level. The cursor carries over from one
        // level to the next and on into the base chain.
        let mut preds = [HEAD; MAX_HEIGHT];
        let mut cur = HEAD;
        for level in (0..MAX_HEIGHT).rev() {
            cur = self.advance_express(cur, level, &key);
            preds[level] = cur;
        }
        let base_pred = self.advance_base(cur, &key);

        let node = self.arena.alloc(Node {
            data: Some((key, value)),
            height,
            jumps: [HEAD; MAX_HEIGHT],
            next: HEAD,
        });
        for (level, &pred) in preds.iter().enumerate().take(height) {
            let succ = self.node(pred).jumps[level];
            self.node_mut(node).jumps[level] = succ;
            self.node_mut(pred).jumps[level] = node;
        }
        let succ = self.node(base_pred).next;
        self.node_mut(node).next = succ;
        self.node_mut(base_pred).next = node;
        self.len += 1;
        trace!("inserted node {node} with height {height}");
        NodeRef(node)
    }

    /// Unlinks `node` from every chain it participates in and returns
    /// its key and value.
    ///
    /// The target is matched by identity on each level, so with
    /// duplicate keys exactly the referenced node is removed, never a
    /// sibling holding an equal key.
    ///
    /// # Errors
    /// [`Error::InvalidNodeRef`] when the handle names the head
    /// sentinel, a node already removed, or a node not linked in this
    /// list. A failed removal leaves the list unmodified.
    pub fn remove(&mut self, node: NodeRef) -> Result<(K, V), Error> {
        let target = node.0;
        if target == HEAD || self.arena.get(target).is_none() {
            return Err(Error::InvalidNodeRef);
        }

        // Locate the target's predecessor on every chain it occupies
        // before touching any link, so nothing is unlinked when the
        // handle turns out not to be in the list.
        let mut express_preds = [None; MAX_HEIGHT];
        let key = self.key_of(target);
        let mut cur = HEAD;
        for level in (0..MAX_HEIGHT).rev() {
            cur = self.advance_express(cur, level, key);
            express_preds[level] = self.express_pred_in_run(cur, level, target);
        }
        cur = self.advance_base(cur, key);
        let Some(base_pred) = self.base_pred_in_run(cur, target) else {
            return Err(Error::InvalidNodeRef);
        };

        for level in 0..MAX_HEIGHT {
            debug_assert_eq!(
                express_preds[level].is_some(),
                level < self.node(target).height,
                "express membership diverges from node height"
            );
            if let Some(pred) = express_preds[level] {
                let succ = self.node(target).jumps[level];
                self.node_mut(pred).jumps[level] = succ;
            }
        }
        let succ = self.node(target).next;
        self.node_mut(base_pred).next = succ;
        self.len -= 1;

        let removed = self.arena.free(target);
        trace!("removed node {target}");
        match removed.data {
            Some(pair) => Ok(pair),
            None => unreachable!("the head sentinel is never linked as a removable node"),
        }
    }

    /// Returns the first node whose key equals `key`, or `None`.
    ///
    /// The descent returns early when an express link lands exactly on
    /// the key, which among duplicates may surface a node other than
    /// the first in base-chain order.
    pub fn find_first<Q>(&self, key: &Q) -> Option<NodeRef>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = HEAD;
        for level in (0..MAX_HEIGHT).rev() {
            let jump = self.node(cur).jumps[level];
            if jump != HEAD && self.key_of(jump).borrow() == key {
                return Some(NodeRef(jump));
            }
            cur = self.advance_express(cur, level, key);
        }
        let next = self.node(self.advance_base(cur, key)).next;
        (next != HEAD && self.key_of(next).borrow() == key).then_some(NodeRef(next))
    }

    /// Returns the node holding the greatest key strictly less than
    /// `key`, or the head sentinel when no key qualifies.
    ///
    /// This is the primitive the other lookups are phrased around: it
    /// never matches early and always lands on the true predecessor,
    /// the position an insertion for `key` would splice after.
    pub fn find_last_less_than<Q>(&self, key: &Q) -> NodeRef
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = HEAD;
        for level in (0..MAX_HEIGHT).rev() {
            cur = self.advance_express(cur, level, key);
        }
        NodeRef(self.advance_base(cur, key))
    }

    /// Advances along level `level`'s express chain while the successor
    /// holds a key strictly less than `key`, returning the stop node.
    fn advance_express<Q>(&self, mut from: u32, level: usize, key: &Q) -> u32
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        loop {
            let next = self.node(from).jumps[level];
            if next == HEAD || self.key_of(next).borrow() >= key {
                return from;
            }
            from = next;
        }
    }

    /// Base-chain counterpart of [`Self::advance_express`].
    fn advance_base<Q>(&self, mut from: u32, key: &Q) -> u32
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        loop {
            let next = self.node(from).next;
            if next == HEAD || self.key_of(next).borrow() >= key {
                return from;
            }
            from = next;
        }
    }

    /// Scans the run of keys equal to the target's along level `level`,
    /// returning the target's predecessor if the target is linked
    /// there. `from` must already sit just before the run.
    fn express_pred_in_run(&self, mut from: u32, level: usize, target: u32) -> Option<u32> {
        loop {
            let next = self.node(from).jumps[level];
            if next == target {
                return Some(from);
            }
            if next == HEAD || self.key_of(next) > self.key_of(target) {
                return None;
            }
            from = next;
        }
    }

    /// Base-chain counterpart of [`Self::express_pred_in_run`].
    fn base_pred_in_run(&self, mut from: u32, target: u32) -> Option<u32> {
        loop {
            let next = self.node(from).next;
            if next == target {
                return Some(from);
            }
            if next == HEAD || self.key_of(next) > self.key_of(target) {
                return None;
            }
            from = next;
        }
    }
}

/// A borrowed view of one node's key and value.
pub struct Entry<'m, K, V>(&'m (K, V));

impl<'m, K, V> Entry<'m, K, V> {
    /// The node's key.
    pub fn key(&self) -> &'m K {
        &self.0 .0
    }

    /// The node's value.
    pub fn value(&self) -> &'m V {
        &self.0 .1
    }
}

/// Forward iterator over the base chain, in ascending key order.
pub struct Iter<'m, K, V> {
    list: &'m SkipList<K, V>,
    cur: u32,
}

impl<'m, K, V> Iterator for Iter<'m, K, V> {
    type Item = Entry<'m, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let list = self.list;
        let next = list.node(self.cur).next;
        if next == HEAD {
            return None;
        }
        self.cur = next;
        list.entry(NodeRef(next))
    }
}

#[cfg(test)]
impl<K, V> SkipList<K, V>
where
    K: Ord,
{
    pub(crate) fn check_integrity(&self) {
        use std::collections::HashSet;

        // The base chain must visit every node exactly once, in
        // non-decreasing key order, and come back around to the head.
        let mut base_nodes = Vec::new();
        let mut seen = HashSet::new();
        let mut cur = self.node(HEAD).next;
        while cur != HEAD {
            assert!(seen.insert(cur), "base chain revisits node {cur}");
            base_nodes.push(cur);
            cur = self.node(cur).next;
        }
        assert_eq!(base_nodes.len(), self.len, "len diverges from base chain");
        for pair in base_nodes.windows(2) {
            assert!(
                self.key_of(pair[0]) <= self.key_of(pair[1]),
                "base chain out of order"
            );
        }

        // Each express level must be exactly the base chain filtered to
        // the nodes tall enough to reach it, which covers membership,
        // ordering, and reachability at once.
        assert_eq!(self.node(HEAD).height, MAX_HEIGHT, "sentinel height");
        for level in 0..MAX_HEIGHT {
            let mut chain = Vec::new();
            let mut cur = self.node(HEAD).jumps[level];
            while cur != HEAD {
                assert!(
                    level < self.node(cur).height,
                    "node {cur} linked above its height at level {level}"
                );
                chain.push(cur);
                cur = self.node(cur).jumps[level];
            }
            let expected: Vec<u32> = base_nodes
                .iter()
                .copied()
                .filter(|&n| level < self.node(n).height)
                .collect();
            assert_eq!(chain, expected, "level {level} diverges from base chain");
        }

        // No occupied arena slot may be unreachable from the chains.
        let live = (0..self.arena.slot_count())
            .filter(|&i| self.arena.get(i as u32).is_some())
            .count();
        assert_eq!(live, self.len + 1, "arena holds unreachable nodes");
    }
}
