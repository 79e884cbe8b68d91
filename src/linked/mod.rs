//! A bidirectional map threading each pair into two red-black trees.
//!
//! The engine owns a single arena of nodes; every node carries its key and
//! value once, plus parent/left/right links and a color bit for each of the
//! two trees. Compared to the dual-tree layout this stores each half of a
//! pair exactly once, and the mutation protocol never needs to clone keys
//! or values.
//!
//! All structural algorithms are written once and parameterized by the tree
//! dimension: the same rotate, fix-up, and unlink routines run against
//! either set of links.

mod node;

#[cfg(test)]
mod test;

use compare::{natural, Compare, Natural};
use slab::Slab;
use std::cmp::Ordering::{self, Equal, Greater, Less};
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::mem::replace;
use tracing::trace;

use self::node::{Dim, Id, Links, Node};
use crate::dual::pair_hash_sum;
use crate::error::{Error, Result};
use crate::range::Bounds;
use crate::view::{Bidi, Descending, Inverse, InverseMut, SubMap, SubMapMut};

/// An ordered bidirectional map storing each pair in a single node shared by
/// two red-black trees.
///
/// The contract is the same as [`dual::Map`](crate::dual::Map): unique keys
/// under the key comparator, unique values under the value comparator, and
/// ordered navigation over both domains. The node-sharing layout halves the
/// stored data and drops the `Clone` bounds from the mutation protocol.
///
/// # Examples
///
/// ```
/// let mut map = bitree::LinkedMap::new();
///
/// map.insert(1, "a");
/// map.insert(2, "b");
///
/// assert_eq!(map.get(&1), Some(&"a"));
/// assert_eq!(map.get_key(&"b"), Some(&2));
///
/// map.insert(1, "b");
/// assert_eq!(map.len(), 1);
/// assert_eq!(map.get(&2), None);
/// ```
#[derive(Clone)]
pub struct Map<K, V, CK = Natural<K>, CV = Natural<V>>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    nodes: Slab<Node<K, V>>,
    roots: [Option<Id>; 2],
    modifications: u64,
    kcmp: CK,
    vcmp: CV,
}

impl<K, V> Map<K, V>
where
    K: Ord,
    V: Ord,
{
    /// Creates an empty map ordered according to the natural order of its
    /// keys and of its values.
    pub fn new() -> Self {
        Map::with_cmp(natural(), natural())
    }
}

impl<K, V, CK, CV> Map<K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    /// Creates an empty map ordered according to the given key and value
    /// comparators.
    pub fn with_cmp(key_cmp: CK, value_cmp: CV) -> Self {
        Map {
            nodes: Slab::new(),
            roots: [None; 2],
            modifications: 0,
            kcmp: key_cmp,
            vcmp: value_cmp,
        }
    }

    /// Checks if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of pairs in the map.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns a reference to the key comparator.
    pub fn key_cmp(&self) -> &CK {
        &self.kcmp
    }

    /// Returns a reference to the value comparator.
    pub fn value_cmp(&self) -> &CV {
        &self.vcmp
    }

    /// The number of structural changes applied so far.
    ///
    /// Cursors snapshot this counter and refuse to run once it moves.
    pub fn modifications(&self) -> u64 {
        self.modifications
    }

    /// Removes all pairs from the map.
    pub fn clear(&mut self) {
        trace!("clearing bidirectional map");
        self.nodes.clear();
        self.roots = [None; 2];
        self.modifications += 1;
    }

    /// Returns a reference to the value bound to the given key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find_key(key).map(|id| &self.nodes[id.0].value)
    }

    /// Returns a reference to the key holding the given value.
    pub fn get_key(&self, value: &V) -> Option<&K> {
        self.find_value(value).map(|id| &self.nodes[id.0].key)
    }

    /// Checks if the map contains the given key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find_key(key).is_some()
    }

    /// Checks if any pair holds the given value.
    pub fn contains_value(&self, value: &V) -> bool {
        self.find_value(value).is_some()
    }

    /// Inserts a pair, returning the value previously bound to the key.
    ///
    /// After the call `(key, value)` is the only pair containing either
    /// half: a pair that held the key is updated in place, and a pair that
    /// held the value under a different key is evicted. Re-inserting the
    /// stored pair is a structural no-op.
    ///
    /// # Examples
    ///
    /// ```
    /// let mut map = bitree::LinkedMap::new();
    ///
    /// map.insert("a", 1);
    /// assert_eq!(map.insert("a", 2), Some(1));
    /// assert_eq!(map.get(&"a"), Some(&2));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.find_key(&key) {
            Some(id) => {
                if self.vcmp.compare(&value, &self.nodes[id.0].value) == Equal {
                    // same pair: swap the stored value without touching the trees
                    return Some(replace(&mut self.nodes[id.0].value, value));
                }

                self.detach(Dim::Value, id);
                let old = replace(&mut self.nodes[id.0].value, value);
                self.place_value(id);
                self.modifications += 1;
                Some(old)
            }
            None => {
                let id = Id(self.nodes.insert(Node::new(key, value)));
                self.attach(Dim::Key, id);
                self.place_value(id);
                self.modifications += 1;
                None
            }
        }
    }

    /// Inserts only if the key is unbound, returning the bound value
    /// otherwise.
    ///
    /// When the key is free this behaves exactly like [`insert`](Map::insert):
    /// a pair holding the value under a different key is still evicted.
    pub fn insert_if_absent(&mut self, key: K, value: V) -> Option<&V> {
        match self.find_key(&key) {
            Some(id) => Some(&self.nodes[id.0].value),
            None => {
                self.insert(key, value);
                None
            }
        }
    }

    /// Removes the pair with the given key.
    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let id = self.find_key(key)?;
        Some(self.remove_node(id))
    }

    /// Removes the pair holding the given value.
    pub fn remove_value(&mut self, value: &V) -> Option<(K, V)> {
        let id = self.find_value(value)?;
        Some(self.remove_node(id))
    }

    /// Removes the pair only if the key is currently bound to the given
    /// value.
    pub fn remove_pair(&mut self, key: &K, value: &V) -> bool {
        match self.find_key(key) {
            Some(id) if self.vcmp.compare(&self.nodes[id.0].value, value) == Equal => {
                self.remove_node(id);
                true
            }
            _ => false,
        }
    }

    /// Replaces the value for a key that is already bound, returning the
    /// previous value.
    ///
    /// Unbound keys are left unbound. Value uniqueness still holds: a pair
    /// holding the new value under a different key is evicted.
    pub fn replace(&mut self, key: &K, value: V) -> Option<V> {
        let id = self.find_key(key)?;
        Some(self.set_node_value(id, value))
    }

    /// Replaces the value for a key only if it is currently bound to `old`.
    pub fn replace_pair(&mut self, key: &K, old: &V, new: V) -> bool {
        match self.find_key(key) {
            Some(id) if self.vcmp.compare(&self.nodes[id.0].value, old) == Equal => {
                self.set_node_value(id, new);
                true
            }
            _ => false,
        }
    }

    /// Applies a remapping function to the pair for the given key, present
    /// or not.
    ///
    /// A `None` result removes the pair; a `Some` result is stored with
    /// full [`insert`](Map::insert) semantics.
    pub fn compute<F>(&mut self, key: K, f: F) -> Option<&V>
    where
        F: FnOnce(&K, Option<&V>) -> Option<V>,
    {
        match self.find_key(&key) {
            Some(id) => {
                let next = {
                    let n = &self.nodes[id.0];
                    f(&n.key, Some(&n.value))
                };
                match next {
                    Some(value) => {
                        self.set_node_value(id, value);
                        Some(&self.nodes[id.0].value)
                    }
                    None => {
                        self.remove_node(id);
                        None
                    }
                }
            }
            None => match f(&key, None) {
                Some(value) => Some(self.insert_fresh(key, value)),
                None => None,
            },
        }
    }

    /// Binds the key to a computed value if it is currently unbound, and
    /// returns the bound value either way.
    pub fn compute_if_absent<F>(&mut self, key: K, f: F) -> &V
    where
        F: FnOnce(&K) -> V,
    {
        match self.find_key(&key) {
            Some(id) => &self.nodes[id.0].value,
            None => {
                let value = f(&key);
                self.insert_fresh(key, value)
            }
        }
    }

    /// Applies a remapping function to the pair for the given key only if it
    /// is present.
    pub fn compute_if_present<F>(&mut self, key: &K, f: F) -> Option<&V>
    where
        F: FnOnce(&K, &V) -> Option<V>,
    {
        let id = self.find_key(key)?;
        let next = {
            let n = &self.nodes[id.0];
            f(&n.key, &n.value)
        };

        match next {
            Some(value) => {
                self.set_node_value(id, value);
                Some(&self.nodes[id.0].value)
            }
            None => {
                self.remove_node(id);
                None
            }
        }
    }

    /// Binds the key to `value` if unbound, or to the result of merging the
    /// current value with `value` otherwise.
    pub fn merge<F>(&mut self, key: K, value: V, f: F) -> Option<&V>
    where
        F: FnOnce(&V, V) -> Option<V>,
    {
        match self.find_key(&key) {
            Some(id) => {
                let merged = f(&self.nodes[id.0].value, value);
                match merged {
                    Some(value) => {
                        self.set_node_value(id, value);
                        Some(&self.nodes[id.0].value)
                    }
                    None => {
                        self.remove_node(id);
                        None
                    }
                }
            }
            None => Some(self.insert_fresh(key, value)),
        }
    }

    /// Keeps only the pairs for which the predicate holds.
    ///
    /// Counts as a single structural change however many pairs go.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut doomed = Vec::new();
        let mut cur = self.first_node(Dim::Key);

        while let Some(id) = cur {
            let n = &self.nodes[id.0];
            if !f(&n.key, &n.value) {
                doomed.push(id);
            }
            cur = self.successor(Dim::Key, id);
        }

        if doomed.is_empty() {
            return;
        }

        for id in doomed {
            self.detach(Dim::Key, id);
            self.detach(Dim::Value, id);
            self.nodes.remove(id.0);
        }
        self.modifications += 1;
    }

    /// The pair with the smallest key.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.first_node(Dim::Key).map(|id| self.pair_at(id))
    }

    /// The pair with the largest key.
    pub fn last(&self) -> Option<(&K, &V)> {
        self.last_node(Dim::Key).map(|id| self.pair_at(id))
    }

    /// The pair with the smallest value.
    pub fn first_by_value(&self) -> Option<(&K, &V)> {
        self.first_node(Dim::Value).map(|id| self.pair_at(id))
    }

    /// The pair with the largest value.
    pub fn last_by_value(&self) -> Option<(&K, &V)> {
        self.last_node(Dim::Value).map(|id| self.pair_at(id))
    }

    /// The pair with the largest key at or below the given key.
    pub fn pred(&self, key: &K, inclusive: bool) -> Option<(&K, &V)> {
        self.find_pred_by(Dim::Key, inclusive, |n| self.kcmp.compare(key, &n.key))
            .map(|id| self.pair_at(id))
    }

    /// The pair with the smallest key at or above the given key.
    pub fn succ(&self, key: &K, inclusive: bool) -> Option<(&K, &V)> {
        self.find_succ_by(Dim::Key, inclusive, |n| self.kcmp.compare(key, &n.key))
            .map(|id| self.pair_at(id))
    }

    /// The pair with the largest value at or below the given value.
    pub fn pred_by_value(&self, value: &V, inclusive: bool) -> Option<(&K, &V)> {
        self.find_pred_by(Dim::Value, inclusive, |n| self.vcmp.compare(value, &n.value))
            .map(|id| self.pair_at(id))
    }

    /// The pair with the smallest value at or above the given value.
    pub fn succ_by_value(&self, value: &V, inclusive: bool) -> Option<(&K, &V)> {
        self.find_succ_by(Dim::Value, inclusive, |n| self.vcmp.compare(value, &n.value))
            .map(|id| self.pair_at(id))
    }

    /// Removes and returns the pair with the smallest key.
    pub fn remove_first(&mut self) -> Option<(K, V)> {
        let id = self.first_node(Dim::Key)?;
        Some(self.remove_node(id))
    }

    /// Removes and returns the pair with the largest key.
    pub fn remove_last(&mut self) -> Option<(K, V)> {
        let id = self.last_node(Dim::Key)?;
        Some(self.remove_node(id))
    }

    /// Returns an iterator over the pairs in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V, CK, CV> {
        Iter(RawIter::new(self, Dim::Key))
    }

    /// Returns an iterator over the pairs in ascending value order.
    pub fn iter_by_value(&self) -> ValueIter<'_, K, V, CK, CV> {
        ValueIter(RawIter::new(self, Dim::Value))
    }

    /// Returns an iterator over the keys in ascending key order.
    pub fn keys(&self) -> Keys<'_, K, V, CK, CV> {
        Keys(RawIter::new(self, Dim::Key))
    }

    /// Returns an iterator over the values in ascending value order.
    pub fn values(&self) -> Values<'_, K, V, CK, CV> {
        Values(RawIter::new(self, Dim::Value))
    }

    /// Returns a detached cursor positioned before the smallest key.
    ///
    /// The cursor revalidates the map on every operation and fails with
    /// [`Error::ConcurrentModification`] once the map has changed under it.
    pub fn cursor(&self) -> Cursor {
        Cursor {
            next: self.first_node(Dim::Key),
            prev: None,
            current: None,
            forward: true,
            seen: self.modifications,
        }
    }

    /// Returns a detached cursor positioned after the largest key.
    pub fn cursor_back(&self) -> Cursor {
        Cursor {
            next: None,
            prev: self.last_node(Dim::Key),
            current: None,
            forward: false,
            seen: self.modifications,
        }
    }

    /// A live read view with keys and values swapped.
    pub fn inverse(&self) -> Inverse<'_, Self> {
        Inverse::new(self)
    }

    /// A live view with keys and values swapped that can mutate the map.
    pub fn inverse_mut(&mut self) -> InverseMut<'_, Self> {
        InverseMut::new(self)
    }

    /// Consumes the map and rebuilds it with keys and values swapped.
    pub fn into_inverse(mut self) -> Map<V, K, CV, CK> {
        let pairs: Vec<(V, K)> = self.nodes.drain().map(|n| (n.value, n.key)).collect();
        let mut inverse = Map::with_cmp(self.vcmp, self.kcmp);
        inverse.extend(pairs);
        inverse
    }

    /// A live read view with the key ordering reversed.
    pub fn descending(&self) -> Descending<'_, Self> {
        Descending::new(self)
    }

    /// A live read view restricted to the given key and value ranges.
    pub fn sub_map(&self, keys: Bounds<K>, values: Bounds<V>) -> SubMap<'_, Self> {
        SubMap::new(self, keys, values)
    }

    /// A live mutating view restricted to the given key and value ranges.
    pub fn sub_map_mut(&mut self, keys: Bounds<K>, values: Bounds<V>) -> SubMapMut<'_, Self> {
        SubMapMut::new(self, keys, values)
    }

    /// A read view of the pairs with keys below the given bound.
    pub fn head(&self, bound: K, inclusive: bool) -> SubMap<'_, Self> {
        self.sub_map(Bounds::head(bound, inclusive), Bounds::full())
    }

    /// A read view of the pairs with keys above the given bound.
    pub fn tail(&self, bound: K, inclusive: bool) -> SubMap<'_, Self> {
        self.sub_map(Bounds::tail(bound, inclusive), Bounds::full())
    }

    // ---- arena access ----

    fn pair_at(&self, id: Id) -> (&K, &V) {
        let n = &self.nodes[id.0];
        (&n.key, &n.value)
    }

    fn links(&self, dim: Dim, id: Id) -> Links {
        *self.nodes[id.0].links(dim)
    }

    fn set_links(&mut self, dim: Dim, id: Id, links: Links) {
        *self.nodes[id.0].links_mut(dim) = links;
    }

    fn root(&self, dim: Dim) -> Option<Id> {
        self.roots[dim.index()]
    }

    fn set_root(&mut self, dim: Dim, id: Option<Id>) {
        self.roots[dim.index()] = id;
    }

    fn parent(&self, dim: Dim, id: Id) -> Option<Id> {
        self.nodes[id.0].links(dim).parent
    }

    fn left(&self, dim: Dim, id: Id) -> Option<Id> {
        self.nodes[id.0].links(dim).left
    }

    fn right(&self, dim: Dim, id: Id) -> Option<Id> {
        self.nodes[id.0].links(dim).right
    }

    fn set_parent(&mut self, dim: Dim, id: Id, to: Option<Id>) {
        self.nodes[id.0].links_mut(dim).parent = to;
    }

    fn set_left(&mut self, dim: Dim, id: Id, to: Option<Id>) {
        self.nodes[id.0].links_mut(dim).left = to;
    }

    fn set_right(&mut self, dim: Dim, id: Id, to: Option<Id>) {
        self.nodes[id.0].links_mut(dim).right = to;
    }

    fn is_red(&self, dim: Dim, id: Option<Id>) -> bool {
        id.map_or(false, |id| self.nodes[id.0].links(dim).red)
    }

    fn set_red(&mut self, dim: Dim, id: Id, red: bool) {
        self.nodes[id.0].links_mut(dim).red = red;
    }

    fn ordering(&self, dim: Dim, a: Id, b: Id) -> Ordering {
        match dim {
            Dim::Key => self.kcmp.compare(&self.nodes[a.0].key, &self.nodes[b.0].key),
            Dim::Value => self.vcmp.compare(&self.nodes[a.0].value, &self.nodes[b.0].value),
        }
    }

    // ---- search ----

    fn find_by(&self, dim: Dim, cmp: impl Fn(&Node<K, V>) -> Ordering) -> Option<Id> {
        let mut cur = self.root(dim);

        while let Some(id) = cur {
            let node = &self.nodes[id.0];
            cur = match cmp(node) {
                Less => node.links(dim).left,
                Equal => return Some(id),
                Greater => node.links(dim).right,
            };
        }

        None
    }

    fn find_key(&self, key: &K) -> Option<Id> {
        self.find_by(Dim::Key, |n| self.kcmp.compare(key, &n.key))
    }

    fn find_value(&self, value: &V) -> Option<Id> {
        self.find_by(Dim::Value, |n| self.vcmp.compare(value, &n.value))
    }

    fn find_succ_by(
        &self,
        dim: Dim,
        inclusive: bool,
        cmp: impl Fn(&Node<K, V>) -> Ordering,
    ) -> Option<Id> {
        let mut cur = self.root(dim);
        let mut save = None;

        while let Some(id) = cur {
            let node = &self.nodes[id.0];
            cur = match cmp(node) {
                Less => {
                    save = Some(id);
                    node.links(dim).left
                }
                Equal => {
                    return if inclusive { Some(id) } else { self.successor(dim, id) };
                }
                Greater => node.links(dim).right,
            };
        }

        save
    }

    fn find_pred_by(
        &self,
        dim: Dim,
        inclusive: bool,
        cmp: impl Fn(&Node<K, V>) -> Ordering,
    ) -> Option<Id> {
        let mut cur = self.root(dim);
        let mut save = None;

        while let Some(id) = cur {
            let node = &self.nodes[id.0];
            cur = match cmp(node) {
                Greater => {
                    save = Some(id);
                    node.links(dim).right
                }
                Equal => {
                    return if inclusive { Some(id) } else { self.predecessor(dim, id) };
                }
                Less => node.links(dim).left,
            };
        }

        save
    }

    // ---- navigation ----

    fn min_from(&self, dim: Dim, mut id: Id) -> Id {
        while let Some(left) = self.left(dim, id) {
            id = left;
        }
        id
    }

    fn max_from(&self, dim: Dim, mut id: Id) -> Id {
        while let Some(right) = self.right(dim, id) {
            id = right;
        }
        id
    }

    fn first_node(&self, dim: Dim) -> Option<Id> {
        self.root(dim).map(|root| self.min_from(dim, root))
    }

    fn last_node(&self, dim: Dim) -> Option<Id> {
        self.root(dim).map(|root| self.max_from(dim, root))
    }

    fn successor(&self, dim: Dim, id: Id) -> Option<Id> {
        if let Some(right) = self.right(dim, id) {
            return Some(self.min_from(dim, right));
        }

        let mut cur = id;
        while let Some(parent) = self.parent(dim, cur) {
            if self.left(dim, parent) == Some(cur) {
                return Some(parent);
            }
            cur = parent;
        }

        None
    }

    fn predecessor(&self, dim: Dim, id: Id) -> Option<Id> {
        if let Some(left) = self.left(dim, id) {
            return Some(self.max_from(dim, left));
        }

        let mut cur = id;
        while let Some(parent) = self.parent(dim, cur) {
            if self.right(dim, parent) == Some(cur) {
                return Some(parent);
            }
            cur = parent;
        }

        None
    }

    // ---- structural mutation ----

    /// Inserts a node that is known to be absent from both trees and
    /// returns the stored value.
    fn insert_fresh(&mut self, key: K, value: V) -> &V {
        let id = Id(self.nodes.insert(Node::new(key, value)));
        self.attach(Dim::Key, id);
        self.place_value(id);
        self.modifications += 1;
        &self.nodes[id.0].value
    }

    /// Threads a detached node into the value tree, evicting the pair that
    /// currently holds an equal value, if any.
    fn place_value(&mut self, id: Id) {
        let victim = {
            let value = &self.nodes[id.0].value;
            self.find_by(Dim::Value, |n| self.vcmp.compare(value, &n.value))
        };

        match victim {
            Some(victim) => {
                debug_assert!(victim != id);
                trace!("insert evicts the previous holder of the value");
                self.replace_in_value_tree(victim, id);
                self.detach(Dim::Key, victim);
                self.nodes.remove(victim.0);
            }
            None => self.attach(Dim::Value, id),
        }
    }

    /// Replaces the value of the node `id`, rethreading it in the value
    /// tree; the put protocol's fast path when the key side is already
    /// known. Returns the previous value.
    fn set_node_value(&mut self, id: Id, value: V) -> V {
        if self.vcmp.compare(&value, &self.nodes[id.0].value) == Equal {
            return replace(&mut self.nodes[id.0].value, value);
        }

        self.detach(Dim::Value, id);
        let old = replace(&mut self.nodes[id.0].value, value);
        self.place_value(id);
        self.modifications += 1;
        old
    }

    /// Unlinks a node from both trees and releases it.
    fn remove_node(&mut self, id: Id) -> (K, V) {
        self.detach(Dim::Key, id);
        self.detach(Dim::Value, id);
        self.modifications += 1;
        let node = self.nodes.remove(id.0);
        (node.key, node.value)
    }

    /// Takes over the exact value-tree position of `victim`: links and
    /// color are copied wholesale, so no rebalancing is needed.
    fn replace_in_value_tree(&mut self, victim: Id, keeper: Id) {
        let dim = Dim::Value;
        let links = self.links(dim, victim);

        self.set_links(dim, keeper, links);

        match links.parent {
            None => self.set_root(dim, Some(keeper)),
            Some(parent) => {
                if self.left(dim, parent) == Some(victim) {
                    self.set_left(dim, parent, Some(keeper));
                } else {
                    self.set_right(dim, parent, Some(keeper));
                }
            }
        }

        if let Some(child) = links.left {
            self.set_parent(dim, child, Some(keeper));
        }
        if let Some(child) = links.right {
            self.set_parent(dim, child, Some(keeper));
        }

        self.set_links(dim, victim, Links::default());
    }

    /// Descends from the root and attaches the node as a leaf, then
    /// restores the red-black invariants.
    fn attach(&mut self, dim: Dim, id: Id) {
        let mut cur = match self.root(dim) {
            None => {
                self.set_links(dim, id, Links { parent: None, left: None, right: None, red: false });
                self.set_root(dim, Some(id));
                return;
            }
            Some(root) => root,
        };

        loop {
            match self.ordering(dim, id, cur) {
                Less => match self.left(dim, cur) {
                    Some(next) => cur = next,
                    None => {
                        self.set_left(dim, cur, Some(id));
                        break;
                    }
                },
                Greater => match self.right(dim, cur) {
                    Some(next) => cur = next,
                    None => {
                        self.set_right(dim, cur, Some(id));
                        break;
                    }
                },
                Equal => {
                    tracing::error!("equal node already threaded into the tree");
                    panic!("bitree: duplicate node during tree attach");
                }
            }
        }

        self.set_links(dim, id, Links { parent: Some(cur), left: None, right: None, red: true });
        self.insert_fixup(dim, id);
    }

    fn rotate_left(&mut self, dim: Dim, x: Id) {
        let y = self.right(dim, x).expect("rotate around a node with no right child");
        let y_left = self.left(dim, y);

        self.set_right(dim, x, y_left);
        if let Some(child) = y_left {
            self.set_parent(dim, child, Some(x));
        }

        let x_parent = self.parent(dim, x);
        self.set_parent(dim, y, x_parent);
        match x_parent {
            None => self.set_root(dim, Some(y)),
            Some(parent) => {
                if self.left(dim, parent) == Some(x) {
                    self.set_left(dim, parent, Some(y));
                } else {
                    self.set_right(dim, parent, Some(y));
                }
            }
        }

        self.set_left(dim, y, Some(x));
        self.set_parent(dim, x, Some(y));
    }

    fn rotate_right(&mut self, dim: Dim, x: Id) {
        let y = self.left(dim, x).expect("rotate around a node with no left child");
        let y_right = self.right(dim, y);

        self.set_left(dim, x, y_right);
        if let Some(child) = y_right {
            self.set_parent(dim, child, Some(x));
        }

        let x_parent = self.parent(dim, x);
        self.set_parent(dim, y, x_parent);
        match x_parent {
            None => self.set_root(dim, Some(y)),
            Some(parent) => {
                if self.right(dim, parent) == Some(x) {
                    self.set_right(dim, parent, Some(y));
                } else {
                    self.set_left(dim, parent, Some(y));
                }
            }
        }

        self.set_right(dim, y, Some(x));
        self.set_parent(dim, x, Some(y));
    }

    fn insert_fixup(&mut self, dim: Dim, mut x: Id) {
        while let Some(parent) = self.parent(dim, x) {
            if !self.links(dim, parent).red {
                break;
            }
            let grandparent = match self.parent(dim, parent) {
                Some(g) => g,
                None => break,
            };

            if self.left(dim, grandparent) == Some(parent) {
                let uncle = self.right(dim, grandparent);
                if self.is_red(dim, uncle) {
                    self.set_red(dim, parent, false);
                    if let Some(uncle) = uncle {
                        self.set_red(dim, uncle, false);
                    }
                    self.set_red(dim, grandparent, true);
                    x = grandparent;
                } else {
                    if self.right(dim, parent) == Some(x) {
                        x = parent;
                        self.rotate_left(dim, x);
                    }
                    let parent = self.parent(dim, x).expect("fixup rotated the parent away");
                    let grandparent =
                        self.parent(dim, parent).expect("fixup rotated the grandparent away");
                    self.set_red(dim, parent, false);
                    self.set_red(dim, grandparent, true);
                    self.rotate_right(dim, grandparent);
                }
            } else {
                let uncle = self.left(dim, grandparent);
                if self.is_red(dim, uncle) {
                    self.set_red(dim, parent, false);
                    if let Some(uncle) = uncle {
                        self.set_red(dim, uncle, false);
                    }
                    self.set_red(dim, grandparent, true);
                    x = grandparent;
                } else {
                    if self.left(dim, parent) == Some(x) {
                        x = parent;
                        self.rotate_right(dim, x);
                    }
                    let parent = self.parent(dim, x).expect("fixup rotated the parent away");
                    let grandparent =
                        self.parent(dim, parent).expect("fixup rotated the grandparent away");
                    self.set_red(dim, parent, false);
                    self.set_red(dim, grandparent, true);
                    self.rotate_left(dim, grandparent);
                }
            }
        }

        let root = self.root(dim).expect("fixup on an empty tree");
        self.set_red(dim, root, false);
    }

    /// Unlinks `z` from the tree `dim` only; the node stays threaded in the
    /// other tree and keeps its identity.
    fn detach(&mut self, dim: Dim, z: Id) {
        if self.left(dim, z).is_some() && self.right(dim, z).is_some() {
            let right = self.right(dim, z).expect("checked above");
            let succ = self.min_from(dim, right);
            self.swap_links(dim, z, succ);
        }

        let links = self.links(dim, z);
        let child = links.left.or(links.right);

        match child {
            Some(child) => {
                self.set_parent(dim, child, links.parent);
                match links.parent {
                    None => self.set_root(dim, Some(child)),
                    Some(parent) => {
                        if self.left(dim, parent) == Some(z) {
                            self.set_left(dim, parent, Some(child));
                        } else {
                            self.set_right(dim, parent, Some(child));
                        }
                    }
                }
                if !links.red {
                    self.delete_fixup(dim, child);
                }
            }
            None => match links.parent {
                None => self.set_root(dim, None),
                Some(_) => {
                    if !links.red {
                        // fix up with z still in place as the empty black leaf
                        self.delete_fixup(dim, z);
                    }
                    if let Some(parent) = self.parent(dim, z) {
                        if self.left(dim, parent) == Some(z) {
                            self.set_left(dim, parent, None);
                        } else if self.right(dim, parent) == Some(z) {
                            self.set_right(dim, parent, None);
                        }
                    }
                }
            },
        }

        self.set_links(dim, z, Links::default());
    }

    fn delete_fixup(&mut self, dim: Dim, mut x: Id) {
        while self.root(dim) != Some(x) && !self.links(dim, x).red {
            let parent = self.parent(dim, x).expect("doubled black below the root");

            if self.left(dim, parent) == Some(x) {
                let mut sibling = self.right(dim, parent).expect("doubled black with no sibling");

                if self.links(dim, sibling).red {
                    self.set_red(dim, sibling, false);
                    self.set_red(dim, parent, true);
                    self.rotate_left(dim, parent);
                    sibling = self.right(dim, parent).expect("doubled black with no sibling");
                }

                if !self.is_red(dim, self.left(dim, sibling))
                    && !self.is_red(dim, self.right(dim, sibling))
                {
                    self.set_red(dim, sibling, true);
                    x = parent;
                } else {
                    if !self.is_red(dim, self.right(dim, sibling)) {
                        if let Some(nephew) = self.left(dim, sibling) {
                            self.set_red(dim, nephew, false);
                        }
                        self.set_red(dim, sibling, true);
                        self.rotate_right(dim, sibling);
                        sibling = self.right(dim, parent).expect("doubled black with no sibling");
                    }
                    let parent_red = self.links(dim, parent).red;
                    self.set_red(dim, sibling, parent_red);
                    self.set_red(dim, parent, false);
                    if let Some(nephew) = self.right(dim, sibling) {
                        self.set_red(dim, nephew, false);
                    }
                    self.rotate_left(dim, parent);
                    x = self.root(dim).expect("rotation emptied the tree");
                }
            } else {
                let mut sibling = self.left(dim, parent).expect("doubled black with no sibling");

                if self.links(dim, sibling).red {
                    self.set_red(dim, sibling, false);
                    self.set_red(dim, parent, true);
                    self.rotate_right(dim, parent);
                    sibling = self.left(dim, parent).expect("doubled black with no sibling");
                }

                if !self.is_red(dim, self.left(dim, sibling))
                    && !self.is_red(dim, self.right(dim, sibling))
                {
                    self.set_red(dim, sibling, true);
                    x = parent;
                } else {
                    if !self.is_red(dim, self.left(dim, sibling)) {
                        if let Some(nephew) = self.right(dim, sibling) {
                            self.set_red(dim, nephew, false);
                        }
                        self.set_red(dim, sibling, true);
                        self.rotate_left(dim, sibling);
                        sibling = self.left(dim, parent).expect("doubled black with no sibling");
                    }
                    let parent_red = self.links(dim, parent).red;
                    self.set_red(dim, sibling, parent_red);
                    self.set_red(dim, parent, false);
                    if let Some(nephew) = self.left(dim, sibling) {
                        self.set_red(dim, nephew, false);
                    }
                    self.rotate_right(dim, parent);
                    x = self.root(dim).expect("rotation emptied the tree");
                }
            }
        }

        self.set_red(dim, x, false);
    }

    /// Exchanges the positions of two nodes in one tree, links and color
    /// bits included, without touching their contents or the other tree.
    ///
    /// Used by the two-child delete: the node's identity must survive
    /// because the other tree still threads through it.
    fn swap_links(&mut self, dim: Dim, a: Id, b: Id) {
        let links_a = self.links(dim, a);
        let links_b = self.links(dim, b);

        fn redirect(mut links: Links, from: Id, to: Id) -> Links {
            for slot in [&mut links.parent, &mut links.left, &mut links.right] {
                if *slot == Some(from) {
                    *slot = Some(to);
                }
            }
            links
        }

        // each node takes the other's links; references to the node's own
        // old position now mean the other node
        self.set_links(dim, a, redirect(links_b, a, b));
        self.set_links(dim, b, redirect(links_a, b, a));

        for (id, other) in [(a, b), (b, a)] {
            let links = self.links(dim, id);

            for child in [links.left, links.right] {
                if let Some(child) = child {
                    self.set_parent(dim, child, Some(id));
                }
            }

            match links.parent {
                None => self.set_root(dim, Some(id)),
                Some(parent) if parent != other => {
                    if self.left(dim, parent) == Some(other) {
                        self.set_left(dim, parent, Some(id));
                    } else if self.right(dim, parent) == Some(other) {
                        self.set_right(dim, parent, Some(id));
                    }
                }
                Some(_) => {}
            }
        }
    }
}

impl<K, V, CK, CV> Bidi for Map<K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    type Key = K;
    type Value = V;

    fn size(&self) -> usize {
        self.len()
    }

    fn key_ordering(&self, a: &K, b: &K) -> Ordering {
        self.kcmp.compare(a, b)
    }

    fn value_ordering(&self, a: &V, b: &V) -> Ordering {
        self.vcmp.compare(a, b)
    }

    fn pair(&self, key: &K) -> Option<(&K, &V)> {
        self.find_key(key).map(|id| self.pair_at(id))
    }

    fn pair_by_value(&self, value: &V) -> Option<(&K, &V)> {
        self.find_value(value).map(|id| self.pair_at(id))
    }

    fn first_pair(&self) -> Option<(&K, &V)> {
        self.first()
    }

    fn last_pair(&self) -> Option<(&K, &V)> {
        self.last()
    }

    fn succ_pair(&self, key: &K, inclusive: bool) -> Option<(&K, &V)> {
        self.succ(key, inclusive)
    }

    fn pred_pair(&self, key: &K, inclusive: bool) -> Option<(&K, &V)> {
        self.pred(key, inclusive)
    }

    fn first_pair_by_value(&self) -> Option<(&K, &V)> {
        self.first_by_value()
    }

    fn last_pair_by_value(&self) -> Option<(&K, &V)> {
        self.last_by_value()
    }

    fn succ_pair_by_value(&self, value: &V, inclusive: bool) -> Option<(&K, &V)> {
        self.succ_by_value(value, inclusive)
    }

    fn pred_pair_by_value(&self, value: &V, inclusive: bool) -> Option<(&K, &V)> {
        self.pred_by_value(value, inclusive)
    }

    fn put(&mut self, key: K, value: V) -> Option<V> {
        self.insert(key, value)
    }

    fn take(&mut self, key: &K) -> Option<(K, V)> {
        self.remove(key)
    }

    fn take_by_value(&mut self, value: &V) -> Option<(K, V)> {
        self.remove_value(value)
    }
}

impl<K, V, CK, CV> Debug for Map<K, V, CK, CV>
where
    K: Debug,
    V: Debug,
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;

        let mut it = self.iter();

        if let Some((k, v)) = it.next() {
            write!(f, "{:?}: {:?}", k, v)?;
            for (k, v) in it {
                write!(f, ", {:?}: {:?}", k, v)?;
            }
        }

        write!(f, "}}")
    }
}

impl<K, V, CK, CV> Display for Map<K, V, CK, CV>
where
    K: Display,
    V: Display,
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;

        let mut it = self.iter();

        if let Some((k, v)) = it.next() {
            write!(f, "{}={}", k, v)?;
            for (k, v) in it {
                write!(f, ", {}={}", k, v)?;
            }
        }

        write!(f, "}}")
    }
}

impl<K, V, CK, CV> Default for Map<K, V, CK, CV>
where
    CK: Compare<K> + Default,
    CV: Compare<V> + Default,
{
    fn default() -> Self {
        Map::with_cmp(Default::default(), Default::default())
    }
}

impl<K, V, CK, CV> Extend<(K, V)> for Map<K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, it: I) {
        for (k, v) in it {
            self.insert(k, v);
        }
    }
}

impl<K, V, CK, CV> std::iter::FromIterator<(K, V)> for Map<K, V, CK, CV>
where
    CK: Compare<K> + Default,
    CV: Compare<V> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(it: I) -> Self {
        let mut map: Self = Default::default();
        map.extend(it);
        map
    }
}

impl<K, V, CK, CV> PartialEq for Map<K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().zip(other.iter()).all(|(l, r)| {
                self.kcmp.compares_eq(l.0, r.0) && self.vcmp.compares_eq(l.1, r.1)
            })
    }
}

impl<K, V, CK, CV> Eq for Map<K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
}

impl<K, V, CK, CV> Hash for Map<K, V, CK, CV>
where
    K: Hash,
    V: Hash,
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(pair_hash_sum(self.iter()));
    }
}

impl<'a, K, V, CK, CV> IntoIterator for &'a Map<K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, CK, CV>;

    fn into_iter(self) -> Iter<'a, K, V, CK, CV> {
        self.iter()
    }
}

impl<K, V, CK, CV> IntoIterator for Map<K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        let mut ids = Vec::with_capacity(self.nodes.len());
        let mut cur = self.first_node(Dim::Key);

        while let Some(id) = cur {
            ids.push(id);
            cur = self.successor(Dim::Key, id);
        }

        IntoIter { nodes: self.nodes, ids: ids.into_iter() }
    }
}

/// An iterator that consumes the map in ascending key order.
pub struct IntoIter<K, V> {
    nodes: Slab<Node<K, V>>,
    ids: std::vec::IntoIter<Id>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let id = self.ids.next()?;
        let node = self.nodes.remove(id.0);
        Some((node.key, node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<(K, V)> {
        let id = self.ids.next_back()?;
        let node = self.nodes.remove(id.0);
        Some((node.key, node.value))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {
    fn len(&self) -> usize {
        self.ids.len()
    }
}

struct RawIter<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    map: &'a Map<K, V, CK, CV>,
    dim: Dim,
    front: Option<Id>,
    back: Option<Id>,
    remaining: usize,
}

impl<'a, K, V, CK, CV> RawIter<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn new(map: &'a Map<K, V, CK, CV>, dim: Dim) -> Self {
        RawIter {
            map,
            dim,
            front: map.first_node(dim),
            back: map.last_node(dim),
            remaining: map.len(),
        }
    }
}

impl<'a, K, V, CK, CV> Clone for RawIter<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn clone(&self) -> Self {
        RawIter {
            map: self.map,
            dim: self.dim,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V, CK, CV> Iterator for RawIter<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        if self.remaining == 0 {
            return None;
        }

        let id = self.front.expect("pairs remain but the frontier is gone");
        self.front = self.map.successor(self.dim, id);
        self.remaining -= 1;
        Some(self.map.pair_at(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V, CK, CV> DoubleEndedIterator for RawIter<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn next_back(&mut self) -> Option<(&'a K, &'a V)> {
        if self.remaining == 0 {
            return None;
        }

        let id = self.back.expect("pairs remain but the frontier is gone");
        self.back = self.map.predecessor(self.dim, id);
        self.remaining -= 1;
        Some(self.map.pair_at(id))
    }
}

impl<'a, K, V, CK, CV> ExactSizeIterator for RawIter<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn len(&self) -> usize {
        self.remaining
    }
}

/// An iterator over the pairs in ascending key order.
pub struct Iter<'a, K, V, CK, CV>(RawIter<'a, K, V, CK, CV>)
where
    CK: Compare<K>,
    CV: Compare<V>;

impl<'a, K, V, CK, CV> Clone for Iter<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn clone(&self) -> Self {
        Iter(self.0.clone())
    }
}

impl<'a, K, V, CK, CV> Iterator for Iter<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V, CK, CV> DoubleEndedIterator for Iter<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn next_back(&mut self) -> Option<(&'a K, &'a V)> {
        self.0.next_back()
    }
}

impl<'a, K, V, CK, CV> ExactSizeIterator for Iter<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn len(&self) -> usize {
        self.0.len()
    }
}

/// An iterator over the pairs in ascending value order.
pub struct ValueIter<'a, K, V, CK, CV>(RawIter<'a, K, V, CK, CV>)
where
    CK: Compare<K>,
    CV: Compare<V>;

impl<'a, K, V, CK, CV> Clone for ValueIter<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn clone(&self) -> Self {
        ValueIter(self.0.clone())
    }
}

impl<'a, K, V, CK, CV> Iterator for ValueIter<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V, CK, CV> DoubleEndedIterator for ValueIter<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn next_back(&mut self) -> Option<(&'a K, &'a V)> {
        self.0.next_back()
    }
}

impl<'a, K, V, CK, CV> ExactSizeIterator for ValueIter<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn len(&self) -> usize {
        self.0.len()
    }
}

/// An iterator over the keys in ascending key order.
pub struct Keys<'a, K, V, CK, CV>(RawIter<'a, K, V, CK, CV>)
where
    CK: Compare<K>,
    CV: Compare<V>;

impl<'a, K, V, CK, CV> Clone for Keys<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn clone(&self) -> Self {
        Keys(self.0.clone())
    }
}

impl<'a, K, V, CK, CV> Iterator for Keys<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.0.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V, CK, CV> DoubleEndedIterator for Keys<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn next_back(&mut self) -> Option<&'a K> {
        self.0.next_back().map(|(k, _)| k)
    }
}

impl<'a, K, V, CK, CV> ExactSizeIterator for Keys<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn len(&self) -> usize {
        self.0.len()
    }
}

/// An iterator over the values in ascending value order.
pub struct Values<'a, K, V, CK, CV>(RawIter<'a, K, V, CK, CV>)
where
    CK: Compare<K>,
    CV: Compare<V>;

impl<'a, K, V, CK, CV> Clone for Values<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn clone(&self) -> Self {
        Values(self.0.clone())
    }
}

impl<'a, K, V, CK, CV> Iterator for Values<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.0.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V, CK, CV> DoubleEndedIterator for Values<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn next_back(&mut self) -> Option<&'a V> {
        self.0.next_back().map(|(_, v)| v)
    }
}

impl<'a, K, V, CK, CV> ExactSizeIterator for Values<'a, K, V, CK, CV>
where
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn len(&self) -> usize {
        self.0.len()
    }
}

/// A detached bidirectional cursor over the pairs in key order.
///
/// The cursor holds node handles rather than borrows, so the map stays free
/// to change between cursor operations; every operation takes the map as an
/// argument, checks the modification counter snapshotted at creation, and
/// fails with [`Error::ConcurrentModification`] once the map has changed
/// under it. Mutations applied *through* the cursor resynchronise it.
///
/// # Examples
///
/// ```
/// use bitree::Error;
///
/// let mut map = bitree::LinkedMap::new();
/// map.insert(1, "a");
///
/// let mut cursor = map.cursor();
/// map.insert(2, "b");
///
/// assert_eq!(cursor.next(&map), Err(Error::ConcurrentModification));
/// ```
pub struct Cursor {
    next: Option<Id>,
    prev: Option<Id>,
    current: Option<Id>,
    forward: bool,
    seen: u64,
}

impl Cursor {
    /// Checks if a step forward would yield a pair.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Checks if a step backward would yield a pair.
    pub fn has_prev(&self) -> bool {
        self.prev.is_some()
    }

    /// Steps forward, returning the next pair in ascending key order, or
    /// `None` when exhausted.
    pub fn next<'a, K, V, CK, CV>(
        &mut self,
        map: &'a Map<K, V, CK, CV>,
    ) -> Result<Option<(&'a K, &'a V)>>
    where
        CK: Compare<K>,
        CV: Compare<V>,
    {
        self.check(map)?;

        let id = match self.next {
            None => return Ok(None),
            Some(id) => id,
        };

        self.next = map.successor(Dim::Key, id);
        self.prev = Some(id);
        self.current = Some(id);
        self.forward = true;
        Ok(Some(map.pair_at(id)))
    }

    /// Steps backward, returning the next pair in descending key order, or
    /// `None` when exhausted.
    pub fn prev<'a, K, V, CK, CV>(
        &mut self,
        map: &'a Map<K, V, CK, CV>,
    ) -> Result<Option<(&'a K, &'a V)>>
    where
        CK: Compare<K>,
        CV: Compare<V>,
    {
        self.check(map)?;

        let id = match self.prev {
            None => return Ok(None),
            Some(id) => id,
        };

        self.prev = map.predecessor(Dim::Key, id);
        self.next = Some(id);
        self.current = Some(id);
        self.forward = false;
        Ok(Some(map.pair_at(id)))
    }

    /// The pair the cursor currently rests on.
    pub fn current<'a, K, V, CK, CV>(&self, map: &'a Map<K, V, CK, CV>) -> Result<(&'a K, &'a V)>
    where
        CK: Compare<K>,
        CV: Compare<V>,
    {
        self.check(map)?;
        self.current.map(|id| map.pair_at(id)).ok_or(Error::IllegalState)
    }

    /// Removes the pair the cursor rests on and resynchronises.
    ///
    /// The anchor opposite the last step direction is recomputed so that
    /// iteration continues over the remaining pairs.
    pub fn remove<K, V, CK, CV>(&mut self, map: &mut Map<K, V, CK, CV>) -> Result<(K, V)>
    where
        CK: Compare<K>,
        CV: Compare<V>,
    {
        self.check(map)?;

        let id = self.current.take().ok_or(Error::IllegalState)?;

        if self.forward {
            self.prev = map.predecessor(Dim::Key, id);
        } else {
            self.next = map.successor(Dim::Key, id);
        }

        let pair = map.remove_node(id);
        self.seen = map.modifications;
        Ok(pair)
    }

    /// Replaces the value of the pair the cursor rests on.
    ///
    /// A value comparator-equal to the stored one is replaced in place; a
    /// value held by a *different* key fails with
    /// [`Error::ValueChangeNotAllowed`] rather than evicting that pair.
    /// The update rethreads the node directly, skipping the key-side
    /// lookup.
    pub fn set_value<K, V, CK, CV>(&mut self, map: &mut Map<K, V, CK, CV>, value: V) -> Result<V>
    where
        CK: Compare<K>,
        CV: Compare<V>,
    {
        self.check(map)?;

        let id = self.current.ok_or(Error::IllegalState)?;

        if let Some(holder) = map.find_value(&value) {
            if holder != id {
                return Err(Error::ValueChangeNotAllowed);
            }
        }

        let old = map.set_node_value(id, value);
        self.seen = map.modifications;
        Ok(old)
    }

    /// Repositions the cursor before the smallest key and resynchronises.
    pub fn reset<K, V, CK, CV>(&mut self, map: &Map<K, V, CK, CV>)
    where
        CK: Compare<K>,
        CV: Compare<V>,
    {
        *self = map.cursor();
    }

    /// Repositions the cursor after the largest key and resynchronises.
    pub fn reset_back<K, V, CK, CV>(&mut self, map: &Map<K, V, CK, CV>)
    where
        CK: Compare<K>,
        CV: Compare<V>,
    {
        *self = map.cursor_back();
    }

    fn check<K, V, CK, CV>(&self, map: &Map<K, V, CK, CV>) -> Result<()>
    where
        CK: Compare<K>,
        CV: Compare<V>,
    {
        if self.seen == map.modifications {
            Ok(())
        } else {
            Err(Error::ConcurrentModification)
        }
    }
}
