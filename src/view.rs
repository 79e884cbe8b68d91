//! The contract shared by both map engines, and the view layer built on it.
//!
//! Views are thin adapters over a borrowed map: read views hold `&M`, the
//! mutating ones hold `&mut M` and route every change back through the
//! parent's put protocol, so the two indexes can never drift apart no matter
//! which surface a mutation enters through.

use compare::Compare;
use std::cmp::Ordering;
use std::ops::Bound;

use crate::error::{Error, Result};
use crate::range::Bounds;

/// The operations common to both engines of the ordered bidirectional map.
///
/// [`dual::Map`](crate::dual::Map) and [`linked::Map`](crate::linked::Map)
/// implement this contract; the range, inverse, and descending views are
/// generic over it.
pub trait Bidi {
    /// The key domain, ordered by the key comparator.
    type Key;
    /// The value domain, ordered by the value comparator.
    type Value;

    /// The number of stored pairs.
    fn size(&self) -> usize;

    /// Compares two keys with the map's key comparator.
    fn key_ordering(&self, a: &Self::Key, b: &Self::Key) -> Ordering;

    /// Compares two values with the map's value comparator.
    fn value_ordering(&self, a: &Self::Value, b: &Self::Value) -> Ordering;

    /// The stored pair for the given key.
    fn pair(&self, key: &Self::Key) -> Option<(&Self::Key, &Self::Value)>;

    /// The stored pair holding the given value.
    fn pair_by_value(&self, value: &Self::Value) -> Option<(&Self::Key, &Self::Value)>;

    /// The pair with the smallest key.
    fn first_pair(&self) -> Option<(&Self::Key, &Self::Value)>;

    /// The pair with the largest key.
    fn last_pair(&self) -> Option<(&Self::Key, &Self::Value)>;

    /// The pair with the smallest key at or above `key`.
    fn succ_pair(&self, key: &Self::Key, inclusive: bool) -> Option<(&Self::Key, &Self::Value)>;

    /// The pair with the largest key at or below `key`.
    fn pred_pair(&self, key: &Self::Key, inclusive: bool) -> Option<(&Self::Key, &Self::Value)>;

    /// The pair with the smallest value.
    fn first_pair_by_value(&self) -> Option<(&Self::Key, &Self::Value)>;

    /// The pair with the largest value.
    fn last_pair_by_value(&self) -> Option<(&Self::Key, &Self::Value)>;

    /// The pair with the smallest value at or above `value`.
    fn succ_pair_by_value(
        &self,
        value: &Self::Value,
        inclusive: bool,
    ) -> Option<(&Self::Key, &Self::Value)>;

    /// The pair with the largest value at or below `value`.
    fn pred_pair_by_value(
        &self,
        value: &Self::Value,
        inclusive: bool,
    ) -> Option<(&Self::Key, &Self::Value)>;

    /// Inserts a pair with full eviction semantics, returning the value
    /// previously bound to the key.
    fn put(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;

    /// Removes the pair for the given key.
    fn take(&mut self, key: &Self::Key) -> Option<(Self::Key, Self::Value)>;

    /// Removes the pair holding the given value.
    fn take_by_value(&mut self, value: &Self::Value) -> Option<(Self::Key, Self::Value)>;
}

/// Adapts a map's key ordering to the [`Compare`] interface.
struct KeyCmp<'m, M>(&'m M);

impl<'m, M> Compare<M::Key> for KeyCmp<'m, M>
where
    M: Bidi,
{
    fn compare(&self, l: &M::Key, r: &M::Key) -> Ordering {
        self.0.key_ordering(l, r)
    }
}

/// Adapts a map's value ordering to the [`Compare`] interface.
struct ValueCmp<'m, M>(&'m M);

impl<'m, M> Compare<M::Value> for ValueCmp<'m, M>
where
    M: Bidi,
{
    fn compare(&self, l: &M::Value, r: &M::Value) -> Ordering {
        self.0.value_ordering(l, r)
    }
}

/// A live read view with keys and values swapped.
///
/// Every operation is the corresponding operation on the underlying map with
/// the two domains exchanged; [`Inverse::inverse`] returns the original map.
pub struct Inverse<'a, M>(&'a M)
where
    M: Bidi;

impl<'a, M> Inverse<'a, M>
where
    M: Bidi,
{
    pub(crate) fn new(map: &'a M) -> Self {
        Inverse(map)
    }

    /// The number of pairs in the underlying map.
    pub fn len(&self) -> usize {
        self.0.size()
    }

    /// Checks if the underlying map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.size() == 0
    }

    /// Looks up the key bound to `value` in the underlying map.
    pub fn get(&self, value: &M::Value) -> Option<&'a M::Key> {
        self.0.pair_by_value(value).map(|e| e.0)
    }

    /// Looks up the value bound to `key` in the underlying map.
    pub fn get_key(&self, key: &M::Key) -> Option<&'a M::Value> {
        self.0.pair(key).map(|e| e.1)
    }

    /// Checks if `value` is bound in the underlying map.
    pub fn contains_key(&self, value: &M::Value) -> bool {
        self.0.pair_by_value(value).is_some()
    }

    /// Checks if `key` is bound in the underlying map.
    pub fn contains_value(&self, key: &M::Key) -> bool {
        self.0.pair(key).is_some()
    }

    /// The pair with the smallest value, swapped.
    pub fn first(&self) -> Option<(&'a M::Value, &'a M::Key)> {
        self.0.first_pair_by_value().map(|(k, v)| (v, k))
    }

    /// The pair with the largest value, swapped.
    pub fn last(&self) -> Option<(&'a M::Value, &'a M::Key)> {
        self.0.last_pair_by_value().map(|(k, v)| (v, k))
    }

    /// The swapped successor pair of `value` under the value ordering.
    pub fn succ(&self, value: &M::Value, inclusive: bool) -> Option<(&'a M::Value, &'a M::Key)> {
        self.0.succ_pair_by_value(value, inclusive).map(|(k, v)| (v, k))
    }

    /// The swapped predecessor pair of `value` under the value ordering.
    pub fn pred(&self, value: &M::Value, inclusive: bool) -> Option<(&'a M::Value, &'a M::Key)> {
        self.0.pred_pair_by_value(value, inclusive).map(|(k, v)| (v, k))
    }

    /// Iterates the swapped pairs in ascending value order.
    pub fn iter(&self) -> InverseIter<'a, M> {
        InverseIter { map: self.0, front: Position::Start, back: Position::Start }
    }

    /// The inverse of the inverse: the original map.
    pub fn inverse(&self) -> &'a M {
        self.0
    }
}

/// A live view with keys and values swapped, routing mutations back to the
/// underlying map.
pub struct InverseMut<'a, M>(&'a mut M)
where
    M: Bidi;

impl<'a, M> InverseMut<'a, M>
where
    M: Bidi,
{
    pub(crate) fn new(map: &'a mut M) -> Self {
        InverseMut(map)
    }

    /// The number of pairs in the underlying map.
    pub fn len(&self) -> usize {
        self.0.size()
    }

    /// Checks if the underlying map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.size() == 0
    }

    /// Looks up the key bound to `value` in the underlying map.
    pub fn get(&self, value: &M::Value) -> Option<&M::Key> {
        self.0.pair_by_value(value).map(|e| e.0)
    }

    /// Looks up the value bound to `key` in the underlying map.
    pub fn get_key(&self, key: &M::Key) -> Option<&M::Value> {
        self.0.pair(key).map(|e| e.1)
    }

    /// Inserts the swapped pair into the underlying map, returning the key
    /// previously bound to `value`.
    ///
    /// This is the underlying map's put protocol verbatim: any pair sharing
    /// `value` or `key` is evicted.
    pub fn insert(&mut self, value: M::Value, key: M::Key) -> Option<M::Key>
    where
        M::Key: Clone,
    {
        let previous = self.0.pair_by_value(&value).map(|e| e.0.clone());
        self.0.put(key, value);
        previous
    }

    /// Removes the pair holding `value`, swapped.
    pub fn remove(&mut self, value: &M::Value) -> Option<(M::Value, M::Key)> {
        self.0.take_by_value(value).map(|(k, v)| (v, k))
    }

    /// Removes the pair with the given `key`, swapped.
    pub fn remove_value(&mut self, key: &M::Key) -> Option<(M::Value, M::Key)> {
        self.0.take(key).map(|(k, v)| (v, k))
    }

    /// Iterates the swapped pairs in ascending value order.
    pub fn iter(&self) -> InverseIter<'_, M> {
        InverseIter { map: &*self.0, front: Position::Start, back: Position::Start }
    }

    /// The inverse of the inverse: the original map.
    pub fn inverse(self) -> &'a mut M {
        self.0
    }
}

/// A live read view with the key ordering reversed.
pub struct Descending<'a, M>(&'a M)
where
    M: Bidi;

impl<'a, M> Descending<'a, M>
where
    M: Bidi,
{
    pub(crate) fn new(map: &'a M) -> Self {
        Descending(map)
    }

    /// The number of pairs in the underlying map.
    pub fn len(&self) -> usize {
        self.0.size()
    }

    /// Checks if the underlying map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.size() == 0
    }

    /// Forward lookup; ordering does not affect membership.
    pub fn get(&self, key: &M::Key) -> Option<&'a M::Value> {
        self.0.pair(key).map(|e| e.1)
    }

    /// Reverse lookup; ordering does not affect membership.
    pub fn get_key(&self, value: &M::Value) -> Option<&'a M::Key> {
        self.0.pair_by_value(value).map(|e| e.0)
    }

    /// The first pair of the reversed ordering: the largest key.
    pub fn first(&self) -> Option<(&'a M::Key, &'a M::Value)> {
        self.0.last_pair()
    }

    /// The last pair of the reversed ordering: the smallest key.
    pub fn last(&self) -> Option<(&'a M::Key, &'a M::Value)> {
        self.0.first_pair()
    }

    /// The successor under the reversed ordering: the predecessor of `key`.
    pub fn succ(&self, key: &M::Key, inclusive: bool) -> Option<(&'a M::Key, &'a M::Value)> {
        self.0.pred_pair(key, inclusive)
    }

    /// The predecessor under the reversed ordering: the successor of `key`.
    pub fn pred(&self, key: &M::Key, inclusive: bool) -> Option<(&'a M::Key, &'a M::Value)> {
        self.0.succ_pair(key, inclusive)
    }

    /// Iterates the pairs in descending key order.
    pub fn iter(&self) -> std::iter::Rev<SubIter<'a, M>> {
        SubIter::full(self.0).rev()
    }

    /// The reverse of the reversed view: the original map.
    pub fn descending(&self) -> &'a M {
        self.0
    }
}

/// A live read view restricted to a key range and a value range.
///
/// Every pair visible through the view satisfies both restrictions; nested
/// restrictions compose by interval intersection.
pub struct SubMap<'a, M>
where
    M: Bidi,
{
    map: &'a M,
    keys: Bounds<M::Key>,
    values: Bounds<M::Value>,
}

impl<'a, M> SubMap<'a, M>
where
    M: Bidi,
{
    pub(crate) fn new(map: &'a M, keys: Bounds<M::Key>, values: Bounds<M::Value>) -> Self {
        SubMap { map, keys, values }
    }

    fn visible(&self, key: &M::Key, value: &M::Value) -> bool {
        self.keys.contains(&KeyCmp(self.map), key)
            && self.values.contains(&ValueCmp(self.map), value)
    }

    /// Counts the visible pairs.
    ///
    /// This is the pair count of the underlying map when the view is
    /// unrestricted, and a linear scan otherwise.
    pub fn len(&self) -> usize {
        if self.keys.is_full() && self.values.is_full() {
            self.map.size()
        } else {
            self.iter().count()
        }
    }

    /// Checks if no pair is visible.
    pub fn is_empty(&self) -> bool {
        if self.keys.is_full() && self.values.is_full() {
            self.map.size() == 0
        } else {
            self.iter().next().is_none()
        }
    }

    /// Forward lookup among the visible pairs.
    pub fn get(&self, key: &M::Key) -> Option<&M::Value> {
        let (k, v) = self.map.pair(key)?;
        self.visible(k, v).then_some(v)
    }

    /// Reverse lookup among the visible pairs.
    pub fn get_key(&self, value: &M::Value) -> Option<&M::Key> {
        let (k, v) = self.map.pair_by_value(value)?;
        self.visible(k, v).then_some(k)
    }

    /// Checks if a visible pair has the given key.
    pub fn contains_key(&self, key: &M::Key) -> bool {
        self.get(key).is_some()
    }

    /// Checks if a visible pair holds the given value.
    ///
    /// Membership requires the value range, the key range, and key-side
    /// containment to all agree; a pair outside the key range never leaks
    /// through its value.
    pub fn contains_value(&self, value: &M::Value) -> bool {
        self.get_key(value).is_some()
    }

    /// The visible pair with the smallest key.
    pub fn first(&self) -> Option<(&M::Key, &M::Value)> {
        self.iter().next()
    }

    /// The visible pair with the largest key.
    pub fn last(&self) -> Option<(&M::Key, &M::Value)> {
        self.iter().next_back()
    }

    /// The visible successor of `key`.
    pub fn succ(&self, key: &M::Key, inclusive: bool) -> Option<(&M::Key, &M::Value)> {
        let mut cur = self.map.succ_pair(key, inclusive);

        while let Some((k, v)) = cur {
            if !self.keys.contains(&KeyCmp(self.map), k) {
                return None;
            }
            if self.values.contains(&ValueCmp(self.map), v) {
                return Some((k, v));
            }
            cur = self.map.succ_pair(k, false);
        }

        None
    }

    /// The visible predecessor of `key`.
    pub fn pred(&self, key: &M::Key, inclusive: bool) -> Option<(&M::Key, &M::Value)> {
        let mut cur = self.map.pred_pair(key, inclusive);

        while let Some((k, v)) = cur {
            if !self.keys.contains(&KeyCmp(self.map), k) {
                return None;
            }
            if self.values.contains(&ValueCmp(self.map), v) {
                return Some((k, v));
            }
            cur = self.map.pred_pair(k, false);
        }

        None
    }

    /// Iterates the visible pairs in ascending key order.
    pub fn iter(&self) -> SubIter<'_, M> {
        SubIter {
            map: self.map,
            keys: Some(&self.keys),
            values: Some(&self.values),
            front: Position::Start,
            back: Position::Start,
        }
    }

    /// Further restricts the view by another key range.
    pub fn sub(self, keys: Bounds<M::Key>) -> Self {
        let SubMap { map, keys: old, values } = self;
        let keys = old.intersect(&KeyCmp(map), keys);
        SubMap { map, keys, values }
    }

    /// Further restricts the view by another value range.
    pub fn sub_values(self, values: Bounds<M::Value>) -> Self {
        let SubMap { map, keys, values: old } = self;
        let values = old.intersect(&ValueCmp(map), values);
        SubMap { map, keys, values }
    }

    /// Restricts the view to keys below `bound`.
    pub fn head(self, bound: M::Key, inclusive: bool) -> Self {
        self.sub(Bounds::head(bound, inclusive))
    }

    /// Restricts the view to keys above `bound`.
    pub fn tail(self, bound: M::Key, inclusive: bool) -> Self {
        self.sub(Bounds::tail(bound, inclusive))
    }
}

// Lifetime note: iterators returned from `&self` methods borrow the sub-map
// itself, because the bounds live in the view rather than in the map.
impl<'a, 'b, M> IntoIterator for &'b SubMap<'a, M>
where
    M: Bidi,
{
    type Item = (&'b M::Key, &'b M::Value);
    type IntoIter = SubIter<'b, M>;

    fn into_iter(self) -> SubIter<'b, M> {
        self.iter()
    }
}

/// A live view restricted to a key range and a value range, routing
/// mutations back to the underlying map.
///
/// Mutators reject, with [`Error::ValueChangeNotAllowed`], any change that
/// would create a pair outside the view or evict a pair the view cannot see.
pub struct SubMapMut<'a, M>
where
    M: Bidi,
{
    map: &'a mut M,
    keys: Bounds<M::Key>,
    values: Bounds<M::Value>,
}

impl<'a, M> SubMapMut<'a, M>
where
    M: Bidi,
{
    pub(crate) fn new(map: &'a mut M, keys: Bounds<M::Key>, values: Bounds<M::Value>) -> Self {
        SubMapMut { map, keys, values }
    }

    fn visible(&self, key: &M::Key, value: &M::Value) -> bool {
        self.keys.contains(&KeyCmp(&*self.map), key)
            && self.values.contains(&ValueCmp(&*self.map), value)
    }

    /// Counts the visible pairs.
    pub fn len(&self) -> usize {
        if self.keys.is_full() && self.values.is_full() {
            self.map.size()
        } else {
            self.iter().count()
        }
    }

    /// Checks if no pair is visible.
    pub fn is_empty(&self) -> bool {
        if self.keys.is_full() && self.values.is_full() {
            self.map.size() == 0
        } else {
            self.iter().next().is_none()
        }
    }

    /// Forward lookup among the visible pairs.
    pub fn get(&self, key: &M::Key) -> Option<&M::Value> {
        let (k, v) = self.map.pair(key)?;
        self.visible(k, v).then_some(v)
    }

    /// Reverse lookup among the visible pairs.
    pub fn get_key(&self, value: &M::Value) -> Option<&M::Key> {
        let (k, v) = self.map.pair_by_value(value)?;
        self.visible(k, v).then_some(k)
    }

    /// Checks if a visible pair has the given key.
    pub fn contains_key(&self, key: &M::Key) -> bool {
        self.get(key).is_some()
    }

    /// Checks if a visible pair holds the given value.
    pub fn contains_value(&self, value: &M::Value) -> bool {
        self.get_key(value).is_some()
    }

    /// Iterates the visible pairs in ascending key order.
    pub fn iter(&self) -> SubIter<'_, M> {
        SubIter {
            map: &*self.map,
            keys: Some(&self.keys),
            values: Some(&self.values),
            front: Position::Start,
            back: Position::Start,
        }
    }

    /// Inserts a pair through the view.
    ///
    /// Fails if the pair falls outside the view, if the key is already bound
    /// to a value the view cannot see, or if the value is held by a key
    /// outside the key range; on failure the map is unchanged.
    pub fn insert(&mut self, key: M::Key, value: M::Value) -> Result<Option<M::Value>> {
        if !self.visible(&key, &value) {
            return Err(Error::ValueChangeNotAllowed);
        }

        if let Some((_, bound)) = self.map.pair(&key) {
            if !self.values.contains(&ValueCmp(&*self.map), bound) {
                return Err(Error::ValueChangeNotAllowed);
            }
        }

        if let Some((holder, _)) = self.map.pair_by_value(&value) {
            if !self.keys.contains(&KeyCmp(&*self.map), holder) {
                return Err(Error::ValueChangeNotAllowed);
            }
        }

        Ok(self.map.put(key, value))
    }

    /// Inserts only if the key is unbound, never evicting another pair.
    ///
    /// Returns `Ok(false)` without touching the map when the key is already
    /// bound; fails with [`Error::ValueChangeNotAllowed`] when the value is
    /// held by a different key or the pair falls outside the view.
    pub fn insert_if_absent(&mut self, key: M::Key, value: M::Value) -> Result<bool> {
        if !self.visible(&key, &value) {
            return Err(Error::ValueChangeNotAllowed);
        }

        if self.map.pair(&key).is_some() {
            return Ok(false);
        }

        if self.map.pair_by_value(&value).is_some() {
            return Err(Error::ValueChangeNotAllowed);
        }

        self.map.put(key, value);
        Ok(true)
    }

    /// Removes the visible pair with the given key, if any.
    ///
    /// Pairs outside the view are left alone.
    pub fn remove(&mut self, key: &M::Key) -> Option<(M::Key, M::Value)> {
        let visible = match self.map.pair(key) {
            Some((k, v)) => self.visible(k, v),
            None => return None,
        };

        if visible {
            self.map.take(key)
        } else {
            None
        }
    }

    /// Removes the visible pair holding the given value, if any.
    pub fn remove_value(&mut self, value: &M::Value) -> Option<(M::Key, M::Value)> {
        let visible = match self.map.pair_by_value(value) {
            Some((k, v)) => self.visible(k, v),
            None => return None,
        };

        if visible {
            self.map.take_by_value(value)
        } else {
            None
        }
    }

    /// Removes and returns the visible pair with the smallest key.
    ///
    /// Pairs whose value falls outside the value range are skipped, not
    /// removed.
    pub fn remove_first(&mut self) -> Option<(M::Key, M::Value)>
    where
        M::Key: Clone,
    {
        let key = self.iter().next().map(|(k, _)| k.clone())?;
        self.map.take(&key)
    }

    /// Removes and returns the visible pair with the largest key.
    pub fn remove_last(&mut self) -> Option<(M::Key, M::Value)>
    where
        M::Key: Clone,
    {
        let key = self.iter().next_back().map(|(k, _)| k.clone())?;
        self.map.take(&key)
    }

    /// Removes every visible pair, leaving the rest of the map untouched.
    pub fn clear(&mut self)
    where
        M::Key: Clone,
    {
        let doomed: Vec<M::Key> = self.iter().map(|(k, _)| k.clone()).collect();
        for key in &doomed {
            self.map.take(key);
        }
    }

    /// Keeps only the visible pairs for which the predicate holds.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&M::Key, &M::Value) -> bool,
        M::Key: Clone,
    {
        let doomed: Vec<M::Key> =
            self.iter().filter(|(k, v)| !f(k, v)).map(|(k, _)| k.clone()).collect();
        for key in &doomed {
            self.map.take(key);
        }
    }

    /// Further restricts the view by another key range.
    pub fn sub(self, keys: Bounds<M::Key>) -> Self {
        let SubMapMut { map, keys: old, values } = self;
        let keys = old.intersect(&KeyCmp(&*map), keys);
        SubMapMut { map, keys, values }
    }

    /// Further restricts the view by another value range.
    pub fn sub_values(self, values: Bounds<M::Value>) -> Self {
        let SubMapMut { map, keys, values: old } = self;
        let values = old.intersect(&ValueCmp(&*map), values);
        SubMapMut { map, keys, values }
    }

    /// Restricts the view to keys below `bound`.
    pub fn head(self, bound: M::Key, inclusive: bool) -> Self {
        self.sub(Bounds::head(bound, inclusive))
    }

    /// Restricts the view to keys above `bound`.
    pub fn tail(self, bound: M::Key, inclusive: bool) -> Self {
        self.sub(Bounds::tail(bound, inclusive))
    }
}

enum Position<'a, T> {
    Start,
    At(&'a T),
    Done,
}

impl<'a, T> Clone for Position<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for Position<'a, T> {}

/// A double-ended iterator over the pairs visible through a range-restricted
/// view, in ascending key order.
///
/// Each step is one tree navigation on the underlying map, so a full pass is
/// `O(n log n)` in the worst case; the engines' own iterators remain the
/// fast path for unrestricted traversal.
pub struct SubIter<'a, M>
where
    M: Bidi,
{
    map: &'a M,
    keys: Option<&'a Bounds<M::Key>>,
    values: Option<&'a Bounds<M::Value>>,
    front: Position<'a, M::Key>,
    back: Position<'a, M::Key>,
}

impl<'a, M> SubIter<'a, M>
where
    M: Bidi,
{
    pub(crate) fn full(map: &'a M) -> Self {
        SubIter { map, keys: None, values: None, front: Position::Start, back: Position::Start }
    }

    fn key_in_range(&self, key: &M::Key) -> bool {
        self.keys.map_or(true, |b| b.contains(&KeyCmp(self.map), key))
    }

    fn value_in_range(&self, value: &M::Value) -> bool {
        self.values.map_or(true, |b| b.contains(&ValueCmp(self.map), value))
    }
}

impl<'a, M> Iterator for SubIter<'a, M>
where
    M: Bidi,
{
    type Item = (&'a M::Key, &'a M::Value);

    fn next(&mut self) -> Option<(&'a M::Key, &'a M::Value)> {
        loop {
            let step = match self.front {
                Position::Done => return None,
                Position::Start => match self.keys.map(Bounds::lower) {
                    None | Some(Bound::Unbounded) => self.map.first_pair(),
                    Some(Bound::Included(t)) => self.map.succ_pair(t, true),
                    Some(Bound::Excluded(t)) => self.map.succ_pair(t, false),
                },
                Position::At(k) => self.map.succ_pair(k, false),
            };

            let (k, v) = match step {
                None => {
                    self.front = Position::Done;
                    return None;
                }
                Some(pair) => pair,
            };

            if !self.key_in_range(k) {
                self.front = Position::Done;
                return None;
            }

            if let Position::At(b) = self.back {
                if self.map.key_ordering(k, b) != Ordering::Less {
                    self.front = Position::Done;
                    return None;
                }
            }

            self.front = Position::At(k);

            if self.value_in_range(v) {
                return Some((k, v));
            }
        }
    }
}

impl<'a, M> DoubleEndedIterator for SubIter<'a, M>
where
    M: Bidi,
{
    fn next_back(&mut self) -> Option<(&'a M::Key, &'a M::Value)> {
        loop {
            let step = match self.back {
                Position::Done => return None,
                Position::Start => match self.keys.map(Bounds::upper) {
                    None | Some(Bound::Unbounded) => self.map.last_pair(),
                    Some(Bound::Included(t)) => self.map.pred_pair(t, true),
                    Some(Bound::Excluded(t)) => self.map.pred_pair(t, false),
                },
                Position::At(k) => self.map.pred_pair(k, false),
            };

            let (k, v) = match step {
                None => {
                    self.back = Position::Done;
                    return None;
                }
                Some(pair) => pair,
            };

            if !self.key_in_range(k) {
                self.back = Position::Done;
                return None;
            }

            if let Position::At(f) = self.front {
                if self.map.key_ordering(k, f) != Ordering::Greater {
                    self.back = Position::Done;
                    return None;
                }
            }

            self.back = Position::At(k);

            if self.value_in_range(v) {
                return Some((k, v));
            }
        }
    }
}

/// A double-ended iterator over swapped pairs in ascending value order.
pub struct InverseIter<'a, M>
where
    M: Bidi,
{
    map: &'a M,
    front: Position<'a, M::Value>,
    back: Position<'a, M::Value>,
}

impl<'a, M> Iterator for InverseIter<'a, M>
where
    M: Bidi,
{
    type Item = (&'a M::Value, &'a M::Key);

    fn next(&mut self) -> Option<(&'a M::Value, &'a M::Key)> {
        let step = match self.front {
            Position::Done => return None,
            Position::Start => self.map.first_pair_by_value(),
            Position::At(v) => self.map.succ_pair_by_value(v, false),
        };

        let (k, v) = match step {
            None => {
                self.front = Position::Done;
                return None;
            }
            Some(pair) => pair,
        };

        if let Position::At(b) = self.back {
            if self.map.value_ordering(v, b) != Ordering::Less {
                self.front = Position::Done;
                return None;
            }
        }

        self.front = Position::At(v);
        Some((v, k))
    }
}

impl<'a, M> DoubleEndedIterator for InverseIter<'a, M>
where
    M: Bidi,
{
    fn next_back(&mut self) -> Option<(&'a M::Value, &'a M::Key)> {
        let step = match self.back {
            Position::Done => return None,
            Position::Start => self.map.last_pair_by_value(),
            Position::At(v) => self.map.pred_pair_by_value(v, false),
        };

        let (k, v) = match step {
            None => {
                self.back = Position::Done;
                return None;
            }
            Some(pair) => pair,
        };

        if let Position::At(f) = self.front {
            if self.map.value_ordering(v, f) != Ordering::Greater {
                self.back = Position::Done;
                return None;
            }
        }

        self.back = Position::At(v);
        Some((v, k))
    }
}
