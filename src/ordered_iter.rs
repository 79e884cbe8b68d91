use ::ordered_iter::{OrderedMapIterator, OrderedSetIterator};
use compare::Compare;

use crate::{dual, linked, tree};

impl<'a, K, V> OrderedMapIterator for tree::Iter<'a, K, V>
where
    K: Ord,
{
    type Key = &'a K;
    type Val = &'a V;
}

impl<K, V> OrderedMapIterator for tree::IntoIter<K, V>
where
    K: Ord,
{
    type Key = K;
    type Val = V;
}

impl<'a, K, V> OrderedMapIterator for dual::Iter<'a, K, V>
where
    K: Ord,
{
    type Key = &'a K;
    type Val = &'a V;
}

impl<'a, K, V> OrderedSetIterator for dual::Keys<'a, K, V> where K: Ord {}

impl<'a, K, V, CK, CV> OrderedMapIterator for linked::Iter<'a, K, V, CK, CV>
where
    K: Ord,
    CK: Compare<K>,
    CV: Compare<V>,
{
    type Key = &'a K;
    type Val = &'a V;
}

impl<'a, K, V, CK, CV> OrderedSetIterator for linked::Keys<'a, K, V, CK, CV>
where
    K: Ord,
    CK: Compare<K>,
    CV: Compare<V>,
{
}
