//! `Arbitrary` support for the map types.

use ::quickcheck::{Arbitrary, Gen};
use compare::Compare;

impl<K, V, CK, CV> Arbitrary for crate::dual::Map<K, V, CK, CV>
where
    K: Arbitrary,
    V: Arbitrary,
    CK: 'static + Clone + Compare<K> + Default,
    CV: 'static + Clone + Compare<V> + Default,
{
    fn arbitrary(gen: &mut Gen) -> Self {
        Vec::<(K, V)>::arbitrary(gen).into_iter().collect()
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let pairs: Vec<(K, V)> = self.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        Box::new(pairs.shrink().map(|pairs| pairs.into_iter().collect()))
    }
}

impl<K, V, CK, CV> Arbitrary for crate::linked::Map<K, V, CK, CV>
where
    K: Arbitrary,
    V: Arbitrary,
    CK: 'static + Clone + Compare<K> + Default,
    CV: 'static + Clone + Compare<V> + Default,
{
    fn arbitrary(gen: &mut Gen) -> Self {
        Vec::<(K, V)>::arbitrary(gen).into_iter().collect()
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let pairs: Vec<(K, V)> = self.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        Box::new(pairs.shrink().map(|pairs| pairs.into_iter().collect()))
    }
}
