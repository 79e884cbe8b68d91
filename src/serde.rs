//! Serialization and deserialization of the map types.
//!
//! A map serializes as a map of its pairs in ascending key order. Restore
//! replays the pairs as sequential inserts into an empty map, so the
//! deserialized map uses the `Default` comparators; non-default comparators
//! are configuration the caller re-supplies by other means.

use ::serde::de::{MapAccess, Visitor};
use ::serde::ser::SerializeMap;
use ::serde::{Deserialize, Deserializer, Serialize, Serializer};
use compare::Compare;
use std::fmt;
use std::marker::PhantomData;

impl<K, V, CK, CV> Serialize for crate::dual::Map<K, V, CK, CV>
where
    K: Clone + Serialize,
    V: Clone + Serialize,
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de, K, V, CK, CV> Deserialize<'de> for crate::dual::Map<K, V, CK, CV>
where
    K: Clone + Deserialize<'de>,
    V: Clone + Deserialize<'de>,
    CK: Compare<K> + Default,
    CV: Compare<V> + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DualVisitor<K, V, CK, CV>(PhantomData<(K, V, CK, CV)>);

        impl<'de, K, V, CK, CV> Visitor<'de> for DualVisitor<K, V, CK, CV>
        where
            K: Clone + Deserialize<'de>,
            V: Clone + Deserialize<'de>,
            CK: Compare<K> + Default,
            CV: Compare<V> + Default,
        {
            type Value = crate::dual::Map<K, V, CK, CV>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of pairs")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map: Self::Value = Default::default();
                while let Some((key, value)) = access.next_entry()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(DualVisitor(PhantomData))
    }
}

impl<K, V, CK, CV> Serialize for crate::linked::Map<K, V, CK, CV>
where
    K: Serialize,
    V: Serialize,
    CK: Compare<K>,
    CV: Compare<V>,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de, K, V, CK, CV> Deserialize<'de> for crate::linked::Map<K, V, CK, CV>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
    CK: Compare<K> + Default,
    CV: Compare<V> + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LinkedVisitor<K, V, CK, CV>(PhantomData<(K, V, CK, CV)>);

        impl<'de, K, V, CK, CV> Visitor<'de> for LinkedVisitor<K, V, CK, CV>
        where
            K: Deserialize<'de>,
            V: Deserialize<'de>,
            CK: Compare<K> + Default,
            CV: Compare<V> + Default,
        {
            type Value = crate::linked::Map<K, V, CK, CV>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of pairs")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map: Self::Value = Default::default();
                while let Some((key, value)) = access.next_entry()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(LinkedVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use crate::{DualMap, LinkedMap};

    #[test]
    fn round_trip_dual() {
        let mut map = DualMap::new();
        for i in 0..32 {
            map.insert(i, (i * 2).to_string());
        }

        let json = serde_json::to_string(&map).expect("failed to serialize map");
        let restored: DualMap<i32, String> =
            serde_json::from_str(&json).expect("failed to deserialize map");

        assert_eq!(restored, map);
    }

    #[test]
    fn round_trip_linked() {
        let mut map = LinkedMap::new();
        for i in 0..32 {
            map.insert(i, (i * 2).to_string());
        }

        let json = serde_json::to_string(&map).expect("failed to serialize map");
        let restored: LinkedMap<i32, String> =
            serde_json::from_str(&json).expect("failed to deserialize map");

        assert_eq!(restored, map);
    }

    #[test]
    fn serializes_in_key_order() {
        let mut map = LinkedMap::new();
        map.insert(3, "c".to_string());
        map.insert(1, "a".to_string());
        map.insert(2, "b".to_string());

        let json = serde_json::to_string(&map).expect("failed to serialize map");
        assert_eq!(json, r#"{"1":"a","2":"b","3":"c"}"#);
    }
}
