//! End-to-end contract scenarios, run against both engines.

use bitree::{Bounds, Error};
use std::ops::Bound::{Excluded, Included};

macro_rules! contract {
    ($engine:ident) => {
        mod $engine {
            use super::*;

            type Map<K, V> = bitree::$engine::Map<K, V>;

            #[test]
            fn value_collision_evicts_previous_holder() {
                let mut map = Map::new();
                map.insert("a", 1);
                map.insert("b", 2);
                map.insert("a", 2);

                assert_eq!(map.len(), 1);
                assert_eq!(map.get(&"a"), Some(&2));
                assert_eq!(map.get(&"b"), None);
                assert_eq!(map.get_key(&1), None);
                assert_eq!(map.get_key(&2), Some(&"a"));
            }

            #[test]
            fn key_collision_replaces_value() {
                let mut map = Map::new();
                map.insert("a", 1);

                assert_eq!(map.insert("a", 2), Some(1));
                assert_eq!(map.len(), 1);
                assert_eq!(map.get(&"a"), Some(&2));
                assert_eq!(map.get_key(&1), None);
            }

            #[test]
            fn ordered_traversal() {
                let mut map = Map::new();
                map.insert(3, "c");
                map.insert(1, "a");
                map.insert(2, "b");

                let keys: Vec<i32> = map.keys().copied().collect();
                assert_eq!(keys, [1, 2, 3]);

                let descending: Vec<i32> = map.keys().rev().copied().collect();
                assert_eq!(descending, [3, 2, 1]);

                let values: Vec<&str> = map.values().copied().collect();
                assert_eq!(values, ["a", "b", "c"]);
            }

            #[test]
            fn inverse_view_reads_and_writes() {
                let mut map = Map::new();
                map.insert(3, "c");
                map.insert(1, "a");
                map.insert(2, "b");

                assert_eq!(map.inverse().get(&"b"), Some(&2));
                assert_eq!(map.inverse().first(), Some((&"a", &1)));

                map.inverse_mut().insert("d", 4);
                assert_eq!(map.get(&4), Some(&"d"));
                assert_eq!(map.len(), 4);
            }

            #[test]
            fn inverse_of_inverse_is_the_original() {
                let mut map = Map::new();
                map.insert(1, "a");

                let inverse = map.inverse();
                assert!(std::ptr::eq(inverse.inverse(), &map));
            }

            #[test]
            fn inverse_iterates_in_value_order() {
                let mut map = Map::new();
                map.insert(1, "c");
                map.insert(2, "a");
                map.insert(3, "b");

                let swapped: Vec<(&str, i32)> =
                    map.inverse().iter().map(|(v, k)| (*v, *k)).collect();
                assert_eq!(swapped, [("a", 2), ("b", 3), ("c", 1)]);
            }

            #[test]
            fn sub_map_filters_and_rejects() {
                let mut map = Map::new();
                for k in 1..=5 {
                    map.insert(k, k.to_string());
                }

                let keys = Bounds::new(Included(2), Excluded(4));
                let mut sub = map.sub_map_mut(keys, Bounds::full());

                assert_eq!(sub.len(), 2);
                assert!(sub.contains_key(&2));
                assert!(sub.contains_key(&3));
                assert!(!sub.contains_key(&4));

                assert_eq!(sub.insert(5, "x".to_string()), Err(Error::ValueChangeNotAllowed));
                assert_eq!(map.len(), 5);
                assert_eq!(map.get(&5), Some(&"5".to_string()));
            }

            #[test]
            fn sub_map_insert_within_range() {
                let mut map = Map::new();
                map.insert(2, "b");
                map.insert(9, "z");

                let mut sub = map.sub_map_mut(Bounds::new(Included(2), Excluded(5)), Bounds::full());
                assert_eq!(sub.insert(3, "c"), Ok(None));

                assert_eq!(map.get(&3), Some(&"c"));
            }

            #[test]
            fn sub_map_insert_rejects_eviction_outside_view() {
                let mut map = Map::new();
                map.insert(2, "b");
                map.insert(9, "z");

                // inserting (3, "z") would evict (9, "z"), which the view cannot see
                let mut sub = map.sub_map_mut(Bounds::new(Included(2), Excluded(5)), Bounds::full());
                assert_eq!(sub.insert(3, "z"), Err(Error::ValueChangeNotAllowed));

                assert_eq!(map.get(&9), Some(&"z"));
                assert_eq!(map.len(), 2);
            }

            #[test]
            fn sub_map_insert_if_absent_never_evicts() {
                let mut map = Map::new();
                map.insert(2, "b");

                let mut sub = map.sub_map_mut(Bounds::new(Included(2), Excluded(5)), Bounds::full());

                assert_eq!(sub.insert_if_absent(2, "q"), Ok(false));
                assert_eq!(sub.insert_if_absent(3, "b"), Err(Error::ValueChangeNotAllowed));
                assert_eq!(sub.insert_if_absent(3, "c"), Ok(true));

                assert_eq!(map.get(&2), Some(&"b"));
                assert_eq!(map.get(&3), Some(&"c"));
            }

            #[test]
            fn sub_map_value_membership_checks_the_key_side() {
                let mut map = Map::new();
                map.insert(1, 10);
                map.insert(5, 20);

                // 20 is inside the value range, but its holder is outside the keys
                let sub = map.sub_map(
                    Bounds::new(Included(1), Excluded(4)),
                    Bounds::new(Included(0), Included(30)),
                );

                assert!(sub.contains_value(&10));
                assert!(!sub.contains_value(&20));
            }

            #[test]
            fn sub_map_poll_respects_the_value_range() {
                let mut map = Map::new();
                map.insert(1, 30);
                map.insert(2, 10);
                map.insert(3, 20);

                let mut sub =
                    map.sub_map_mut(Bounds::full(), Bounds::new(Included(5), Included(25)));

                // (1, 30) is invisible: polling must skip it, not remove it
                assert_eq!(sub.remove_first(), Some((2, 10)));
                assert_eq!(sub.remove_last(), Some((3, 20)));
                assert_eq!(sub.remove_first(), None);

                assert_eq!(map.len(), 1);
                assert_eq!(map.get(&1), Some(&30));
            }

            #[test]
            fn sub_map_clear_spares_invisible_pairs() {
                let mut map = Map::new();
                for k in 1..=5 {
                    map.insert(k, k * 10);
                }

                map.sub_map_mut(Bounds::new(Included(2), Excluded(4)), Bounds::full()).clear();

                let keys: Vec<i32> = map.keys().copied().collect();
                assert_eq!(keys, [1, 4, 5]);
            }

            #[test]
            fn sub_map_ranges_compose() {
                let mut map = Map::new();
                for k in 1..=9 {
                    map.insert(k, k * 10);
                }

                let sub = map.head(8, false).tail(2, true).sub(Bounds::new(Included(3), Included(9)));
                let keys: Vec<i32> = sub.iter().map(|(k, _)| *k).collect();
                assert_eq!(keys, [3, 4, 5, 6, 7]);
            }

            #[test]
            fn sub_map_navigation_skips_filtered_values() {
                let mut map = Map::new();
                map.insert(1, 10);
                map.insert(2, 99);
                map.insert(3, 20);

                let sub = map.sub_map(Bounds::full(), Bounds::new(Included(0), Included(50)));

                assert_eq!(sub.succ(&1, false), Some((&3, &20)));
                assert_eq!(sub.pred(&3, false), Some((&1, &10)));
                assert_eq!(sub.first(), Some((&1, &10)));
                assert_eq!(sub.last(), Some((&3, &20)));
            }

            #[test]
            fn cursor_detects_concurrent_modification() {
                let mut map = Map::new();
                map.insert(1, "a");

                let mut cursor = map.cursor();
                map.insert(2, "b");

                assert_eq!(cursor.next(&map), Err(Error::ConcurrentModification));

                cursor.reset(&map);
                assert_eq!(cursor.next(&map), Ok(Some((&1, &"a"))));
            }

            #[test]
            fn cursor_walks_both_directions() {
                let mut map = Map::new();
                map.insert(2, "b");
                map.insert(1, "a");
                map.insert(3, "c");

                let mut cursor = map.cursor();
                assert_eq!(cursor.next(&map), Ok(Some((&1, &"a"))));
                assert_eq!(cursor.next(&map), Ok(Some((&2, &"b"))));
                assert_eq!(cursor.prev(&map), Ok(Some((&2, &"b"))));
                assert_eq!(cursor.next(&map), Ok(Some((&2, &"b"))));
                assert_eq!(cursor.next(&map), Ok(Some((&3, &"c"))));
                assert_eq!(cursor.next(&map), Ok(None));
                assert_eq!(cursor.prev(&map), Ok(Some((&3, &"c"))));
            }

            #[test]
            fn cursor_accessors_need_a_step_first() {
                let mut map = Map::new();
                map.insert(1, "a");

                let mut cursor = map.cursor();
                assert_eq!(cursor.current(&map), Err(Error::IllegalState));
                assert_eq!(cursor.set_value(&mut map, "z"), Err(Error::IllegalState));

                cursor.next(&map).unwrap();
                assert_eq!(cursor.current(&map), Ok((&1, &"a")));
            }

            #[test]
            fn cursor_set_value_is_strict_about_other_holders() {
                let mut map = Map::new();
                map.insert(1, "a");
                map.insert(2, "b");

                let mut cursor = map.cursor();
                cursor.next(&map).unwrap();

                // "b" belongs to key 2: refused, nothing evicted
                assert_eq!(cursor.set_value(&mut map, "b"), Err(Error::ValueChangeNotAllowed));
                assert_eq!(map.get(&2), Some(&"b"));

                assert_eq!(cursor.set_value(&mut map, "z"), Ok("a"));
                assert_eq!(map.get(&1), Some(&"z"));

                // the cursor stays valid and keeps iterating
                assert_eq!(cursor.next(&map), Ok(Some((&2, &"b"))));
            }

            #[test]
            fn cursor_remove_recomputes_the_anchor() {
                let mut map = Map::new();
                for k in 1..=4 {
                    map.insert(k, k * 10);
                }

                let mut cursor = map.cursor();
                cursor.next(&map).unwrap();
                cursor.next(&map).unwrap();

                assert_eq!(cursor.remove(&mut map), Ok((2, 20)));
                assert_eq!(cursor.next(&map), Ok(Some((&3, &30))));
                assert_eq!(cursor.prev(&map), Ok(Some((&3, &30))));
                assert_eq!(cursor.prev(&map), Ok(Some((&1, &10))));
            }

            #[test]
            fn insert_if_absent_keeps_the_bound_pair() {
                let mut map = Map::new();
                map.insert(1, "a");

                assert_eq!(map.insert_if_absent(1, "z"), Some(&"a"));
                assert_eq!(map.get(&1), Some(&"a"));

                // absent key: behaves as a plain insert, including eviction
                assert_eq!(map.insert_if_absent(2, "a"), None);
                assert_eq!(map.get(&1), None);
                assert_eq!(map.get(&2), Some(&"a"));
            }

            #[test]
            fn replace_only_touches_bound_keys() {
                let mut map = Map::new();
                map.insert(1, "a");
                map.insert(2, "b");

                assert_eq!(map.replace(&9, "q"), None);
                assert_eq!(map.len(), 2);

                assert_eq!(map.replace(&1, "z"), Some("a"));
                assert_eq!(map.get(&1), Some(&"z"));

                // replacing with a value held elsewhere evicts its holder
                assert_eq!(map.replace(&1, "b"), Some("z"));
                assert_eq!(map.get(&2), None);
                assert_eq!(map.len(), 1);
            }

            #[test]
            fn replace_pair_requires_the_old_value() {
                let mut map = Map::new();
                map.insert(1, "a");

                assert!(!map.replace_pair(&1, &"x", "z"));
                assert_eq!(map.get(&1), Some(&"a"));

                assert!(map.replace_pair(&1, &"a", "z"));
                assert_eq!(map.get(&1), Some(&"z"));
            }

            #[test]
            fn remove_pair_requires_both_halves() {
                let mut map = Map::new();
                map.insert(1, "a");

                assert!(!map.remove_pair(&1, &"b"));
                assert!(!map.remove_pair(&2, &"a"));
                assert_eq!(map.len(), 1);

                assert!(map.remove_pair(&1, &"a"));
                assert!(map.is_empty());
            }

            #[test]
            fn compute_family() {
                let mut map = Map::new();

                assert_eq!(map.compute_if_absent(1, |_| "a"), &"a");
                assert_eq!(map.compute_if_absent(1, |_| "z"), &"a");

                assert_eq!(map.compute_if_present(&1, |_, _| Some("b")), Some(&"b"));
                assert_eq!(map.compute_if_present(&1, |_, _| None), None);
                assert!(map.is_empty());
                assert_eq!(map.compute_if_present(&1, |_, _| Some("q")), None);

                assert_eq!(map.compute(2, |_, current| {
                    assert_eq!(current, None);
                    Some("c")
                }), Some(&"c"));
                assert_eq!(map.compute(2, |_, _| None), None);
                assert!(map.is_empty());

                assert_eq!(map.merge(3, "m", |_, _| unreachable!()), Some(&"m"));
                assert_eq!(map.merge(3, "n", |current, next| {
                    assert_eq!(*current, "m");
                    Some(next)
                }), Some(&"n"));
                assert_eq!(map.merge(3, "x", |_, _| None), None);
                assert!(map.is_empty());
            }

            #[test]
            fn extremes_and_navigation() {
                let mut map = Map::new();
                assert_eq!(map.first(), None);
                assert_eq!(map.last(), None);
                assert_eq!(map.remove_first(), None);
                assert_eq!(map.remove_last(), None);

                map.insert(2, 20);
                map.insert(1, 30);
                map.insert(3, 10);

                assert_eq!(map.first(), Some((&1, &30)));
                assert_eq!(map.last(), Some((&3, &10)));
                assert_eq!(map.first_by_value(), Some((&3, &10)));
                assert_eq!(map.last_by_value(), Some((&1, &30)));

                assert_eq!(map.succ(&1, false), Some((&2, &20)));
                assert_eq!(map.succ(&1, true), Some((&1, &30)));
                assert_eq!(map.pred(&3, false), Some((&2, &20)));
                assert_eq!(map.pred(&0, true), None);
                assert_eq!(map.succ_by_value(&15, true), Some((&2, &20)));
                assert_eq!(map.pred_by_value(&15, true), Some((&3, &10)));

                assert_eq!(map.remove_first(), Some((1, 30)));
                assert_eq!(map.remove_last(), Some((3, 10)));
                assert_eq!(map.len(), 1);
            }

            #[test]
            fn descending_view_navigation() {
                let mut map = Map::new();
                map.insert(1, "a");
                map.insert(2, "b");
                map.insert(3, "c");

                let descending = map.descending();
                assert_eq!(descending.first(), Some((&3, &"c")));
                assert_eq!(descending.last(), Some((&1, &"a")));
                assert_eq!(descending.succ(&3, false), Some((&2, &"b")));
                assert_eq!(descending.pred(&2, false), Some((&3, &"c")));
                assert!(std::ptr::eq(descending.descending(), &map));
            }

            #[test]
            fn display_renders_pairs_in_key_order() {
                let mut map = Map::new();
                map.insert(2, "b");
                map.insert(1, "a");

                assert_eq!(map.to_string(), "{1=a, 2=b}");
                assert_eq!(format!("{:?}", map), r#"{1: "a", 2: "b"}"#);
            }

            #[test]
            fn equality_ignores_construction_order() {
                let forward: Map<i32, i32> = (0..16).map(|i| (i, i * 2)).collect();
                let backward: Map<i32, i32> = (0..16).rev().map(|i| (i, i * 2)).collect();

                assert_eq!(forward, backward);
                assert_ne!(forward, Map::new());
            }

            #[test]
            fn extend_inserts_in_source_order() {
                let mut map = Map::new();
                map.extend([(1, "a"), (2, "b"), (1, "c")]);

                assert_eq!(map.len(), 2);
                assert_eq!(map.get(&1), Some(&"c"));
            }

            #[test]
            fn clearing_resets_everything() {
                let mut map: Map<i32, i32> = (0..64).map(|i| (i, -i)).collect();
                map.clear();

                assert!(map.is_empty());
                assert_eq!(map.iter().count(), 0);
                assert_eq!(map.first(), None);

                map.insert(1, 2);
                assert_eq!(map.len(), 1);
            }

            #[test]
            fn into_iterator_consumes_in_key_order() {
                let map: Map<i32, i32> = [(3, 30), (1, 10), (2, 20)].into_iter().collect();
                let pairs: Vec<(i32, i32)> = map.into_iter().collect();

                assert_eq!(pairs, [(1, 10), (2, 20), (3, 30)]);
            }
        }
    };
}

contract! {dual}
contract! {linked}

mod engines_agree {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    // Both engines implement one contract; random op sequences over a small
    // domain (plenty of key and value collisions) must be indistinguishable.
    #[test]
    fn random_op_sequences_match() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..64 {
            let mut dual = bitree::DualMap::new();
            let mut linked = bitree::LinkedMap::new();

            for _ in 0..256 {
                match rng.gen_range(0..5) {
                    0 | 1 => {
                        let k: u8 = rng.gen_range(0..24);
                        let v: u8 = rng.gen_range(0..24);
                        assert_eq!(dual.insert(k, v), linked.insert(k, v));
                    }
                    2 => {
                        let k: u8 = rng.gen_range(0..24);
                        assert_eq!(dual.remove(&k), linked.remove(&k));
                    }
                    3 => {
                        let v: u8 = rng.gen_range(0..24);
                        assert_eq!(dual.remove_value(&v), linked.remove_value(&v));
                    }
                    _ => {
                        let k: u8 = rng.gen_range(0..24);
                        assert_eq!(dual.get(&k), linked.get(&k));
                        assert_eq!(dual.get_key(&k), linked.get_key(&k));
                    }
                }

                assert_eq!(dual.len(), linked.len());
            }

            let by_key: Vec<(u8, u8)> = dual.iter().map(|(k, v)| (*k, *v)).collect();
            assert_eq!(by_key, linked.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>());

            let by_value: Vec<(u8, u8)> = dual.iter_by_value().map(|(k, v)| (*k, *v)).collect();
            assert_eq!(
                by_value,
                linked.iter_by_value().map(|(k, v)| (*k, *v)).collect::<Vec<_>>()
            );
        }
    }
}
