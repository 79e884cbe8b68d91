use quickcheck::{quickcheck, Arbitrary, Gen, TestResult};
use std::cmp::Ordering;

use super::node::{Dim, Id};
use super::Map;

/// An operation on a `Map`.
#[derive(Clone, Debug)]
enum Op {
    /// Insert a pair, possibly evicting by key or by value.
    Insert(u8, u8),
    /// Remove the key at index `n % map.len()`.
    RemoveKey(usize),
    /// Remove the value at index `n % map.len()` of the value ordering.
    RemoveValue(usize),
}

impl Arbitrary for Op {
    fn arbitrary(gen: &mut Gen) -> Self {
        match u8::arbitrary(gen) % 4 {
            0 | 1 => Op::Insert(u8::arbitrary(gen), u8::arbitrary(gen)),
            2 => Op::RemoveKey(usize::arbitrary(gen)),
            _ => Op::RemoveValue(usize::arbitrary(gen)),
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match self {
            Op::Insert(k, v) => Box::new((*k, *v).shrink().map(|(k, v)| Op::Insert(k, v))),
            Op::RemoveKey(index) => Box::new(index.shrink().map(Op::RemoveKey)),
            Op::RemoveValue(index) => Box::new(index.shrink().map(Op::RemoveValue)),
        }
    }
}

impl Op {
    fn exec(self, map: &mut Map<u8, u8>) {
        match self {
            Op::Insert(k, v) => {
                map.insert(k, v);
            }
            Op::RemoveKey(index) => {
                if !map.is_empty() {
                    let key = *map.iter().nth(index % map.len()).unwrap().0;
                    map.remove(&key);
                }
            }
            Op::RemoveValue(index) => {
                if !map.is_empty() {
                    let value = *map.iter_by_value().nth(index % map.len()).unwrap().1;
                    map.remove_value(&value);
                }
            }
        }
    }
}

/// Walks one tree, checking parent links, search order, the red-red rule,
/// and equal black heights. Returns (black height, node count).
fn check_tree(
    map: &Map<u8, u8>,
    dim: Dim,
    id: Option<Id>,
    parent: Option<Id>,
    parent_red: bool,
) -> (usize, usize) {
    let id = match id {
        None => return (1, 0),
        Some(id) => id,
    };

    let links = map.links(dim, id);
    assert_eq!(links.parent, parent);

    if parent_red {
        assert!(!links.red, "red node with a red parent");
    }

    if let Some(left) = links.left {
        assert_eq!(map.ordering(dim, left, id), Ordering::Less);
    }
    if let Some(right) = links.right {
        assert_eq!(map.ordering(dim, right, id), Ordering::Greater);
    }

    let (left_height, left_count) = check_tree(map, dim, links.left, Some(id), links.red);
    let (right_height, right_count) = check_tree(map, dim, links.right, Some(id), links.red);
    assert_eq!(left_height, right_height, "unequal black heights");

    (left_height + usize::from(!links.red), left_count + right_count + 1)
}

fn assert_red_black(map: &Map<u8, u8>) {
    for dim in [Dim::Key, Dim::Value] {
        if let Some(root) = map.root(dim) {
            assert!(!map.links(dim, root).red, "red root");
        }

        let (_, count) = check_tree(map, dim, map.root(dim), None, false);
        assert_eq!(count, map.len(), "tree does not reach every node");
    }

    for (k, v) in map.iter() {
        assert_eq!(map.get(k), Some(v));
        assert_eq!(map.get_key(v), Some(k));
    }
}

#[test]
fn test_red_black() {
    fn check(ops: Vec<Op>) -> TestResult {
        let mut map = Map::new();
        for op in ops {
            op.exec(&mut map);
        }
        assert_red_black(&map);
        TestResult::passed()
    }

    quickcheck(check as fn(_) -> _);
}

#[test]
fn test_red_black_dense() {
    // a small domain forces constant evictions on both sides
    let mut map = Map::new();

    for i in 0u32..512 {
        map.insert((i * 7 % 32) as u8, (i * 13 % 32) as u8);
        assert_red_black(&map);
    }

    for i in 0u8..32 {
        map.remove(&i);
        assert_red_black(&map);
    }

    assert!(map.is_empty());
}

#[test]
fn test_ascending_after_ops() {
    fn check(ops: Vec<Op>) -> bool {
        let mut map = Map::new();
        for op in ops {
            op.exec(&mut map);
        }

        let keys_sorted = map.iter().zip(map.iter().skip(1)).all(|(a, b)| a.0 < b.0);
        let values_sorted = map
            .iter_by_value()
            .zip(map.iter_by_value().skip(1))
            .all(|(a, b)| a.1 < b.1);

        keys_sorted && values_sorted
    }

    quickcheck(check as fn(_) -> _);
}
