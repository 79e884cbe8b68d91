//! Node machinery for the comparator-ordered tree.
//!
//! The balance scheme is an AA tree: every node carries a level, left
//! children are strictly one level down, and right children are at most one
//! level down with no two consecutive horizontal links.

mod iter;


use compare::Compare;
use std::cmp::Ordering::*;
use std::mem::{replace, swap};

pub use self::iter::{Iter, MarkedNode};

pub type Link<K, V> = Option<Box<Node<K, V>>>;

#[derive(Clone)]
pub struct Node<K, V> {
    pub left: Link<K, V>,
    pub right: Link<K, V>,
    pub level: usize,
    pub key: K,
    pub value: V,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V) -> Self {
        Node { left: None, right: None, level: 1, key, value }
    }

    fn rebalance(node: &mut Box<Node<K, V>>) {
        let left_level = node.left.as_ref().map_or(0, |node| node.level);
        let right_level = node.right.as_ref().map_or(0, |node| node.level);

        // re-balance, if necessary
        if left_level < node.level - 1 || right_level < node.level - 1 {
            node.level -= 1;

            if right_level > node.level {
                let node_level = node.level;
                if let Some(x) = node.right.as_mut() {
                    x.level = node_level;
                }
            }

            Node::skew(node);

            if let Some(right) = node.right.as_mut() {
                Node::skew(right);
                if let Some(x) = right.right.as_mut() {
                    Node::skew(x);
                }
            }

            Node::split(node);
            if let Some(x) = node.right.as_mut() {
                Node::split(x);
            }
        }
    }

    // Remove left horizontal link by rotating right
    fn skew(node: &mut Box<Self>) {
        if node.left.as_ref().map_or(false, |x| x.level == node.level) {
            let mut save = node.left.take().unwrap();
            swap(&mut node.left, &mut save.right); // save.right now None
            swap(node, &mut save);
            node.right = Some(save);
        }
    }

    // Remove dual horizontal link by rotating left and increasing level of
    // the parent
    fn split(node: &mut Box<Self>) {
        if node
            .right
            .as_ref()
            .map_or(false, |x| x.right.as_ref().map_or(false, |y| y.level == node.level))
        {
            let mut save = node.right.take().unwrap();
            swap(&mut node.right, &mut save.left); // save.left now None
            save.level += 1;
            swap(node, &mut save);
            node.left = Some(save);
        }
    }
}

pub fn insert<K, V, C>(link: &mut Link<K, V>, cmp: &C, key: K, value: V) -> Option<V>
where
    C: Compare<K>,
{
    match link {
        None => {
            *link = Some(Box::new(Node::new(key, value)));
            None
        }
        Some(node) => {
            let old_value = match cmp.compare(&key, &node.key) {
                Equal => return Some(replace(&mut node.value, value)),
                Less => insert(&mut node.left, cmp, key, value),
                Greater => insert(&mut node.right, cmp, key, value),
            };

            Node::skew(node);
            Node::split(node);
            old_value
        }
    }
}

pub fn get<'a, K, V, C, Q: ?Sized>(link: &'a Link<K, V>, cmp: &C, key: &Q) -> Option<(&'a K, &'a V)>
where
    C: Compare<Q, K>,
{
    let mut link = link;

    while let Some(node) = link {
        match cmp.compare(key, &node.key) {
            Less => link = &node.left,
            Equal => return Some((&node.key, &node.value)),
            Greater => link = &node.right,
        }
    }

    None
}

pub fn get_mut<'a, K, V, C, Q: ?Sized>(
    link: &'a mut Link<K, V>,
    cmp: &C,
    key: &Q,
) -> Option<(&'a K, &'a mut V)>
where
    C: Compare<Q, K>,
{
    let mut link = link;

    while let Some(node) = link {
        match cmp.compare(key, &node.key) {
            Less => link = &mut node.left,
            Equal => return Some((&node.key, &mut node.value)),
            Greater => link = &mut node.right,
        }
    }

    None
}

pub fn remove<K, V, C, Q: ?Sized>(link: &mut Link<K, V>, cmp: &C, key: &Q) -> Option<(K, V)>
where
    C: Compare<Q, K>,
{
    let node = match link {
        None => return None,
        Some(node) => node,
    };

    let removed = match cmp.compare(key, &node.key) {
        Less => remove(&mut node.left, cmp, key),
        Greater => remove(&mut node.right, cmp, key),
        Equal => {
            let replacement = if node.left.is_some() {
                remove_max(&mut node.left)
            } else if node.right.is_some() {
                remove_min(&mut node.right)
            } else {
                None
            };

            match replacement {
                Some((k, v)) => Some((replace(&mut node.key, k), replace(&mut node.value, v))),
                None => {
                    let node = *link.take().unwrap();
                    return Some((node.key, node.value));
                }
            }
        }
    };

    if removed.is_some() {
        if let Some(node) = link.as_mut() {
            Node::rebalance(node);
        }
    }

    removed
}

pub fn remove_min<K, V>(link: &mut Link<K, V>) -> Option<(K, V)> {
    match link {
        None => None,
        Some(node) if node.left.is_some() => {
            let key_value = remove_min(&mut node.left);
            Node::rebalance(node);
            key_value
        }
        Some(_) => {
            let node = *link.take().unwrap();
            *link = node.right;
            Some((node.key, node.value))
        }
    }
}

pub fn remove_max<K, V>(link: &mut Link<K, V>) -> Option<(K, V)> {
    match link {
        None => None,
        Some(node) if node.right.is_some() => {
            let key_value = remove_max(&mut node.right);
            Node::rebalance(node);
            key_value
        }
        Some(_) => {
            let node = *link.take().unwrap();
            *link = node.left;
            Some((node.key, node.value))
        }
    }
}

pub fn first<K, V>(link: &Link<K, V>) -> Option<(&K, &V)> {
    let mut node = link.as_deref()?;

    while let Some(left) = node.left.as_deref() {
        node = left;
    }

    Some((&node.key, &node.value))
}

pub fn last<K, V>(link: &Link<K, V>) -> Option<(&K, &V)> {
    let mut node = link.as_deref()?;

    while let Some(right) = node.right.as_deref() {
        node = right;
    }

    Some((&node.key, &node.value))
}

pub fn succ<'a, K, V, C, Q: ?Sized>(
    link: &'a Link<K, V>,
    cmp: &C,
    key: &Q,
    inclusive: bool,
) -> Option<(&'a K, &'a V)>
where
    C: Compare<Q, K>,
{
    let mut cur = link.as_deref();
    let mut save: Option<&'a Node<K, V>> = None;

    while let Some(node) = cur {
        match cmp.compare(key, &node.key) {
            Less => {
                save = Some(node);
                cur = node.left.as_deref();
            }
            Equal => {
                return if inclusive {
                    Some((&node.key, &node.value))
                } else {
                    first(&node.right).or_else(|| save.map(|n| (&n.key, &n.value)))
                };
            }
            Greater => cur = node.right.as_deref(),
        }
    }

    save.map(|n| (&n.key, &n.value))
}

pub fn pred<'a, K, V, C, Q: ?Sized>(
    link: &'a Link<K, V>,
    cmp: &C,
    key: &Q,
    inclusive: bool,
) -> Option<(&'a K, &'a V)>
where
    C: Compare<Q, K>,
{
    let mut cur = link.as_deref();
    let mut save: Option<&'a Node<K, V>> = None;

    while let Some(node) = cur {
        match cmp.compare(key, &node.key) {
            Greater => {
                save = Some(node);
                cur = node.right.as_deref();
            }
            Equal => {
                return if inclusive {
                    Some((&node.key, &node.value))
                } else {
                    last(&node.left).or_else(|| save.map(|n| (&n.key, &n.value)))
                };
            }
            Less => cur = node.left.as_deref(),
        }
    }

    save.map(|n| (&n.key, &n.value))
}
