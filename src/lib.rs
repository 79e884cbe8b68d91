//! An ordered bidirectional map based on binary search trees.
//!
//! A bidirectional map maintains a one-to-one correspondence between a set
//! of keys and a set of values: looking up a key yields its value, looking
//! up a value yields its key, and both lookups are logarithmic. Keys are
//! unique under the key comparator and values are unique under the value
//! comparator, so inserting a pair evicts the previous pair of its key *and*
//! the previous pair of its value.
//!
//! Two engines implement the same contract:
//!
//! - [`DualMap`] stores each pair in two inner ordered trees held in
//!   lockstep, one keyed by keys and one keyed by values. Simple, but each
//!   half of a pair is stored twice, so `K: Clone` and `V: Clone` are
//!   required.
//! - [`LinkedMap`] stores each pair in a single arena node that is threaded
//!   into two independent red-black trees at once, halving the stored data
//!   and dropping the `Clone` bounds.
//!
//! Both expose ordered iteration over either domain, range-restricted
//! sub-map views, inverse and descending projections, and detached cursors
//! that detect concurrent structural modification.
//!
//! # Examples
//!
//! ```
//! let mut map = bitree::LinkedMap::new();
//!
//! map.insert(3, "c");
//! map.insert(1, "a");
//! map.insert(2, "b");
//!
//! assert_eq!(map.get(&2), Some(&"b"));
//! assert_eq!(map.get_key(&"b"), Some(&2));
//!
//! let keys: Vec<_> = map.keys().copied().collect();
//! assert_eq!(keys, [1, 2, 3]);
//!
//! // one value, one holder: 3 takes "a" away from 1
//! map.insert(3, "a");
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get(&1), None);
//! ```

pub mod dual;
pub mod linked;
pub mod tree;

mod error;
mod node;
mod range;
mod view;

#[cfg(feature = "ordered_iter")]
mod ordered_iter;

#[cfg(feature = "quickcheck")]
mod quickcheck;

#[cfg(feature = "serde")]
mod serde;

pub use crate::dual::Map as DualMap;
pub use crate::error::{Error, Result};
pub use crate::linked::Map as LinkedMap;
pub use crate::range::Bounds;
pub use crate::tree::Tree;
pub use crate::view::{
    Bidi, Descending, Inverse, InverseIter, InverseMut, SubIter, SubMap, SubMapMut,
};
