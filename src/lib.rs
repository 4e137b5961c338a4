//! # Shelving
//!
//! In-memory containers, and a library restructuring tool built upon them.
//!
//! -   [`HashMap`]: an open-addressing hash map with bounded, hopscotch-style
//!     probing, growing by doubling.
//! -   [`OrderedSet`]: an ordered set of unique keys, stored in a red-black tree.
//! -   [`MergeSort`] and [`RadixSort`]: stable sorters over existing sequences.
//! -   [`Stack`]: a LIFO buffer.
//!
//! [`LibraryRestructuring`] groups the books of a library by co-borrowing, using
//! all of the above.
//!
//! None of the containers synchronise: they are mutated through `&mut self`,
//! and sharing one between threads requires an external lock.
pub mod error;
pub mod hash_map;
pub mod key_hash;
pub mod ordered_set;
pub mod restructuring;
pub mod sort;
pub mod stack;

pub use error::{Error, Result};
pub use hash_map::HashMap;
pub use key_hash::KeyHash;
pub use ordered_set::OrderedSet;
pub use restructuring::{Book, BorrowRecord, Cluster, LibraryRestructuring, SortBy};
pub use sort::{MergeSort, RadixSort};
pub use stack::Stack;
