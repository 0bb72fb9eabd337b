//! [SeqMap] is a hash map that maintains an explicit, caller-controlled order of its entries.
//!
//! The order is fixed when the map is built: sorted with a comparator (or by the keys' natural
//! order), adopted verbatim from a caller-supplied key sequence, or taken from a sequence of
//! key-value pairs. Mutation maintains that order: updating a value keeps an entry's position,
//! new keys join at the tail and removals shift later entries down by one position.
//!
//! Both storage halves live behind one type: a `Vec` holding the actual entries in order,
//! supplemented by a hashbrown `HashTable` that stores positions into the `Vec` for fast keyed
//! lookups. Hashes are recalculated when needed instead of being stored with the entries, and
//! the position table stores `u32` positions for small maps, upgrading to `usize` as needed.

mod pos_table;

pub use seq_map::{SeqMap, SeqMapError};

pub mod seq_map;
