//! Map Module
//!
//! Open-addressing maps from variable-length keys to 64-bit ids, used to
//! build secondary lookups whose values are ids resolved through a
//! [`RecordStore`](crate::store::RecordStore).
//!
//! ## Responsibilities
//! - Insert-or-overwrite, lookup and removal by key
//! - Linear probing from `hash & mask` over fixed-size slots
//! - Doubling growth past the load factor; same-size rehash on demand
//! - Reject keys longer than the configured maximum
//!
//! ## Probe Termination
//! A walk stops on a matching slot. It also stops on an empty slot, but only
//! while the table has never had a removal: a removed slot is zeroed in place
//! and may sit inside a live cluster, so after the first removal every miss
//! walks the whole table. `rehash()` restores the fast exit.
//!
//! The byte and char variants share one implementation and differ only in
//! element width.

mod hasher;
mod key;
mod table;

use crate::error::Result;

pub use hasher::{Crc32Hasher, KeyHasher, Polynomial31Hasher};
pub use key::{KeyElement, SequenceKey};
pub use table::SequenceTable;

/// Map keyed by byte sequences
pub type ByteSequenceMap<H = Polynomial31Hasher> = SequenceTable<u8, H>;

/// Map keyed by UTF-16 char sequences
pub type CharSequenceMap<H = Polynomial31Hasher> = SequenceTable<u16, H>;

/// Key → id map contract
pub trait SequenceMap<K: ?Sized> {
    /// Insert `id` under `key`, overwriting an existing entry
    fn put(&mut self, key: &K, id: i64) -> Result<()>;

    /// Id under `key`, or the map's missing value
    fn get(&self, key: &K) -> i64;

    /// Remove `key`, returning its id or the map's missing value
    fn remove(&mut self, key: &K) -> i64;

    /// Live entry count
    fn size(&self) -> usize;

    /// Rebuild in place at the current capacity
    fn rehash(&mut self);
}

impl<E, H, K> SequenceMap<K> for SequenceTable<E, H>
where
    E: KeyElement,
    H: KeyHasher,
    K: SequenceKey<E> + ?Sized,
{
    fn put(&mut self, key: &K, id: i64) -> Result<()> {
        SequenceTable::put(self, key, id)
    }

    fn get(&self, key: &K) -> i64 {
        SequenceTable::get(self, key)
    }

    fn remove(&mut self, key: &K) -> i64 {
        SequenceTable::remove(self, key)
    }

    fn size(&self) -> usize {
        SequenceTable::size(self)
    }

    fn rehash(&mut self) {
        SequenceTable::rehash(self)
    }
}
