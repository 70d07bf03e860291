//! Sequence table implementation
//!
//! Open-addressing table over one flat buffer of fixed-size slots.
//!
//! ## Slot Layout
//! ```text
//! ┌──────────────────────┬───────────┬─────────┬──────────────────────────┐
//! │ Present|KeyLen (4)   │ Hash (4)  │ Id (8)  │ Key (max_key_len * W)    │
//! └──────────────────────┴───────────┴─────────┴──────────────────────────┘
//! ```
//! The high bit of the first word marks the slot live. A removed slot is
//! zeroed in place and later probes skip over it.

use std::marker::PhantomData;

use tracing::debug;

use crate::buffer::{BufferOps, HeapBufferOps};
use crate::config::MapConfig;
use crate::error::{Result, StoreError};

use super::hasher::{KeyHasher, Polynomial31Hasher};
use super::key::{KeyElement, SequenceKey};

const LENGTH_OFFSET: usize = 0;
const HASH_OFFSET: usize = 4;
const ID_OFFSET: usize = 8;
const KEY_OFFSET: usize = 16;

const PRESENT: u32 = 0x8000_0000;
const LENGTH_MASK: u32 = !PRESENT;

/// Longest key the length field can describe
const MAX_KEY_LENGTH: usize = 1 << 28;

/// Where a key belongs after probing
enum Probe {
    /// Live slot already holding the key
    Existing(usize),
    /// First free slot on the probe path
    Vacant(usize),
    /// Every slot is live and none matches
    Full,
}

/// Open-addressing map from a key of `E` elements to an `i64` id
///
/// ## Concurrency
/// None; mutation takes `&mut self`.
pub struct SequenceTable<E: KeyElement, H: KeyHasher = Polynomial31Hasher> {
    ops: HeapBufferOps,
    buffer: Vec<u8>,
    hasher: H,
    max_key_length: usize,
    slot_size: usize,
    capacity: usize,
    mask: usize,
    live: usize,
    load_factor: f32,
    grow_threshold: usize,
    missing_value: i64,
    /// While true an empty slot ends every probe walk
    no_deletes: bool,
    _element: PhantomData<E>,
}

impl<E: KeyElement> SequenceTable<E, Polynomial31Hasher> {
    /// Create a table with the default hasher and load factor
    pub fn new(max_key_length: usize, initial_size: usize, missing_value: i64) -> Result<Self> {
        let config = MapConfig::builder()
            .max_key_length(max_key_length)
            .initial_size(initial_size)
            .missing_value(missing_value)
            .build();
        Self::with_config(&config)
    }

    pub fn with_config(config: &MapConfig) -> Result<Self> {
        Self::with_hasher(config, Polynomial31Hasher)
    }
}

impl<E: KeyElement, H: KeyHasher> SequenceTable<E, H> {
    /// Create a table hashing keys with `hasher`
    pub fn with_hasher(config: &MapConfig, hasher: H) -> Result<Self> {
        config.validate()?;
        if config.max_key_length > MAX_KEY_LENGTH {
            return Err(StoreError::Config(format!(
                "max_key_length {} exceeds {}",
                config.max_key_length, MAX_KEY_LENGTH
            )));
        }

        let slot_size = KEY_OFFSET + config.max_key_length * E::WIDTH;
        let capacity = config
            .initial_size
            .checked_next_power_of_two()
            .ok_or_else(|| capacity_error(config.initial_size, slot_size))?;
        let buffer_length = capacity
            .checked_mul(slot_size)
            .ok_or_else(|| capacity_error(capacity, slot_size))?;

        Ok(Self {
            ops: HeapBufferOps,
            buffer: HeapBufferOps.allocate(buffer_length),
            hasher,
            max_key_length: config.max_key_length,
            slot_size,
            capacity,
            mask: capacity - 1,
            live: 0,
            load_factor: config.load_factor,
            grow_threshold: threshold(config.load_factor, capacity),
            missing_value: config.missing_value,
            no_deletes: true,
            _element: PhantomData,
        })
    }

    // =========================================================================
    // Map Operations
    // =========================================================================

    /// Associate `key` with `id`, overwriting any existing id for `key`
    pub fn put<K>(&mut self, key: &K, id: i64) -> Result<()>
    where
        K: SequenceKey<E> + ?Sized,
    {
        let length = key.key_length();
        if length > self.max_key_length {
            return Err(StoreError::KeyTooLong {
                length,
                max: self.max_key_length,
            });
        }

        if self.live > self.grow_threshold {
            self.grow()?;
        }

        let hash = self.hasher.hash(key.elements());
        loop {
            match self.probe_for_insert(key, hash, length) {
                Probe::Existing(slot) => {
                    let offset = self.slot_offset(slot);
                    self.ops.write_long(&mut self.buffer, offset + ID_OFFSET, id);
                    return Ok(());
                }
                Probe::Vacant(slot) => {
                    self.write_entry(slot, key, hash, length, id);
                    self.live += 1;
                    return Ok(());
                }
                Probe::Full => self.grow()?,
            }
        }
    }

    /// Id stored for `key`, or the missing value
    pub fn get<K>(&self, key: &K) -> i64
    where
        K: SequenceKey<E> + ?Sized,
    {
        match self.search(key) {
            Some(slot) => self.ops.read_long(&self.buffer, self.slot_offset(slot) + ID_OFFSET),
            None => self.missing_value,
        }
    }

    /// Remove `key`, returning its id or the missing value
    pub fn remove<K>(&mut self, key: &K) -> i64
    where
        K: SequenceKey<E> + ?Sized,
    {
        let Some(slot) = self.search(key) else {
            return self.missing_value;
        };

        let offset = self.slot_offset(slot);
        let id = self.ops.read_long(&self.buffer, offset + ID_OFFSET);
        self.buffer[offset..offset + self.slot_size].fill(0);
        self.live -= 1;
        self.no_deletes = false;
        id
    }

    /// Live entry count
    pub fn size(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Rebuild at the same capacity, clearing out removed slots
    pub fn rehash(&mut self) {
        let buffer_length = self.buffer.len();
        self.rebuild(self.capacity, buffer_length);
        debug!(capacity = self.capacity, live = self.live, "rehashed sequence table");
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Slot count (always a power of two)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_key_length(&self) -> usize {
        self.max_key_length
    }

    pub fn missing_value(&self) -> i64 {
        self.missing_value
    }

    // =========================================================================
    // Probing
    // =========================================================================

    /// Walk from the home slot looking for `key` or somewhere to put it.
    ///
    /// With no deletes the first free slot ends the cluster. Otherwise the
    /// walk covers every slot so a live copy of the key past a removed slot
    /// is found and overwritten rather than duplicated.
    fn probe_for_insert<K>(&self, key: &K, hash: u32, length: usize) -> Probe
    where
        K: SequenceKey<E> + ?Sized,
    {
        let mut vacant = None;
        let mut slot = hash as usize & self.mask;
        for _ in 0..self.capacity {
            if !self.is_present(slot) {
                if vacant.is_none() {
                    vacant = Some(slot);
                }
                if self.no_deletes {
                    break;
                }
            } else if self.matches(slot, key, hash, length) {
                return Probe::Existing(slot);
            }
            slot = (slot + 1) & self.mask;
        }
        match vacant {
            Some(slot) => Probe::Vacant(slot),
            None => Probe::Full,
        }
    }

    fn search<K>(&self, key: &K) -> Option<usize>
    where
        K: SequenceKey<E> + ?Sized,
    {
        let length = key.key_length();
        if length > self.max_key_length {
            return None;
        }

        let hash = self.hasher.hash(key.elements());
        let mut slot = hash as usize & self.mask;
        for _ in 0..self.capacity {
            if !self.is_present(slot) {
                if self.no_deletes {
                    return None;
                }
            } else if self.matches(slot, key, hash, length) {
                return Some(slot);
            }
            slot = (slot + 1) & self.mask;
        }
        None
    }

    /// Cached hash first, then length, then every element
    fn matches<K>(&self, slot: usize, key: &K, hash: u32, length: usize) -> bool
    where
        K: SequenceKey<E> + ?Sized,
    {
        let offset = self.slot_offset(slot);
        if self.ops.read_int(&self.buffer, offset + HASH_OFFSET) != hash {
            return false;
        }
        let stored_length = self.ops.read_int(&self.buffer, offset + LENGTH_OFFSET) & LENGTH_MASK;
        if stored_length as usize != length {
            return false;
        }
        let key_offset = offset + KEY_OFFSET;
        key.elements()
            .enumerate()
            .all(|(i, element)| E::read(&self.buffer, key_offset + i * E::WIDTH) == element)
    }

    // =========================================================================
    // Slot Access
    // =========================================================================

    fn slot_offset(&self, slot: usize) -> usize {
        slot * self.slot_size
    }

    fn is_present(&self, slot: usize) -> bool {
        self.ops.read_int(&self.buffer, self.slot_offset(slot) + LENGTH_OFFSET) & PRESENT != 0
    }

    fn write_entry<K>(&mut self, slot: usize, key: &K, hash: u32, length: usize, id: i64)
    where
        K: SequenceKey<E> + ?Sized,
    {
        let offset = self.slot_offset(slot);
        self.ops
            .write_int(&mut self.buffer, offset + LENGTH_OFFSET, PRESENT | length as u32);
        self.ops.write_int(&mut self.buffer, offset + HASH_OFFSET, hash);
        self.ops.write_long(&mut self.buffer, offset + ID_OFFSET, id);
        let key_offset = offset + KEY_OFFSET;
        for (i, element) in key.elements().enumerate() {
            element.write(&mut self.buffer, key_offset + i * E::WIDTH);
        }
    }

    // =========================================================================
    // Growth
    // =========================================================================

    fn grow(&mut self) -> Result<()> {
        let capacity = self
            .capacity
            .checked_mul(2)
            .ok_or_else(|| capacity_error(self.capacity, self.slot_size))?;
        let buffer_length = capacity
            .checked_mul(self.slot_size)
            .ok_or_else(|| capacity_error(capacity, self.slot_size))?;

        let old_capacity = self.capacity;
        self.rebuild(capacity, buffer_length);
        debug!(old_capacity, new_capacity = capacity, live = self.live, "grew sequence table");
        Ok(())
    }

    /// Move every live entry into a fresh buffer of `capacity` slots.
    ///
    /// Entries keep their cached hash; the fresh table has no removed slots
    /// and no duplicates, so each lands in the first free slot from home.
    fn rebuild(&mut self, capacity: usize, buffer_length: usize) {
        let old_buffer = std::mem::replace(&mut self.buffer, self.ops.allocate(buffer_length));
        let old_capacity = self.capacity;

        self.capacity = capacity;
        self.mask = capacity - 1;
        self.grow_threshold = threshold(self.load_factor, capacity);
        self.no_deletes = true;
        self.live = 0;

        for old_slot in 0..old_capacity {
            let source = old_slot * self.slot_size;
            let header = self.ops.read_int(&old_buffer, source + LENGTH_OFFSET);
            if header & PRESENT == 0 {
                continue;
            }
            let hash = self.ops.read_int(&old_buffer, source + HASH_OFFSET);

            let mut slot = hash as usize & self.mask;
            while self.is_present(slot) {
                slot = (slot + 1) & self.mask;
            }
            let target = self.slot_offset(slot);
            self.ops
                .copy_bytes(&old_buffer, &mut self.buffer, source, target, self.slot_size);
            self.live += 1;
        }
    }
}

impl<E: KeyElement, H: KeyHasher> std::fmt::Debug for SequenceTable<E, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceTable")
            .field("live", &self.live)
            .field("capacity", &self.capacity)
            .field("max_key_length", &self.max_key_length)
            .field("no_deletes", &self.no_deletes)
            .finish()
    }
}

fn threshold(load_factor: f32, capacity: usize) -> usize {
    (load_factor * capacity as f32) as usize
}

fn capacity_error(slots: usize, slot_size: usize) -> StoreError {
    StoreError::CapacityExceeded {
        requested: (slots as u64).saturating_mul(2).saturating_mul(slot_size as u64),
        max: usize::MAX as u64,
    }
}
