//! Record Store
//!
//! Arena of fixed-size slots fronted by an id → offset index.
//!
//! ## Layout
//! ```text
//! ┌──────────┬──────────────────────┬──────────────────────┬─────┬──────────────┐
//! │ Header   │ Slot 0               │ Slot 1               │ ... │ free         │
//! │ (16)     │ [Id (8)][Payload (N)]│ [Id (8)][Payload (N)]│     │              │
//! └──────────┴──────────────────────┴──────────────────────┴─────┴──────────────┘
//!            ▲                                                   ▲              ▲
//!        Header::LENGTH                                  next_write_offset   capacity
//! ```
//!
//! Live slots always occupy exactly `[Header::LENGTH, next_write_offset)`.
//! Removal moves the last live slot into the hole, so the region stays dense
//! at the cost of insertion order.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::{debug, info, trace, warn};

use crate::buffer::{BufferOps, HeapBufferOps};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::persistence::{Decoder, EncodeError, Encoder, IdAccessor};

use super::header::Header;

/// Size of the id prefix at the start of every slot
const ID_LENGTH: usize = 8;

/// Offset of the header within the arena
const HEADER_OFFSET: usize = 0;

/// Offset of the first slot within the arena
const DATA_OFFSET: usize = Header::LENGTH;

/// Largest slot region the 32-bit header fields can describe
const MAX_STORE_LENGTH: u64 = u32::MAX as u64 - Header::LENGTH as u64;

/// Dense, growable record arena
///
/// ## Concurrency
/// None. Every mutating call takes `&mut self`; share across threads only
/// behind a caller-owned lock, or keep one store per thread.
pub struct RecordStore<O: BufferOps = HeapBufferOps> {
    /// Adapter for the arena's buffer type
    ops: O,

    /// Header followed by the slot region
    buffer: O::Buffer,

    /// Metadata mirrored into the first bytes of `buffer`
    header: Header,

    /// Live id → absolute slot offset
    index: HashMap<i64, usize>,

    /// Slot region capacity in bytes
    capacity: usize,

    /// Id prefix + max record length
    slot_length: usize,

    /// One past the last live slot (absolute)
    next_write_offset: usize,

    /// Live record count
    size: usize,
}

impl RecordStore<HeapBufferOps> {
    /// Create a heap-backed store from a config
    pub fn with_config(config: &StoreConfig) -> Result<Self> {
        Self::new(HeapBufferOps, config)
    }

    /// Load a heap-backed store snapshot from `path`
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(HeapBufferOps, path)
    }
}

impl<O: BufferOps> RecordStore<O> {
    /// Create an empty store sized for `config.initial_records` records
    pub fn new(ops: O, config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let slot_length = config
            .max_record_length
            .checked_add(ID_LENGTH)
            .ok_or_else(|| capacity_error(u64::MAX))?;
        let capacity = slot_length
            .checked_mul(config.initial_records)
            .ok_or_else(|| capacity_error(u64::MAX))?;
        if capacity as u64 > MAX_STORE_LENGTH {
            return Err(capacity_error(capacity as u64));
        }

        let header = Header::new(config.max_record_length as u32, capacity as u32);
        let mut buffer = ops.allocate(capacity + DATA_OFFSET);
        header.write_to(&ops, &mut buffer, HEADER_OFFSET);

        Ok(Self {
            ops,
            buffer,
            header,
            index: HashMap::with_capacity(config.initial_records),
            capacity,
            slot_length,
            next_write_offset: DATA_OFFSET,
            size: 0,
        })
    }

    // =========================================================================
    // Record Operations
    // =========================================================================

    /// Decode the record for `id` into `container`
    ///
    /// Returns `Ok(false)` when `id` is not live; the container is untouched.
    pub fn load<T, D>(&self, id: i64, decoder: &D, container: &mut T) -> Result<bool>
    where
        T: ?Sized,
        D: Decoder<T> + ?Sized,
    {
        let record_offset = match self.index.get(&id) {
            Some(&offset) => offset,
            None => return Ok(false),
        };
        debug_assert_eq!(self.ops.read_long(&self.buffer, record_offset), id);

        let payload_offset = record_offset + ID_LENGTH;
        decoder
            .decode(self.payload(payload_offset), container)
            .map_err(|source| StoreError::Decode {
                id,
                offset: payload_offset,
                source,
            })?;
        Ok(true)
    }

    /// Insert or overwrite the record for `id_accessor.id_of(value)`
    ///
    /// An existing id is updated in place. A new id is appended, doubling
    /// the arena first if it is full. If the encoder rejects the value the
    /// store is left exactly as it was.
    pub fn store<T, E, A>(&mut self, encoder: &E, value: &T, id_accessor: &A) -> Result<()>
    where
        T: ?Sized,
        E: Encoder<T> + ?Sized,
        A: IdAccessor<T> + ?Sized,
    {
        let id = id_accessor.id_of(value);

        if let Some(&record_offset) = self.index.get(&id) {
            let payload_offset = record_offset + ID_LENGTH;
            let max = self.header.max_record_length as usize;
            let payload = &mut self.buffer.as_mut()[payload_offset..payload_offset + max];
            return encoder
                .encode(value, payload)
                .map_err(|e| encode_error(id, payload_offset, e));
        }

        let record_offset = self.next_write_offset;
        let payload_offset = record_offset + ID_LENGTH;
        let max = self.header.max_record_length as usize;

        if self.is_full() {
            // Encode into the grown arena and only adopt it on success.
            let (mut grown, grown_capacity) = self.grow_buffer()?;
            encoder
                .encode(value, &mut grown.as_mut()[payload_offset..payload_offset + max])
                .map_err(|e| encode_error(id, payload_offset, e))?;

            debug!(
                old_capacity = self.capacity,
                new_capacity = grown_capacity,
                records = self.size,
                "grew record arena"
            );
            self.buffer = grown;
            self.capacity = grown_capacity;
            self.header.store_length = grown_capacity as u32;
            self.header.write_to(&self.ops, &mut self.buffer, HEADER_OFFSET);
        } else {
            encoder
                .encode(value, &mut self.buffer.as_mut()[payload_offset..payload_offset + max])
                .map_err(|e| encode_error(id, payload_offset, e))?;
        }

        self.ops.write_long(&mut self.buffer, record_offset, id);
        self.index.insert(id, record_offset);
        self.next_write_offset += self.slot_length;
        self.size += 1;
        Ok(())
    }

    /// Remove the record for `id`, keeping the live region dense
    ///
    /// Returns `false` if `id` was not live.
    pub fn remove(&mut self, id: i64) -> bool {
        let Some(hole) = self.index.remove(&id) else {
            return false;
        };

        let last = self.next_write_offset - self.slot_length;
        if hole != last {
            let moved_id = self.ops.read_long(&self.buffer, last);
            self.ops
                .copy_within(&mut self.buffer, last, hole, self.slot_length);
            self.index.insert(moved_id, hole);
            trace!(removed = id, moved = moved_id, from = last, to = hole, "moved last slot into hole");
        }

        self.next_write_offset = last;
        self.size -= 1;
        true
    }

    /// Discard slack in the id index left behind by removals
    pub fn compact(&mut self) {
        self.index.shrink_to_fit();
    }

    /// Forget every record; capacity is kept
    pub fn clear(&mut self) {
        self.next_write_offset = DATA_OFFSET;
        self.index.clear();
        self.size = 0;
    }

    /// Live record count
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Live bytes as a fraction of slot-region capacity
    pub fn utilisation(&self) -> f32 {
        (self.next_write_offset - DATA_OFFSET) as f32 / self.capacity as f32
    }

    pub fn contains(&self, id: i64) -> bool {
        self.index.contains_key(&id)
    }

    /// Live ids, in no particular order
    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.index.keys().copied()
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Write the header and the full slot region to `output`
    pub fn write_to<W: Write>(&mut self, output: &mut W) -> Result<()> {
        self.header.next_write_offset = self.next_write_offset as u32;
        self.header.write_to(&self.ops, &mut self.buffer, HEADER_OFFSET);

        self.ops
            .write_to(&self.buffer, output, self.capacity + DATA_OFFSET)?;
        output.flush()?;

        info!(records = self.size, bytes = self.capacity + DATA_OFFSET, "wrote store snapshot");
        Ok(())
    }

    /// Write a snapshot to `path`, replacing any existing file, and fsync it
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;

        let file = writer.into_inner().map_err(|e| StoreError::Io(e.into_error()))?;
        file.sync_all()?;
        Ok(())
    }

    /// Rebuild a store from a snapshot produced by [`write_to`](Self::write_to)
    ///
    /// The id index is not persisted; it is recovered by reading the id
    /// prefix of every live slot.
    pub fn load_from<R: Read>(ops: O, input: &mut R) -> Result<Self> {
        let mut header_buffer = ops.allocate(Header::LENGTH);
        ops.read_from(input, &mut header_buffer, HEADER_OFFSET, Header::LENGTH)?;
        let header = Header::read_from(&ops, &header_buffer, HEADER_OFFSET);
        if let Err(e) = header.check_version() {
            warn!(error = %e, "rejected store snapshot");
            return Err(e);
        }
        validate_geometry(&header)?;

        let capacity = header.store_length as usize;
        let mut buffer = ops.allocate(capacity + DATA_OFFSET);
        header.write_to(&ops, &mut buffer, HEADER_OFFSET);
        ops.read_from(input, &mut buffer, DATA_OFFSET, capacity)?;

        let slot_length = header.slot_length();
        let next_write_offset = header.next_write_offset as usize;
        let live_slots = header.live_slots();
        let mut index = HashMap::with_capacity(live_slots);
        for slot in 0..live_slots {
            let offset = DATA_OFFSET + slot * slot_length;
            index.insert(ops.read_long(&buffer, offset), offset);
        }
        if index.len() != live_slots {
            return Err(StoreError::Corrupt(format!(
                "{} live slots but only {} distinct ids",
                live_slots,
                index.len()
            )));
        }

        info!(records = live_slots, capacity, "loaded store snapshot");
        Ok(Self {
            ops,
            buffer,
            header,
            size: index.len(),
            index,
            capacity,
            slot_length,
            next_write_offset,
        })
    }

    /// Load a snapshot file written by [`save`](Self::save)
    pub fn open_with(ops: O, path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::load_from(ops, &mut reader)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Slot region capacity in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes per slot, id prefix included
    pub fn slot_length(&self) -> usize {
        self.slot_length
    }

    pub fn max_record_length(&self) -> usize {
        self.header.max_record_length as usize
    }

    /// Absolute offset one past the last live slot
    pub fn next_write_offset(&self) -> usize {
        self.next_write_offset
    }

    /// Header as it will be written by the next snapshot
    pub fn header(&self) -> Header {
        Header {
            next_write_offset: self.next_write_offset as u32,
            ..self.header
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn is_full(&self) -> bool {
        self.next_write_offset == self.capacity + DATA_OFFSET
    }

    fn payload(&self, payload_offset: usize) -> &[u8] {
        let max = self.header.max_record_length as usize;
        &self.buffer.as_ref()[payload_offset..payload_offset + max]
    }

    /// Allocate a buffer twice the current capacity holding a copy of the
    /// current arena
    fn grow_buffer(&self) -> Result<(O::Buffer, usize)> {
        let grown_capacity = self
            .capacity
            .checked_mul(2)
            .filter(|&c| c as u64 <= MAX_STORE_LENGTH)
            .ok_or_else(|| capacity_error(self.capacity as u64 * 2))?;

        let mut grown = self.ops.allocate(grown_capacity + DATA_OFFSET);
        self.ops.copy_bytes(
            &self.buffer,
            &mut grown,
            DATA_OFFSET,
            DATA_OFFSET,
            self.capacity,
        );
        Ok((grown, grown_capacity))
    }
}

impl<O: BufferOps> std::fmt::Debug for RecordStore<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("size", &self.size)
            .field("capacity", &self.capacity)
            .field("slot_length", &self.slot_length)
            .field("next_write_offset", &self.next_write_offset)
            .finish()
    }
}

fn capacity_error(requested: u64) -> StoreError {
    StoreError::CapacityExceeded {
        requested,
        max: MAX_STORE_LENGTH,
    }
}

fn encode_error(id: i64, offset: usize, error: EncodeError) -> StoreError {
    match error {
        EncodeError::LengthExceeded { length, max } => StoreError::EncodedLengthExceeded {
            id,
            offset,
            length,
            max,
        },
        source => StoreError::Encode { id, offset, source },
    }
}

/// Reject headers whose slot geometry cannot describe a dense arena
fn validate_geometry(header: &Header) -> Result<()> {
    let slot_length = header.slot_length();
    let store_length = header.store_length as usize;
    let next_write_offset = header.next_write_offset as usize;

    if header.max_record_length == 0 || store_length == 0 || store_length % slot_length != 0 {
        return Err(StoreError::Corrupt(format!(
            "store length {} is not a multiple of slot length {}",
            store_length, slot_length
        )));
    }
    if next_write_offset < DATA_OFFSET
        || next_write_offset > store_length + DATA_OFFSET
        || (next_write_offset - DATA_OFFSET) % slot_length != 0
    {
        return Err(StoreError::Corrupt(format!(
            "next write offset {} outside slot region of {} bytes",
            next_write_offset, store_length
        )));
    }
    Ok(())
}
