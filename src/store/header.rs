//! Store header
//!
//! Fixed 16-byte prefix of every record arena and snapshot file.
//!
//! ```text
//! ┌─────────────┬──────────────────┬───────────────────┬───────────────────┐
//! │ Version (4) │ StoreLength (4)  │ MaxRecordLen (4)  │ NextWriteOff (4)  │
//! └─────────────┴──────────────────┴───────────────────┴───────────────────┘
//! ```
//!
//! Fields are always laid out in [`DISK_BYTE_ORDER`], whichever adapter
//! writes them, so a snapshot header reads the same on any host.

use crate::buffer::{BufferOps, ByteOrder, DISK_BYTE_ORDER};
use crate::error::{Result, StoreError};

/// Current header format version
pub const VERSION: u32 = 1;

const VERSION_OFFSET: usize = 0;
const STORE_LENGTH_OFFSET: usize = 4;
const RECORD_LENGTH_OFFSET: usize = 8;
const NEXT_WRITE_OFFSET_OFFSET: usize = 12;

/// Arena metadata persisted ahead of the slot region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Format version
    pub version: u32,
    /// Capacity of the slot region in bytes (header excluded)
    pub store_length: u32,
    /// Max payload length of one record (id prefix excluded)
    pub max_record_length: u32,
    /// Absolute offset one past the last live slot
    pub next_write_offset: u32,
}

impl Header {
    /// Header size in bytes
    pub const LENGTH: usize = 16;

    /// Header for an empty arena
    pub fn new(max_record_length: u32, store_length: u32) -> Self {
        Self {
            version: VERSION,
            store_length,
            max_record_length,
            next_write_offset: Self::LENGTH as u32,
        }
    }

    /// Write into `buffer` at `offset` through `ops`
    pub fn write_to<O: BufferOps>(&self, ops: &O, buffer: &mut O::Buffer, offset: usize) {
        let order = ops.byte_order();
        let mut put = |delta: usize, value: u32| {
            ops.write_int(buffer, offset + delta, DISK_BYTE_ORDER.convert_u32(value, order));
        };
        put(VERSION_OFFSET, self.version);
        put(STORE_LENGTH_OFFSET, self.store_length);
        put(RECORD_LENGTH_OFFSET, self.max_record_length);
        put(NEXT_WRITE_OFFSET_OFFSET, self.next_write_offset);
    }

    /// Read from `buffer` at `offset` through `ops`
    pub fn read_from<O: BufferOps>(ops: &O, buffer: &O::Buffer, offset: usize) -> Self {
        let order = ops.byte_order();
        let get = |delta: usize| order.convert_u32(ops.read_int(buffer, offset + delta), DISK_BYTE_ORDER);
        Self {
            version: get(VERSION_OFFSET),
            store_length: get(STORE_LENGTH_OFFSET),
            max_record_length: get(RECORD_LENGTH_OFFSET),
            next_write_offset: get(NEXT_WRITE_OFFSET_OFFSET),
        }
    }

    /// Serialize to the on-disk representation
    pub fn to_bytes(&self) -> [u8; Self::LENGTH] {
        let mut bytes = [0u8; Self::LENGTH];
        let fields = [
            self.version,
            self.store_length,
            self.max_record_length,
            self.next_write_offset,
        ];
        for (chunk, value) in bytes.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&encode_disk(value));
        }
        bytes
    }

    /// Parse the on-disk representation
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::LENGTH {
            return Err(StoreError::Corrupt(format!(
                "header needs {} bytes, got {}",
                Self::LENGTH,
                bytes.len()
            )));
        }
        let field = |offset: usize| decode_disk(crate::buffer::read_array(bytes, offset));
        Ok(Self {
            version: field(VERSION_OFFSET),
            store_length: field(STORE_LENGTH_OFFSET),
            max_record_length: field(RECORD_LENGTH_OFFSET),
            next_write_offset: field(NEXT_WRITE_OFFSET_OFFSET),
        })
    }

    /// Fail with `VersionMismatch` unless this header is the current version
    pub fn check_version(&self) -> Result<()> {
        if self.version != VERSION {
            return Err(StoreError::VersionMismatch {
                expected: VERSION,
                found: self.version,
            });
        }
        Ok(())
    }

    /// Length of one slot: id prefix plus payload
    pub fn slot_length(&self) -> usize {
        self.max_record_length as usize + 8
    }

    /// Number of live slots this header describes
    pub fn live_slots(&self) -> usize {
        (self.next_write_offset as usize).saturating_sub(Self::LENGTH) / self.slot_length()
    }
}

fn encode_disk(value: u32) -> [u8; 4] {
    match DISK_BYTE_ORDER {
        ByteOrder::LittleEndian => value.to_le_bytes(),
        ByteOrder::BigEndian => value.to_be_bytes(),
    }
}

fn decode_disk(bytes: [u8; 4]) -> u32 {
    match DISK_BYTE_ORDER {
        ByteOrder::LittleEndian => u32::from_le_bytes(bytes),
        ByteOrder::BigEndian => u32::from_be_bytes(bytes),
    }
}
