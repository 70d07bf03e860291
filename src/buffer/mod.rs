//! Buffer Module
//!
//! Primitive reads, writes and bulk copies over a caller-owned flat buffer.
//!
//! ## Responsibilities
//! - 8/4/1-byte reads and writes at a byte offset
//! - Bulk copy between buffers and within one buffer
//! - Report the byte order values are laid out in
//! - Move whole buffers to and from files
//!
//! Adapters never own the buffer they operate on; the store or map that
//! allocated it does. Offsets are trusted: an out-of-range offset is a bug in
//! the caller and panics like slice indexing.
//!
//! ## Adapters
//! ```text
//! ┌──────────────────┬──────────────┬─────────────────────────────┐
//! │ Adapter          │ Buffer       │ Byte order                  │
//! ├──────────────────┼──────────────┼─────────────────────────────┤
//! │ HeapBufferOps    │ Vec<u8>      │ big-endian                  │
//! │ BytesBufferOps   │ BytesMut     │ host-native                 │
//! └──────────────────┴──────────────┴─────────────────────────────┘
//! ```

mod heap;
mod native;

use std::io::{self, Read, Write};

pub use heap::HeapBufferOps;
pub use native::BytesBufferOps;

/// Byte order used to lay out multi-byte values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    /// Order of the host this process runs on
    #[cfg(target_endian = "little")]
    pub const NATIVE: ByteOrder = ByteOrder::LittleEndian;

    /// Order of the host this process runs on
    #[cfg(target_endian = "big")]
    pub const NATIVE: ByteOrder = ByteOrder::BigEndian;

    /// Convert a value laid out in `self` order into `target` order.
    pub fn convert_u32(self, value: u32, target: ByteOrder) -> u32 {
        if self == target {
            value
        } else {
            value.swap_bytes()
        }
    }
}

/// Order in which snapshot header fields are written to disk, whatever the
/// adapter's in-memory order.
pub const DISK_BYTE_ORDER: ByteOrder = ByteOrder::LittleEndian;

/// Operations on one physical buffer representation
pub trait BufferOps {
    /// The concrete buffer these operations act on
    type Buffer: AsRef<[u8]> + AsMut<[u8]>;

    /// Allocate a zero-filled buffer of `length` bytes
    fn allocate(&self, length: usize) -> Self::Buffer;

    /// Order multi-byte values are written in
    fn byte_order(&self) -> ByteOrder;

    fn write_long(&self, buffer: &mut Self::Buffer, offset: usize, value: i64);

    fn read_long(&self, buffer: &Self::Buffer, offset: usize) -> i64;

    fn write_int(&self, buffer: &mut Self::Buffer, offset: usize, value: u32);

    fn read_int(&self, buffer: &Self::Buffer, offset: usize) -> u32;

    fn write_byte(&self, buffer: &mut Self::Buffer, offset: usize, value: u8) {
        buffer.as_mut()[offset] = value;
    }

    fn read_byte(&self, buffer: &Self::Buffer, offset: usize) -> u8 {
        buffer.as_ref()[offset]
    }

    /// Copy `length` bytes from `source` to `target`.
    ///
    /// Copies 8-byte words first, then the trailing bytes one at a time.
    fn copy_bytes(
        &self,
        source: &Self::Buffer,
        target: &mut Self::Buffer,
        source_offset: usize,
        target_offset: usize,
        length: usize,
    ) {
        let words = length / 8;
        for word in 0..words {
            let delta = word * 8;
            let value = self.read_long(source, source_offset + delta);
            self.write_long(target, target_offset + delta, value);
        }
        for delta in words * 8..length {
            let value = self.read_byte(source, source_offset + delta);
            self.write_byte(target, target_offset + delta, value);
        }
    }

    /// Copy `length` bytes between two non-overlapping regions of one buffer.
    fn copy_within(
        &self,
        buffer: &mut Self::Buffer,
        source_offset: usize,
        target_offset: usize,
        length: usize,
    ) {
        let words = length / 8;
        for word in 0..words {
            let delta = word * 8;
            let value = self.read_long(buffer, source_offset + delta);
            self.write_long(buffer, target_offset + delta, value);
        }
        for delta in words * 8..length {
            let value = self.read_byte(buffer, source_offset + delta);
            self.write_byte(buffer, target_offset + delta, value);
        }
    }

    /// Fill `length` bytes of `buffer` at `offset` from `input`
    fn read_from<R: Read>(
        &self,
        input: &mut R,
        buffer: &mut Self::Buffer,
        offset: usize,
        length: usize,
    ) -> io::Result<()> {
        input.read_exact(&mut buffer.as_mut()[offset..offset + length])
    }

    /// Write the first `length` bytes of `buffer` to `output`
    fn write_to<W: Write>(
        &self,
        buffer: &Self::Buffer,
        output: &mut W,
        length: usize,
    ) -> io::Result<()> {
        output.write_all(&buffer.as_ref()[..length])
    }
}

/// Fixed-width window of a byte slice
pub(crate) fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}
