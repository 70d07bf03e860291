//! Native-order buffer operations
//!
//! `BytesMut`-backed buffers laid out in the host's byte order, with bulk
//! copies done as a single memmove instead of word by word.

use bytes::BytesMut;

use super::{read_array, BufferOps, ByteOrder};

/// Operations over a `bytes::BytesMut`, values in host-native order
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesBufferOps;

impl BufferOps for BytesBufferOps {
    type Buffer = BytesMut;

    fn allocate(&self, length: usize) -> BytesMut {
        BytesMut::zeroed(length)
    }

    fn byte_order(&self) -> ByteOrder {
        ByteOrder::NATIVE
    }

    fn write_long(&self, buffer: &mut BytesMut, offset: usize, value: i64) {
        buffer[offset..offset + 8].copy_from_slice(&value.to_ne_bytes());
    }

    fn read_long(&self, buffer: &BytesMut, offset: usize) -> i64 {
        i64::from_ne_bytes(read_array(buffer, offset))
    }

    fn write_int(&self, buffer: &mut BytesMut, offset: usize, value: u32) {
        buffer[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
    }

    fn read_int(&self, buffer: &BytesMut, offset: usize) -> u32 {
        u32::from_ne_bytes(read_array(buffer, offset))
    }

    fn copy_bytes(
        &self,
        source: &BytesMut,
        target: &mut BytesMut,
        source_offset: usize,
        target_offset: usize,
        length: usize,
    ) {
        target[target_offset..target_offset + length]
            .copy_from_slice(&source[source_offset..source_offset + length]);
    }

    fn copy_within(
        &self,
        buffer: &mut BytesMut,
        source_offset: usize,
        target_offset: usize,
        length: usize,
    ) {
        buffer.copy_within(source_offset..source_offset + length, target_offset);
    }
}
