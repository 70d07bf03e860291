//! Heap buffer operations
//!
//! `Vec<u8>`-backed buffers laid out big-endian.

use super::{read_array, BufferOps, ByteOrder};

/// Operations over a plain heap `Vec<u8>`, values in big-endian order
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapBufferOps;

impl BufferOps for HeapBufferOps {
    type Buffer = Vec<u8>;

    fn allocate(&self, length: usize) -> Vec<u8> {
        vec![0u8; length]
    }

    fn byte_order(&self) -> ByteOrder {
        ByteOrder::BigEndian
    }

    fn write_long(&self, buffer: &mut Vec<u8>, offset: usize, value: i64) {
        buffer[offset..offset + 8].copy_from_slice(&value.to_be_bytes());
    }

    fn read_long(&self, buffer: &Vec<u8>, offset: usize) -> i64 {
        i64::from_be_bytes(read_array(buffer, offset))
    }

    fn write_int(&self, buffer: &mut Vec<u8>, offset: usize, value: u32) {
        buffer[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    fn read_int(&self, buffer: &Vec<u8>, offset: usize) -> u32 {
        u32::from_be_bytes(read_array(buffer, offset))
    }
}
