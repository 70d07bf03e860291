//! Key elements and key sources
//!
//! A table stores keys as runs of fixed-width elements: bytes for
//! [`ByteSequenceMap`](super::ByteSequenceMap), UTF-16 code units for
//! [`CharSequenceMap`](super::CharSequenceMap). Anything that can present
//! itself as such a run can be used as a key.

/// One element of a stored key
pub trait KeyElement: Copy + Eq + std::fmt::Debug {
    /// Bytes one element occupies in a slot
    const WIDTH: usize;

    /// Widen for hashing
    fn to_u32(self) -> u32;

    /// Write at `offset` (little-endian)
    fn write(self, bytes: &mut [u8], offset: usize);

    /// Read from `offset` (little-endian)
    fn read(bytes: &[u8], offset: usize) -> Self;
}

impl KeyElement for u8 {
    const WIDTH: usize = 1;

    fn to_u32(self) -> u32 {
        self as u32
    }

    fn write(self, bytes: &mut [u8], offset: usize) {
        bytes[offset] = self;
    }

    fn read(bytes: &[u8], offset: usize) -> Self {
        bytes[offset]
    }
}

impl KeyElement for u16 {
    const WIDTH: usize = 2;

    fn to_u32(self) -> u32 {
        self as u32
    }

    fn write(self, bytes: &mut [u8], offset: usize) {
        bytes[offset..offset + 2].copy_from_slice(&self.to_le_bytes());
    }

    fn read(bytes: &[u8], offset: usize) -> Self {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }
}

/// A value usable as a key made of `E` elements
pub trait SequenceKey<E: KeyElement> {
    /// Number of elements
    fn key_length(&self) -> usize;

    fn elements(&self) -> impl Iterator<Item = E> + '_;
}

impl SequenceKey<u8> for [u8] {
    fn key_length(&self) -> usize {
        self.len()
    }

    fn elements(&self) -> impl Iterator<Item = u8> + '_ {
        self.iter().copied()
    }
}

impl SequenceKey<u8> for Vec<u8> {
    fn key_length(&self) -> usize {
        self.len()
    }

    fn elements(&self) -> impl Iterator<Item = u8> + '_ {
        self.iter().copied()
    }
}

impl<const N: usize> SequenceKey<u8> for [u8; N] {
    fn key_length(&self) -> usize {
        N
    }

    fn elements(&self) -> impl Iterator<Item = u8> + '_ {
        self.iter().copied()
    }
}

/// UTF-8 bytes
impl SequenceKey<u8> for str {
    fn key_length(&self) -> usize {
        self.len()
    }

    fn elements(&self) -> impl Iterator<Item = u8> + '_ {
        self.bytes()
    }
}

impl SequenceKey<u16> for [u16] {
    fn key_length(&self) -> usize {
        self.len()
    }

    fn elements(&self) -> impl Iterator<Item = u16> + '_ {
        self.iter().copied()
    }
}

impl SequenceKey<u16> for Vec<u16> {
    fn key_length(&self) -> usize {
        self.len()
    }

    fn elements(&self) -> impl Iterator<Item = u16> + '_ {
        self.iter().copied()
    }
}

/// UTF-16 code units
impl SequenceKey<u16> for str {
    fn key_length(&self) -> usize {
        self.encode_utf16().count()
    }

    fn elements(&self) -> impl Iterator<Item = u16> + '_ {
        self.encode_utf16()
    }
}

impl SequenceKey<u8> for String {
    fn key_length(&self) -> usize {
        self.len()
    }

    fn elements(&self) -> impl Iterator<Item = u8> + '_ {
        self.bytes()
    }
}

impl SequenceKey<u16> for String {
    fn key_length(&self) -> usize {
        self.encode_utf16().count()
    }

    fn elements(&self) -> impl Iterator<Item = u16> + '_ {
        self.encode_utf16()
    }
}
