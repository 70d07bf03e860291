//! Key hashers
//!
//! Hash quality only affects probe lengths: the table stays correct under
//! any hasher, including one that maps every key to the same value.

use super::key::KeyElement;

/// Hashes a run of key elements to 32 bits
pub trait KeyHasher {
    fn hash<E, I>(&self, elements: I) -> u32
    where
        E: KeyElement,
        I: Iterator<Item = E>;
}

/// `h = 31 * h + element`, wrapping
#[derive(Debug, Clone, Copy, Default)]
pub struct Polynomial31Hasher;

impl KeyHasher for Polynomial31Hasher {
    fn hash<E, I>(&self, elements: I) -> u32
    where
        E: KeyElement,
        I: Iterator<Item = E>,
    {
        elements.fold(0u32, |hash, element| {
            hash.wrapping_mul(31).wrapping_add(element.to_u32())
        })
    }
}

/// CRC32 over the little-endian element bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32Hasher;

impl KeyHasher for Crc32Hasher {
    fn hash<E, I>(&self, elements: I) -> u32
    where
        E: KeyElement,
        I: Iterator<Item = E>,
    {
        let mut hasher = crc32fast::Hasher::new();
        for element in elements {
            hasher.update(&element.to_u32().to_le_bytes()[..E::WIDTH]);
        }
        hasher.finalize()
    }
}
