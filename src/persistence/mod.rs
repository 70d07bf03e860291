//! Persistence Module
//!
//! Contracts a caller supplies per value type so a record store can move
//! values in and out of its slots.
//!
//! ## Responsibilities
//! - `Encoder`: serialize a value into a slot payload, refusing values that
//!   do not fit
//! - `Decoder`: populate a caller-owned, reusable container from a payload
//! - `IdAccessor`: extract the 64-bit identity used as the index key
//!
//! The store hands each collaborator exactly the payload window of one slot
//! (`max_record_length` bytes), so an encoder detects overflow by comparing
//! its output length with the window length before writing anything.

pub mod bincode;

use thiserror::Error;

pub use self::bincode::BincodeCodec;

/// Failure reported by an [`Encoder`]
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Serialized form does not fit in the slot payload
    #[error("encoded length {length} exceeds max record length {max}")]
    LengthExceeded { length: usize, max: usize },

    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Failure reported by a [`Decoder`]
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

/// Serializes values of type `T` into a slot payload
pub trait Encoder<T: ?Sized> {
    /// Write `value` into `payload`, whose length is the store's max record
    /// length. Must return [`EncodeError::LengthExceeded`] without writing
    /// when the value does not fit.
    fn encode(&self, value: &T, payload: &mut [u8]) -> Result<(), EncodeError>;
}

/// Deserializes a slot payload into a reusable container of type `T`
pub trait Decoder<T: ?Sized> {
    fn decode(&self, payload: &[u8], container: &mut T) -> Result<(), DecodeError>;
}

/// Extracts the identity of a value
pub trait IdAccessor<T: ?Sized> {
    fn id_of(&self, value: &T) -> i64;
}

impl<T: ?Sized, F> IdAccessor<T> for F
where
    F: Fn(&T) -> i64,
{
    fn id_of(&self, value: &T) -> i64 {
        self(value)
    }
}
