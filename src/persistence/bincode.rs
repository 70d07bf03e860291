//! Bincode codec
//!
//! Encoder/decoder pair for any serde type, using bincode's fixed-int
//! layout. The serialized size is measured before anything is written, so a
//! value that does not fit never touches the slot.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{DecodeError, Decoder, EncodeError, Encoder};

/// Stores serde values in record slots with bincode
pub struct BincodeCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> BincodeCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for BincodeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BincodeCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Copy for BincodeCodec<T> {}

impl<T> std::fmt::Debug for BincodeCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BincodeCodec")
    }
}

impl<T: Serialize> Encoder<T> for BincodeCodec<T> {
    fn encode(&self, value: &T, payload: &mut [u8]) -> Result<(), EncodeError> {
        let length = bincode::serialized_size(value)
            .map_err(|e| EncodeError::Serialization(e.to_string()))? as usize;
        if length > payload.len() {
            return Err(EncodeError::LengthExceeded {
                length,
                max: payload.len(),
            });
        }

        let mut window = &mut payload[..length];
        bincode::serialize_into(&mut window, value)
            .map_err(|e| EncodeError::Serialization(e.to_string()))
    }
}

impl<T: DeserializeOwned> Decoder<T> for BincodeCodec<T> {
    fn decode(&self, payload: &[u8], container: &mut T) -> Result<(), DecodeError> {
        *container = bincode::deserialize(payload)
            .map_err(|e| DecodeError::Deserialization(e.to_string()))?;
        Ok(())
    }
}
