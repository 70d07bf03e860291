//! Error types for arenastore
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::persistence::{DecodeError, EncodeError};

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for arenastore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Capacity Errors
    // -------------------------------------------------------------------------
    #[error("Capacity exceeded: requested {requested} bytes, limit is {max}")]
    CapacityExceeded { requested: u64, max: u64 },

    #[error("Key too long: {length} elements (max {max})")]
    KeyTooLong { length: usize, max: usize },

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Failed to store value with id {id} at offset {offset}: encoded length {length} exceeds max record length {max}")]
    EncodedLengthExceeded {
        id: i64,
        offset: usize,
        length: usize,
        max: usize,
    },

    #[error("Failed to store value with id {id} at offset {offset}")]
    Encode {
        id: i64,
        offset: usize,
        #[source]
        source: EncodeError,
    },

    #[error("Failed to load value with id {id} at offset {offset}")]
    Decode {
        id: i64,
        offset: usize,
        #[source]
        source: DecodeError,
    },

    // -------------------------------------------------------------------------
    // Snapshot Errors
    // -------------------------------------------------------------------------
    #[error("Unsupported store version: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Corrupt store snapshot: {0}")]
    Corrupt(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
