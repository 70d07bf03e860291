//! # arenastore
//!
//! Fixed-identity records in one contiguous memory arena:
//! - O(1) lookup by 64-bit id
//! - In-place update, doubling growth, dense removal
//! - Whole-arena snapshots to and from files
//! - Open-addressing sequence maps for secondary key → id lookups
//!
//! ## Architecture Overview
//!
//! ```text
//!   ┌──────────────────┐            ┌──────────────────────┐
//!   │   TypeBinding    │            │  ByteSequenceMap /   │
//!   │ (one value type) │            │  CharSequenceMap     │
//!   └────────┬─────────┘            │  key → id            │
//!            │                      └──────────┬───────────┘
//!            ▼                                 │ ids
//!   ┌──────────────────┐    Encoder/Decoder    │
//!   │   RecordStore    │◄──────────────────────┘
//!   │ id → slot offset │◄─── IdAccessor (caller supplied)
//!   └────────┬─────────┘
//!            │
//!      ┌─────┴──────┐
//!      ▼            ▼
//!   ┌────────┐  ┌────────────┐
//!   │ Header │  │ BufferOps  │
//!   └────────┘  │ Heap/Bytes │
//!               └────────────┘
//! ```
//!
//! Nothing here locks. Serialize writers externally or keep one instance
//! per thread.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod buffer;
pub mod persistence;
pub mod store;
pub mod map;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::{MapConfig, StoreConfig};
pub use buffer::{BufferOps, BytesBufferOps, HeapBufferOps};
pub use map::{ByteSequenceMap, CharSequenceMap, SequenceMap};
pub use persistence::{BincodeCodec, Decoder, Encoder, IdAccessor};
pub use store::{RecordStore, TypeBinding};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of arenastore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
