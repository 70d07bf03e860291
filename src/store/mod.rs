//! Store Module
//!
//! Primary record storage: fixed-identity records packed into one
//! contiguous arena.
//!
//! ## Responsibilities
//! - O(1) id lookup through an in-memory id → offset index
//! - In-place update of existing records
//! - Doubling growth when the arena is full
//! - Dense removal (last slot moves into the hole)
//! - Whole-arena snapshots to and from files
//!
//! ## Snapshot Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (16 bytes, little-endian)                        │
//! │   Version | StoreLength | MaxRecordLen | NextWriteOff   │
//! ├─────────────────────────────────────────────────────────┤
//! │ Slot Region (StoreLength bytes)                         │
//! │   [Id (8)][Payload (MaxRecordLen)]                      │
//! │   ... live slots up to NextWriteOff, then free space ...│
//! └─────────────────────────────────────────────────────────┘
//! ```
//! Ids and payloads are in the writing adapter's byte order; load a
//! snapshot with the same adapter type that wrote it.

mod binding;
mod header;
mod record_store;

pub use binding::TypeBinding;
pub use header::{Header, VERSION};
pub use record_store::RecordStore;
