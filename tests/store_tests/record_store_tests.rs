//! Tests for RecordStore
//!
//! These tests verify:
//! - Store, load, update-in-place and remove
//! - Growth when the arena is full
//! - Dense layout after removals
//! - Rejected encodes leave the store unchanged
//! - Snapshot round trips through writers, readers and files

use std::collections::HashMap;
use std::io::Cursor;

use arenastore::store::{Header, RecordStore};
use arenastore::{BincodeCodec, BytesBufferOps, HeapBufferOps, StoreConfig, StoreError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

const INITIAL_RECORDS: usize = 16;
const MAX_RECORD_LENGTH: usize = 64;
const SLOT_LENGTH: usize = MAX_RECORD_LENGTH + 8;

// =============================================================================
// Helper Functions
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Order {
    id: i64,
    quantity: i64,
    price: i64,
    symbol: String,
}

impl Order {
    fn of(id: i64) -> Self {
        Self {
            id,
            quantity: id.wrapping_mul(3),
            price: id.wrapping_add(100),
            symbol: format!("SYM_{}", id.rem_euclid(1000)),
        }
    }
}

fn id_of(order: &Order) -> i64 {
    order.id
}

fn codec() -> BincodeCodec<Order> {
    BincodeCodec::new()
}

fn new_store() -> RecordStore {
    let config = StoreConfig::builder()
        .max_record_length(MAX_RECORD_LENGTH)
        .initial_records(INITIAL_RECORDS)
        .build();
    RecordStore::with_config(&config).unwrap()
}

fn load(store: &RecordStore, id: i64) -> Option<Order> {
    let mut container = Order::default();
    match store.load(id, &codec(), &mut container).unwrap() {
        true => Some(container),
        false => None,
    }
}

fn store_order(store: &mut RecordStore, order: &Order) {
    store.store(&codec(), order, &id_of).unwrap();
}

fn assert_dense(store: &RecordStore) {
    assert_eq!(
        store.next_write_offset(),
        store.size() * store.slot_length() + Header::LENGTH
    );
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_store_is_empty() {
    let store = new_store();

    assert_eq!(store.size(), 0);
    assert!(store.is_empty());
    assert_eq!(store.utilisation(), 0.0);
    assert_eq!(store.capacity(), INITIAL_RECORDS * SLOT_LENGTH);
    assert_eq!(store.slot_length(), SLOT_LENGTH);
    assert_eq!(store.next_write_offset(), Header::LENGTH);
}

#[test]
fn test_store_and_load() {
    let mut store = new_store();
    let order = Order::of(17);

    store_order(&mut store, &order);

    assert_eq!(load(&store, 17), Some(order));
    assert_eq!(store.size(), 1);
    assert!(store.contains(17));
}

#[test]
fn test_load_unknown_id_leaves_container_untouched() {
    let store = new_store();
    let mut container = Order::of(5);

    let found = store.load(17, &codec(), &mut container).unwrap();

    assert!(!found);
    assert_eq!(container, Order::of(5));
}

#[test]
fn test_remove() {
    let mut store = new_store();
    store_order(&mut store, &Order::of(17));

    assert!(store.remove(17));
    assert_eq!(load(&store, 17), None);
    assert_eq!(store.size(), 0);
}

#[test]
fn test_remove_unknown_id() {
    let mut store = new_store();
    assert!(!store.remove(17));
}

#[test]
fn test_update_in_place() {
    let mut store = new_store();
    store_order(&mut store, &Order::of(17));
    let next_write_offset = store.next_write_offset();

    let updated = Order {
        id: 17,
        quantity: 37,
        price: 13,
        symbol: "Foo".to_string(),
    };
    store_order(&mut store, &updated);

    assert_eq!(store.next_write_offset(), next_write_offset);
    assert_eq!(store.size(), 1);
    assert_eq!(load(&store, 17), Some(updated));
}

#[test]
fn test_store_after_removal() {
    let mut store = new_store();
    let order = Order::of(17);
    store_order(&mut store, &order);

    store.remove(17);
    store_order(&mut store, &order);

    assert_eq!(load(&store, 17), Some(order));
}

#[test]
fn test_negative_ids() {
    let mut store = new_store();
    for id in [i64::MIN, -1, 0, i64::MAX] {
        store_order(&mut store, &Order::of(id));
    }

    for id in [i64::MIN, -1, 0, i64::MAX] {
        assert_eq!(load(&store, id), Some(Order::of(id)));
    }
}

#[test]
fn test_ids_lists_live_records() {
    let mut store = new_store();
    for id in 0..5 {
        store_order(&mut store, &Order::of(id));
    }
    store.remove(2);

    let mut ids: Vec<i64> = store.ids().collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1, 3, 4]);
}

// =============================================================================
// Growth Tests
// =============================================================================

#[test]
fn test_grow_if_initial_capacity_exceeded() {
    let mut store = new_store();
    for id in 0..INITIAL_RECORDS as i64 {
        store_order(&mut store, &Order::of(id));
    }

    assert!(store.utilisation() > 0.99);
    let capacity = store.capacity();

    store_order(&mut store, &Order::of(INITIAL_RECORDS as i64));

    assert!(store.utilisation() < 0.6);
    assert_eq!(store.capacity(), capacity * 2);
    assert_eq!(store.size(), INITIAL_RECORDS + 1);
    assert_eq!(store.header().store_length as usize, capacity * 2);
    for id in 0..=INITIAL_RECORDS as i64 {
        assert_eq!(load(&store, id), Some(Order::of(id)), "loading {}", id);
    }
}

#[test]
fn test_repeated_growth_keeps_payloads() {
    let mut store = new_store();
    let count = INITIAL_RECORDS as i64 * 9;
    for id in 0..count {
        store_order(&mut store, &Order::of(id));
    }

    assert_eq!(store.capacity(), INITIAL_RECORDS * 16 * SLOT_LENGTH);
    for id in 0..count {
        assert_eq!(load(&store, id), Some(Order::of(id)));
    }
}

#[test]
fn test_report_utilisation() {
    let mut store = new_store();
    store_order(&mut store, &Order::of(1));
    store_order(&mut store, &Order::of(2));

    assert!((store.utilisation() - 2.0 / INITIAL_RECORDS as f32).abs() < 0.01);

    for id in 3..9 {
        store_order(&mut store, &Order::of(id));
    }
    assert!((store.utilisation() - 0.5).abs() < 0.01);

    for id in 9..17 {
        store_order(&mut store, &Order::of(id));
    }
    assert!((store.utilisation() - 1.0).abs() < 0.01);
}

#[test]
fn test_capacity_beyond_header_range_rejected() {
    let config = StoreConfig::builder()
        .max_record_length(u32::MAX as usize)
        .initial_records(1)
        .build();

    let result = RecordStore::with_config(&config);
    assert!(matches!(result, Err(StoreError::CapacityExceeded { .. })));
}

// =============================================================================
// Removal / Density Tests
// =============================================================================

#[test]
fn test_compact_after_removal() {
    let mut store = new_store();
    for id in 0..INITIAL_RECORDS as i64 {
        store_order(&mut store, &Order::of(id));
    }

    let mut expected_size = store.size();
    for id in (0..INITIAL_RECORDS as i64).step_by(2) {
        assert!(store.remove(id));
        expected_size -= 1;
        assert_eq!(store.size(), expected_size);
        assert_dense(&store);
    }

    store.compact();

    for i in 0..(INITIAL_RECORDS / 2) as i64 {
        store_order(&mut store, &Order::of(i + INITIAL_RECORDS as i64));
    }

    for id in (1..INITIAL_RECORDS as i64).step_by(2) {
        assert_eq!(load(&store, id), Some(Order::of(id)), "did not find {}", id);
    }
    for i in 0..(INITIAL_RECORDS / 2) as i64 {
        let id = i + INITIAL_RECORDS as i64;
        assert_eq!(load(&store, id), Some(Order::of(id)));
    }
}

#[test]
fn test_ideal_compaction() {
    let mut store = new_store();
    for id in 0..4 {
        store_order(&mut store, &Order::of(id));
    }

    store.remove(0);
    store.remove(2);
    store.compact();

    assert_eq!(store.next_write_offset(), 2 * SLOT_LENGTH + Header::LENGTH);
    assert_eq!(load(&store, 1), Some(Order::of(1)));
    assert_eq!(load(&store, 3), Some(Order::of(3)));
}

#[test]
fn test_remove_last_slot_moves_nothing() {
    let mut store = new_store();
    for id in 0..3 {
        store_order(&mut store, &Order::of(id));
    }

    assert!(store.remove(2));

    assert_dense(&store);
    assert_eq!(load(&store, 0), Some(Order::of(0)));
    assert_eq!(load(&store, 1), Some(Order::of(1)));
}

#[test]
fn test_clear() {
    let mut store = new_store();
    for id in 0..20 {
        store_order(&mut store, &Order::of(id));
    }
    let capacity = store.capacity();

    store.clear();

    assert_eq!(store.size(), 0);
    assert_eq!(store.capacity(), capacity);
    assert_dense(&store);
    for id in 0..20 {
        assert_eq!(load(&store, id), None);
    }
}

#[test]
fn test_matches_reference_model() {
    let mut store = new_store();
    let mut model: HashMap<i64, Order> = HashMap::new();
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for step in 0..5_000i64 {
        let id = rng.gen_range(0..300i64);
        if rng.gen_bool(0.6) {
            let order = Order {
                quantity: step,
                ..Order::of(id)
            };
            store_order(&mut store, &order);
            model.insert(id, order);
        } else {
            assert_eq!(store.remove(id), model.remove(&id).is_some());
        }

        assert_eq!(store.size(), model.len());
        assert_dense(&store);
        if step % 500 == 0 {
            store.compact();
        }
    }

    for id in 0..300 {
        assert_eq!(load(&store, id), model.get(&id).cloned(), "id {}", id);
    }
}

// =============================================================================
// Rejected Encode Tests
// =============================================================================

#[test]
fn test_oversized_new_record_rejected() {
    let mut store = new_store();
    store_order(&mut store, &Order::of(1));
    let next_write_offset = store.next_write_offset();

    let oversized = Order {
        symbol: "X".repeat(100),
        ..Order::of(99)
    };
    let result = store.store(&codec(), &oversized, &id_of);

    match result {
        Err(StoreError::EncodedLengthExceeded { id, offset, length, max }) => {
            assert_eq!(id, 99);
            assert_eq!(offset, next_write_offset + 8);
            assert!(length > MAX_RECORD_LENGTH);
            assert_eq!(max, MAX_RECORD_LENGTH);
        }
        other => panic!("expected EncodedLengthExceeded, got {:?}", other),
    }

    assert_eq!(store.size(), 1);
    assert_eq!(store.next_write_offset(), next_write_offset);
    assert!(!store.contains(99));
}

#[test]
fn test_oversized_update_keeps_previous_value() {
    let mut store = new_store();
    store_order(&mut store, &Order::of(7));

    let oversized = Order {
        symbol: "X".repeat(100),
        ..Order::of(7)
    };
    let result = store.store(&codec(), &oversized, &id_of);

    assert!(matches!(
        result,
        Err(StoreError::EncodedLengthExceeded { id: 7, offset, .. }) if offset == Header::LENGTH + 8
    ));
    assert_eq!(load(&store, 7), Some(Order::of(7)));
}

#[test]
fn test_oversized_record_on_full_arena_does_not_grow() {
    let mut store = new_store();
    for id in 0..INITIAL_RECORDS as i64 {
        store_order(&mut store, &Order::of(id));
    }
    let capacity = store.capacity();

    let oversized = Order {
        symbol: "X".repeat(100),
        ..Order::of(1000)
    };
    assert!(store.store(&codec(), &oversized, &id_of).is_err());

    assert_eq!(store.capacity(), capacity);
    assert_eq!(store.size(), INITIAL_RECORDS);
    assert_eq!(store.header().store_length as usize, capacity);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_write_to_and_load_from() {
    let mut store = new_store();
    let mut rng = StdRng::seed_from_u64(42);
    let mut ids = Vec::new();
    for _ in 0..INITIAL_RECORDS * 4 {
        let id = rng.gen::<i64>();
        ids.push(id);
        store_order(&mut store, &Order::of(id));
    }

    let mut snapshot = Vec::new();
    store.write_to(&mut snapshot).unwrap();
    assert_eq!(snapshot.len(), Header::LENGTH + store.capacity());

    let loaded = RecordStore::load_from(HeapBufferOps, &mut Cursor::new(snapshot)).unwrap();

    assert_eq!(loaded.size(), store.size());
    assert_eq!(loaded.capacity(), store.capacity());
    assert_eq!(loaded.next_write_offset(), store.next_write_offset());
    for id in ids {
        assert_eq!(load(&loaded, id), Some(Order::of(id)));
    }
}

#[test]
fn test_round_trip_after_removals() {
    let mut store = new_store();
    for id in 0..40 {
        store_order(&mut store, &Order::of(id));
    }
    for id in (0..40).step_by(3) {
        store.remove(id);
    }

    let mut snapshot = Vec::new();
    store.write_to(&mut snapshot).unwrap();
    let loaded = RecordStore::load_from(HeapBufferOps, &mut Cursor::new(snapshot)).unwrap();

    assert_dense(&loaded);
    for id in 0..40 {
        assert_eq!(load(&loaded, id), load(&store, id), "id {}", id);
    }
}

#[test]
fn test_loaded_store_accepts_new_records() {
    let mut store = new_store();
    for id in 0..INITIAL_RECORDS as i64 {
        store_order(&mut store, &Order::of(id));
    }
    let mut snapshot = Vec::new();
    store.write_to(&mut snapshot).unwrap();

    let mut loaded = RecordStore::load_from(HeapBufferOps, &mut Cursor::new(snapshot)).unwrap();
    store_order(&mut loaded, &Order::of(500));
    assert!(loaded.remove(3));

    assert_eq!(loaded.size(), INITIAL_RECORDS);
    assert_eq!(load(&loaded, 500), Some(Order::of(500)));
    assert_dense(&loaded);
}

#[test]
fn test_save_and_open() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("orders.store");

    let mut store = new_store();
    for id in 0..25 {
        store_order(&mut store, &Order::of(id));
    }
    store.save(&path).unwrap();

    let loaded = RecordStore::open(&path).unwrap();

    assert_eq!(loaded.size(), 25);
    for id in 0..25 {
        assert_eq!(load(&loaded, id), Some(Order::of(id)));
    }
}

#[test]
fn test_save_overwrites_existing_snapshot() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("orders.store");

    let mut store = new_store();
    for id in 0..40 {
        store_order(&mut store, &Order::of(id));
    }
    store.save(&path).unwrap();

    store.clear();
    store_order(&mut store, &Order::of(1));
    store.save(&path).unwrap();

    let loaded = RecordStore::open(&path).unwrap();
    assert_eq!(loaded.size(), 1);
    assert_eq!(load(&loaded, 2), None);
}

#[test]
fn test_native_adapter_round_trip() {
    let config = StoreConfig::builder()
        .max_record_length(MAX_RECORD_LENGTH)
        .initial_records(4)
        .build();
    let mut store = RecordStore::new(BytesBufferOps, &config).unwrap();
    for id in 0..10 {
        store.store(&codec(), &Order::of(id), &id_of).unwrap();
    }
    store.remove(4);

    let mut snapshot = Vec::new();
    store.write_to(&mut snapshot).unwrap();
    let loaded = RecordStore::load_from(BytesBufferOps, &mut Cursor::new(snapshot)).unwrap();

    assert_eq!(loaded.size(), 9);
    let mut container = Order::default();
    for id in (0..10).filter(|&id| id != 4) {
        assert!(loaded.load(id, &codec(), &mut container).unwrap());
        assert_eq!(container, Order::of(id));
    }
}

#[test]
fn test_load_from_rejects_other_version() {
    let mut store = new_store();
    store_order(&mut store, &Order::of(1));
    let mut snapshot = Vec::new();
    store.write_to(&mut snapshot).unwrap();

    snapshot[0..4].copy_from_slice(&2u32.to_le_bytes());

    let result = RecordStore::load_from(HeapBufferOps, &mut Cursor::new(snapshot));
    assert!(matches!(
        result,
        Err(StoreError::VersionMismatch { expected: 1, found: 2 })
    ));
}

#[test]
fn test_load_from_rejects_bad_next_write_offset() {
    let mut store = new_store();
    store_order(&mut store, &Order::of(1));
    let mut snapshot = Vec::new();
    store.write_to(&mut snapshot).unwrap();

    snapshot[12..16].copy_from_slice(&(Header::LENGTH as u32 + 5).to_le_bytes());

    let result = RecordStore::load_from(HeapBufferOps, &mut Cursor::new(snapshot));
    assert!(matches!(result, Err(StoreError::Corrupt(_))));
}

#[test]
fn test_load_from_truncated_snapshot() {
    let mut store = new_store();
    store_order(&mut store, &Order::of(1));
    let mut snapshot = Vec::new();
    store.write_to(&mut snapshot).unwrap();

    snapshot.truncate(snapshot.len() / 2);

    let result = RecordStore::load_from(HeapBufferOps, &mut Cursor::new(snapshot));
    assert!(matches!(result, Err(StoreError::Io(_))));
}

#[test]
fn test_load_from_truncated_header() {
    let result = RecordStore::load_from(HeapBufferOps, &mut Cursor::new(vec![1u8, 0, 0]));
    assert!(matches!(result, Err(StoreError::Io(_))));
}

#[test]
fn test_loaded_native_store_keeps_header() {
    let config = StoreConfig::builder()
        .max_record_length(MAX_RECORD_LENGTH)
        .initial_records(2)
        .build();
    let mut store = RecordStore::new(BytesBufferOps, &config).unwrap();
    for id in 0..3 {
        store.store(&codec(), &Order::of(id), &id_of).unwrap();
    }
    let mut snapshot = Vec::new();
    store.write_to(&mut snapshot).unwrap();

    let mut loaded = RecordStore::load_from(BytesBufferOps, &mut Cursor::new(snapshot.clone())).unwrap();
    assert_eq!(loaded.header(), store.header());

    let mut rewritten = Vec::new();
    loaded.write_to(&mut rewritten).unwrap();
    assert_eq!(rewritten, snapshot);
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_zero_record_length_rejected() {
    let config = StoreConfig::builder().max_record_length(0).build();
    assert!(matches!(
        RecordStore::with_config(&config),
        Err(StoreError::Config(_))
    ));
}

#[test]
fn test_zero_initial_records_rejected() {
    let config = StoreConfig::builder().initial_records(0).build();
    assert!(matches!(
        RecordStore::with_config(&config),
        Err(StoreError::Config(_))
    ));
}
