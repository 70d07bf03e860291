//! Type Binding
//!
//! A record store paired with one fixed encoder, decoder and id accessor, so
//! callers storing a single value type need not pass them on every call.

use std::io::Write;
use std::path::Path;

use crate::buffer::{BufferOps, HeapBufferOps};
use crate::error::Result;
use crate::persistence::{Decoder, Encoder, IdAccessor};

use super::RecordStore;

/// Single-type view over a [`RecordStore`]
pub struct TypeBinding<T, C, A, O: BufferOps = HeapBufferOps>
where
    T: ?Sized,
{
    store: RecordStore<O>,
    codec: C,
    id_accessor: A,
    _marker: std::marker::PhantomData<fn(&T)>,
}

impl<T, C, A, O> TypeBinding<T, C, A, O>
where
    T: ?Sized,
    C: Encoder<T> + Decoder<T>,
    A: IdAccessor<T>,
    O: BufferOps,
{
    /// Bind `store` to one codec and id accessor
    pub fn new(store: RecordStore<O>, codec: C, id_accessor: A) -> Self {
        Self {
            store,
            codec,
            id_accessor,
            _marker: std::marker::PhantomData,
        }
    }

    /// Decode the record for `id` into `container`
    pub fn load(&self, id: i64, container: &mut T) -> Result<bool> {
        self.store.load(id, &self.codec, container)
    }

    /// Insert or overwrite `value`
    pub fn store(&mut self, value: &T) -> Result<()> {
        self.store.store(&self.codec, value, &self.id_accessor)
    }

    pub fn remove(&mut self, id: i64) -> bool {
        self.store.remove(id)
    }

    pub fn compact(&mut self) {
        self.store.compact()
    }

    pub fn clear(&mut self) {
        self.store.clear()
    }

    pub fn size(&self) -> usize {
        self.store.size()
    }

    pub fn utilisation(&self) -> f32 {
        self.store.utilisation()
    }

    pub fn write_to<W: Write>(&mut self, output: &mut W) -> Result<()> {
        self.store.write_to(output)
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.store.save(path)
    }

    /// The underlying store
    pub fn inner(&self) -> &RecordStore<O> {
        &self.store
    }

    pub fn into_inner(self) -> RecordStore<O> {
        self.store
    }
}
