//! Entity model
//!
//! Typed facade binding one record type (and so one table) to the store.

use std::marker::PhantomData;

use crate::store::{self, Changes, Predicate, Record, RecordId, Store, StoreError, StoreResult};

use super::AttachStore;

/// Typed access to the table of `R`.
///
/// Created detached; every operation fails with [`StoreError::NoHandle`]
/// until a store is attached.
#[derive(Debug)]
pub struct EntityModel<R> {
    store: Option<Store>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> EntityModel<R> {
    pub fn new(store: Store) -> Self {
        Self {
            store: Some(store),
            _record: PhantomData,
        }
    }

    pub fn table(&self) -> &'static str {
        R::TABLE
    }

    fn store(&self) -> StoreResult<&Store> {
        self.store.as_ref().ok_or(StoreError::NoHandle)
    }

    pub async fn get(&self, id: RecordId) -> StoreResult<R> {
        store::get(self.store()?.handle(), None, id).await
    }

    pub async fn insert(&self, record: &R) -> StoreResult<()> {
        store::insert(self.store()?.handle(), None, record).await
    }

    pub async fn delete(&self, predicate: Predicate) -> StoreResult<u64> {
        store::delete(self.store()?.handle(), R::TABLE, predicate).await
    }

    /// Update rows of this table. Only known, mutable columns are accepted.
    pub async fn update(&self, changes: Changes, predicate: Predicate) -> StoreResult<u64> {
        check_changes::<R>(&changes)?;
        store::update(self.store()?.handle(), R::TABLE, changes, predicate).await
    }

    pub async fn find(&self, predicate: Predicate) -> StoreResult<Vec<R>> {
        store::find(self.store()?.handle(), None, predicate).await
    }
}

impl<R> Default for EntityModel<R> {
    fn default() -> Self {
        Self {
            store: None,
            _record: PhantomData,
        }
    }
}

impl<R> Clone for EntityModel<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _record: PhantomData,
        }
    }
}

impl<R> AttachStore for EntityModel<R> {
    fn set_store(&mut self, store: Store) {
        self.store = Some(store);
    }
}

/// Reject columns the record does not have, and the immutable `id`
pub fn check_changes<R: Record>(changes: &Changes) -> StoreResult<()> {
    match changes.columns().find(|c| !R::is_mutable_column(c)) {
        Some(column) => Err(StoreError::UnknownColumn {
            table: R::TABLE,
            column: column.to_string(),
        }),
        None => Ok(()),
    }
}
