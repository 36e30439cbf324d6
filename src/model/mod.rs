//! Entity models
//!
//! Typed models for books and transactions, and the registry that hands
//! them a shared store.

mod book;
pub mod entity;
mod transaction;

pub use book::{Book, BookModel};
pub use entity::EntityModel;
pub use transaction::{InvalidTransactionType, Transaction, TransactionModel, TransactionType};

use crate::store::Store;

/// Anything that can be given a store handle
pub trait AttachStore {
    fn set_store(&mut self, store: Store);
}

/// One model per entity, all sharing the same store
#[derive(Debug, Clone, Default)]
pub struct Models {
    pub book: BookModel,
    pub transaction: TransactionModel,
}

impl Models {
    pub fn new(store: Store) -> Self {
        let mut models = Self::default();
        models.set_store(store);
        models
    }
}

impl AttachStore for Models {
    fn set_store(&mut self, store: Store) {
        self.book.set_store(store.clone());
        self.transaction.set_store(store);
    }
}
