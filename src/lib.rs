//! money_ledger Library
//!
//! Personal finance record keeping: books and transactions persisted in
//! SQLite behind a generic record store, served over HTTP.

pub mod api;
pub mod config;
pub mod db;
pub mod model;
pub mod store;
mod error;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use model::{Book, Models, Transaction, TransactionType};
pub use store::{Store, StoreError};
