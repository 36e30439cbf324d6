//! Record store
//!
//! Generic, table-parameterized record access over SQLite with
//! transaction scoping. Entity models are thin typed wrappers on top.

mod connection;
mod error;
mod ops;
mod predicate;
mod record;
mod tx;

pub use connection::{resolve_data_file, Store};
pub use error::{StoreError, StoreResult};
pub use ops::{delete, find, get, insert, update};
pub use predicate::{check_identifier, Changes, Predicate};
pub use record::{Record, RecordId, Value};
pub use tx::{run_in_transaction, BoxFuture, Handle, Tx, TxOptions};

pub(crate) use record::{decode_decimal, decode_id};
