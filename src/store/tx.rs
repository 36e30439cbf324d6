//! Transaction scoping
//!
//! A [`Handle`] is either the bare store or a borrowed open transaction.
//! Operations run the same way through both; only the owner of a
//! transaction commits or rolls it back.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use sqlx::{Sqlite, SqliteConnection, Transaction};

use super::connection::Store;
use super::error::{StoreError, StoreResult};

/// Boxed future returned by transaction bodies
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Options for a transaction started by the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOptions {
    /// Reject insert, update and delete issued through the transaction
    pub read_only: bool,
}

impl TxOptions {
    pub fn read_only() -> Self {
        Self { read_only: true }
    }
}

/// An open transaction.
///
/// After `commit` or `rollback` the value is closed and no longer usable as
/// a handle.
pub struct Tx {
    inner: Option<Transaction<'static, Sqlite>>,
    read_only: bool,
}

impl Tx {
    pub(crate) fn new(inner: Transaction<'static, Sqlite>, options: TxOptions) -> Self {
        Self {
            inner: Some(inner),
            read_only: options.read_only,
        }
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Borrow this transaction as a handle for record operations
    pub fn handle(&mut self) -> Handle<'_> {
        Handle::Tx(self)
    }

    pub(crate) fn conn(&mut self) -> StoreResult<&mut SqliteConnection> {
        self.inner.as_deref_mut().ok_or(StoreError::TransactionType)
    }

    pub async fn commit(&mut self) -> StoreResult<()> {
        let tx = self.inner.take().ok_or(StoreError::TransactionType)?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(&mut self) -> StoreResult<()> {
        let tx = self.inner.take().ok_or(StoreError::TransactionType)?;
        tx.rollback().await?;
        Ok(())
    }
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tx")
            .field("open", &self.is_open())
            .field("read_only", &self.read_only)
            .finish()
    }
}

/// Where a record operation runs
#[derive(Debug)]
pub enum Handle<'a> {
    /// Autocommit statements on the pool
    Store(&'a Store),
    /// Statements inside a transaction owned by someone else
    Tx(&'a mut Tx),
}

impl Handle<'_> {
    /// Fail without I/O if this handle cannot run a write
    pub(crate) fn check_writable(&self) -> StoreResult<()> {
        match self {
            Handle::Store(_) => Ok(()),
            Handle::Tx(tx) if !tx.is_open() => Err(StoreError::TransactionType),
            Handle::Tx(tx) if tx.is_read_only() => Err(StoreError::ReadOnly),
            Handle::Tx(_) => Ok(()),
        }
    }
}

impl<'a> From<&'a Store> for Handle<'a> {
    fn from(store: &'a Store) -> Self {
        Handle::Store(store)
    }
}

impl<'a> From<&'a mut Tx> for Handle<'a> {
    fn from(tx: &'a mut Tx) -> Self {
        Handle::Tx(tx)
    }
}

/// Run `f` inside a transaction.
///
/// Given the bare store, a transaction is started with `options`, committed
/// when `f` succeeds and rolled back when it fails. A failed rollback is
/// reported together with the error from `f`.
///
/// Given an open transaction, `f` runs inside it and the transaction is left
/// untouched either way; `options` do not apply. A closed transaction yields
/// [`StoreError::TransactionType`] before any I/O.
pub async fn run_in_transaction<T, E, F>(
    handle: Handle<'_>,
    options: TxOptions,
    f: F,
) -> Result<T, E>
where
    F: for<'t> FnOnce(&'t mut Tx) -> BoxFuture<'t, Result<T, E>>,
    E: From<StoreError> + std::error::Error + Send + Sync + 'static,
{
    match handle {
        Handle::Tx(tx) => {
            if !tx.is_open() {
                return Err(StoreError::TransactionType.into());
            }
            f(tx).await
        }
        Handle::Store(store) => {
            let mut tx = store.begin(options).await?;

            match f(&mut tx).await {
                Ok(value) => {
                    if tx.is_open() {
                        tx.commit().await?;
                    }
                    Ok(value)
                }
                Err(err) => {
                    let Some(inner) = tx.inner.take() else {
                        return Err(err);
                    };
                    match inner.rollback().await {
                        Ok(()) => Err(err),
                        Err(rollback) => {
                            tracing::error!(error = %rollback, "Transaction rollback failed");
                            Err(StoreError::Rollback {
                                rollback,
                                cause: Box::new(err),
                            }
                            .into())
                        }
                    }
                }
            }
        }
    }
}
