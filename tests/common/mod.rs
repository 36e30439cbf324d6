//! Common test utilities

#![allow(dead_code)]

use std::path::Path;

use money_ledger::store::Store;
use money_ledger::{Book, Transaction, TransactionType};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use tempfile::TempDir;

/// A migrated database in a temporary directory, removed on drop
pub struct TestDb {
    pub store: Store,
    _dir: TempDir,
}

/// Setup test database - fresh file, all migrations applied
pub async fn setup_test_db() -> TestDb {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let store = Store::open_file("test.db", dir.path(), 5)
        .await
        .expect("Failed to open test database");

    store
        .migrate(Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"))
        .await
        .expect("Failed to run migrations");

    TestDb { store, _dir: dir }
}

/// Seed rows with raw SQL
pub async fn seed(store: &Store, statements: &[&str]) {
    for statement in statements {
        sqlx::query(statement)
            .execute(store.pool())
            .await
            .expect("Failed to seed");
    }
}

pub fn sample_transaction(book: &Book, amount: Decimal, kind: TransactionType) -> Transaction {
    let mut record = Transaction::new(
        book.id,
        "groceries",
        amount,
        kind,
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    );
    record.date_created = Utc.with_ymd_and_hms(2024, 3, 2, 8, 30, 0).unwrap();
    record
}
