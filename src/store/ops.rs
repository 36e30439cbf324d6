//! Generic record operations
//!
//! Table-name-parameterized get/insert/update/delete/find over any
//! [`Handle`]. Every failure is returned once, immediately; nothing here
//! retries.

use sqlx::{QueryBuilder, Sqlite};

use super::error::{StoreError, StoreResult};
use super::predicate::{check_identifier, Changes, Predicate};
use super::record::{Record, RecordId, Value};
use super::tx::Handle;

/// `None` or an empty name selects the record's own table
fn table_for<'a, R: Record>(table: Option<&'a str>) -> StoreResult<&'a str> {
    let table = table.filter(|name| !name.is_empty()).unwrap_or(R::TABLE);
    check_identifier(table)
}

fn select_columns<R: Record>(table: &str) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(R::COLUMNS.join(", ")).push(" FROM ").push(table);
    qb
}

async fn execute(handle: Handle<'_>, mut qb: QueryBuilder<'_, Sqlite>) -> StoreResult<u64> {
    let query = qb.build();
    let result = match handle {
        Handle::Store(store) => query.execute(store.writer()).await?,
        Handle::Tx(tx) => query.execute(tx.conn()?).await?,
    };
    Ok(result.rows_affected())
}

/// Fetch the row whose `id` column equals `id`.
///
/// `table` defaults to the record's own table. Zero matching rows is
/// [`StoreError::NotFound`].
pub async fn get<R: Record>(handle: Handle<'_>, table: Option<&str>, id: RecordId) -> StoreResult<R> {
    let table = table_for::<R>(table)?;

    let mut qb = select_columns::<R>(table);
    qb.push(" WHERE id = ");
    Value::from(id).push_bind(&mut qb);

    let query = qb.build_query_as::<R>();
    let row = match handle {
        Handle::Store(store) => query.fetch_optional(store.pool()).await?,
        Handle::Tx(tx) => query.fetch_optional(tx.conn()?).await?,
    };

    row.ok_or_else(|| StoreError::NotFound {
        table: table.to_string(),
        id: id.to_string(),
    })
}

/// Insert one row built from the record's columns.
///
/// The record must already carry its identifier.
pub async fn insert<R: Record>(handle: Handle<'_>, table: Option<&str>, record: &R) -> StoreResult<()> {
    let table = table_for::<R>(table)?;
    handle.check_writable()?;

    let mut qb = QueryBuilder::new("INSERT INTO ");
    qb.push(table)
        .push(" (")
        .push(R::COLUMNS.join(", "))
        .push(") VALUES (");
    for (idx, value) in record.values().into_iter().enumerate() {
        if idx > 0 {
            qb.push(", ");
        }
        value.push_bind(&mut qb);
    }
    qb.push(")");

    execute(handle, qb).await?;

    tracing::debug!(table, id = %record.id(), "Record inserted");
    Ok(())
}

/// Set the columns in `changes` on every row matching `predicate`.
///
/// Column names are only checked to be identifiers; whether they belong to
/// the table is up to the caller. Last writer wins. Returns rows affected.
pub async fn update(
    handle: Handle<'_>,
    table: &str,
    changes: Changes,
    predicate: Predicate,
) -> StoreResult<u64> {
    let table = check_identifier(table)?;
    changes.validate()?;
    predicate.validate()?;
    handle.check_writable()?;

    let mut qb = QueryBuilder::new("UPDATE ");
    qb.push(table);
    changes.push_set(&mut qb);
    predicate.push_where(&mut qb);

    let rows = execute(handle, qb).await?;

    tracing::debug!(table, rows, "Records updated");
    Ok(rows)
}

/// Delete every row matching `predicate`.
///
/// `Predicate::all()` empties the table. Returns rows affected.
pub async fn delete(handle: Handle<'_>, table: &str, predicate: Predicate) -> StoreResult<u64> {
    let table = check_identifier(table)?;
    predicate.validate()?;
    handle.check_writable()?;

    if predicate.is_all() {
        tracing::warn!(table, "Deleting every row");
    }

    let mut qb = QueryBuilder::new("DELETE FROM ");
    qb.push(table);
    predicate.push_where(&mut qb);

    let rows = execute(handle, qb).await?;

    tracing::debug!(table, rows, "Records deleted");
    Ok(rows)
}

/// Fetch every row matching `predicate`, ordered by id
pub async fn find<R: Record>(
    handle: Handle<'_>,
    table: Option<&str>,
    predicate: Predicate,
) -> StoreResult<Vec<R>> {
    let table = table_for::<R>(table)?;
    predicate.validate()?;

    let mut qb = select_columns::<R>(table);
    predicate.push_where(&mut qb);
    qb.push(" ORDER BY id");

    let query = qb.build_query_as::<R>();
    let rows = match handle {
        Handle::Store(store) => query.fetch_all(store.pool()).await?,
        Handle::Tx(tx) => query.fetch_all(tx.conn()?).await?,
    };

    Ok(rows)
}
