//! Records and column values
//!
//! The shape-independent contract between typed entities and the generic
//! record operations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite};
use uuid::Uuid;

/// Time-ordered, lexicographically sortable record identifier.
///
/// Backed by a UUIDv7; its canonical lowercase text sorts in creation order,
/// which is also how it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generate a new identifier encoding the current time
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A value bound to a statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Bool(bool),
    Text(String),
    /// Stored as exact decimal text
    Decimal(Decimal),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Append this value to the builder as a bound parameter
    pub(crate) fn push_bind(self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Value::Null => {
                qb.push_bind(Option::<String>::None);
            }
            Value::Integer(v) => {
                qb.push_bind(v);
            }
            Value::Bool(v) => {
                qb.push_bind(v);
            }
            Value::Text(v) => {
                qb.push_bind(v);
            }
            Value::Decimal(v) => {
                qb.push_bind(v.to_string());
            }
            Value::Timestamp(v) => {
                qb.push_bind(v);
            }
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<RecordId> for Value {
    fn from(v: RecordId) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A typed row persisted in a single table.
///
/// `COLUMNS` lists every persisted column with `id` first; `values` must
/// return them in the same order.
pub trait Record: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    /// Table used when the caller does not name one
    const TABLE: &'static str;

    /// Persisted columns, primary key first
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> RecordId;

    /// Column values in `COLUMNS` order
    fn values(&self) -> Vec<Value>;

    /// Check that a column may be changed by an update
    fn is_mutable_column(column: &str) -> bool {
        column != "id" && Self::COLUMNS.contains(&column)
    }
}

/// Decode a `RecordId` column stored as text
pub(crate) fn decode_id(row: &SqliteRow, column: &str) -> Result<RecordId, sqlx::Error> {
    use sqlx::Row;

    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: uuid::Error| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Decode a `Decimal` column stored as exact text
pub(crate) fn decode_decimal(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    use sqlx::Row;

    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
