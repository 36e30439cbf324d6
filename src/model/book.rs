//! Book entity

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::store::{decode_id, Record, RecordId, Value};

use super::entity::EntityModel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: RecordId,
    pub name: String,
}

impl Book {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            name: name.into(),
        }
    }
}

impl<'r> FromRow<'r, SqliteRow> for Book {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: decode_id(row, "id")?,
            name: row.try_get("name")?,
        })
    }
}

impl Record for Book {
    const TABLE: &'static str = "books";
    const COLUMNS: &'static [&'static str] = &["id", "name"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![self.id.into(), self.name.clone().into()]
    }
}

pub type BookModel = EntityModel<Book>;
