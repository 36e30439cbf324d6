//! Transaction entity
//!
//! A money movement recorded in a book. Amounts are exact decimals and are
//! persisted as decimal text.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::store::{decode_decimal, decode_id, Predicate, Record, RecordId, StoreResult, Value};

use super::entity::EntityModel;

/// Direction of a transaction, stored as its integer code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Expense = 1,
    Income = 2,
}

impl TransactionType {
    pub fn code(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid transaction type code: {0}")]
pub struct InvalidTransactionType(pub i64);

impl TryFrom<i64> for TransactionType {
    type Error = InvalidTransactionType;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(TransactionType::Expense),
            2 => Ok(TransactionType::Income),
            other => Err(InvalidTransactionType(other)),
        }
    }
}

impl From<TransactionType> for Value {
    fn from(kind: TransactionType) -> Self {
        Value::Integer(kind.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: RecordId,
    pub book_id: RecordId,
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub date_transaction: DateTime<Utc>,
    pub date_created: DateTime<Utc>,
}

impl Transaction {
    /// New transaction with a fresh id, created now
    pub fn new(
        book_id: RecordId,
        description: impl Into<String>,
        amount: Decimal,
        kind: TransactionType,
        date_transaction: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            book_id,
            description: description.into(),
            amount,
            kind,
            date_transaction,
            date_created: Utc::now(),
        }
    }
}

impl<'r> FromRow<'r, SqliteRow> for Transaction {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let code: i64 = row.try_get("type")?;
        let kind = TransactionType::try_from(code).map_err(|e| sqlx::Error::ColumnDecode {
            index: "type".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            id: decode_id(row, "id")?,
            book_id: decode_id(row, "book_id")?,
            description: row.try_get("description")?,
            amount: decode_decimal(row, "amount")?,
            kind,
            date_transaction: row.try_get("date_transaction")?,
            date_created: row.try_get("date_created")?,
        })
    }
}

impl Record for Transaction {
    const TABLE: &'static str = "transactions";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "book_id",
        "description",
        "amount",
        "type",
        "date_transaction",
        "date_created",
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            self.book_id.into(),
            self.description.clone().into(),
            self.amount.into(),
            self.kind.into(),
            self.date_transaction.into(),
            self.date_created.into(),
        ]
    }
}

pub type TransactionModel = EntityModel<Transaction>;

impl EntityModel<Transaction> {
    /// All transactions recorded in `book_id`
    pub async fn find_by_book(&self, book_id: RecordId) -> StoreResult<Vec<Transaction>> {
        self.find(Predicate::eq("book_id", book_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transaction_type_codes() {
        assert_eq!(TransactionType::Expense.code(), 1);
        assert_eq!(TransactionType::Income.code(), 2);
        assert_eq!(TransactionType::try_from(2), Ok(TransactionType::Income));
        assert_eq!(TransactionType::try_from(3), Err(InvalidTransactionType(3)));
        assert_eq!(TransactionType::try_from(0), Err(InvalidTransactionType(0)));
    }

    #[test]
    fn test_amount_serializes_as_string() {
        let tx = Transaction::new(
            RecordId::new(),
            "coffee",
            dec!(3.10),
            TransactionType::Expense,
            Utc::now(),
        );
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["amount"], "3.10");
        assert_eq!(json["type"], "expense");
    }

    #[test]
    fn test_amount_value_is_exact() {
        let tx = Transaction::new(
            RecordId::new(),
            "salary",
            dec!(1234.5678),
            TransactionType::Income,
            Utc::now(),
        );
        let values = tx.values();
        assert_eq!(values.len(), Transaction::COLUMNS.len());
        assert_eq!(values[3], Value::Decimal(dec!(1234.5678)));
        assert_eq!(values[4], Value::Integer(2));
    }
}
