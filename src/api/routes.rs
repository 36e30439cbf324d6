//! API Routes
//!
//! HTTP endpoint definitions for books and transactions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::model::{Book, Transaction, TransactionType};
use crate::store::{self, run_in_transaction, Changes, Predicate, RecordId, TxOptions};

use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBookRequest {
    pub name: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateBookRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub book_id: RecordId,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Defaults to now
    #[serde(default)]
    pub date_transaction: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateTransactionRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub amount: Option<Decimal>,
    #[serde(default, rename = "type")]
    pub kind: Option<TransactionType>,
    #[serde(default)]
    pub date_transaction: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/:book_id",
            get(get_book).patch(update_book).delete(delete_book),
        )
        .route("/books/:book_id/transactions", get(list_book_transactions))
        .route("/transactions", axum::routing::post(create_transaction))
        .route(
            "/transactions/:transaction_id",
            get(get_transaction)
                .patch(update_transaction)
                .delete(delete_transaction),
        )
}

fn parse_id(raw: &str) -> AppResult<RecordId> {
    raw.parse()
        .map_err(|_| AppError::InvalidRequest(format!("malformed id: {raw}")))
}

/// Health check, including a database round trip
async fn health_check(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    state.store.ping().await?;
    Ok(Json(HealthResponse {
        status: "OK".to_string(),
    }))
}

// =========================================================================
// Books
// =========================================================================

async fn create_book(
    State(state): State<AppState>,
    Json(request): Json<CreateBookRequest>,
) -> AppResult<(StatusCode, Json<Book>)> {
    if request.name.trim().is_empty() {
        return Err(AppError::InvalidRequest("name must not be empty".to_string()));
    }

    let book = Book::new(request.name);
    state.models.book.insert(&book).await?;

    tracing::info!(book_id = %book.id, "Book created");
    Ok((StatusCode::CREATED, Json(book)))
}

async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.models.book.find(Predicate::all()).await?;
    Ok(Json(books))
}

async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> AppResult<Json<Book>> {
    let id = parse_id(&book_id)?;
    let book = state
        .models
        .book
        .get(id)
        .await
        .map_err(AppError::book_lookup)?;
    Ok(Json(book))
}

async fn update_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
    Json(request): Json<UpdateBookRequest>,
) -> AppResult<Json<Book>> {
    let id = parse_id(&book_id)?;

    let mut changes = Changes::new();
    if let Some(name) = request.name {
        changes = changes.set("name", name);
    }

    let rows = state
        .models
        .book
        .update(changes, Predicate::eq("id", id))
        .await?;
    if rows == 0 {
        return Err(AppError::BookNotFound(id.to_string()));
    }

    let book = state
        .models
        .book
        .get(id)
        .await
        .map_err(AppError::book_lookup)?;
    Ok(Json(book))
}

/// Delete a book together with its transactions
async fn delete_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&book_id)?;
    let transactions = state.models.transaction.table();
    let books = state.models.book.table();

    let removed = run_in_transaction(state.store.handle(), TxOptions::default(), |tx| {
        Box::pin(async move {
            let removed =
                store::delete(tx.handle(), transactions, Predicate::eq("book_id", id)).await?;

            let books = store::delete(tx.handle(), books, Predicate::eq("id", id)).await?;
            if books == 0 {
                return Err(AppError::BookNotFound(id.to_string()));
            }
            Ok::<_, AppError>(removed)
        })
    })
    .await?;

    tracing::info!(book_id = %id, transactions = removed, "Book deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_book_transactions(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> AppResult<Json<Vec<Transaction>>> {
    let id = parse_id(&book_id)?;

    state
        .models
        .book
        .get(id)
        .await
        .map_err(AppError::book_lookup)?;

    let transactions = state.models.transaction.find_by_book(id).await?;
    Ok(Json(transactions))
}

// =========================================================================
// Transactions
// =========================================================================

async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    let record = Transaction::new(
        request.book_id,
        request.description,
        request.amount,
        request.kind,
        request.date_transaction.unwrap_or_else(Utc::now),
    );

    let record = run_in_transaction(state.store.handle(), TxOptions::default(), |tx| {
        Box::pin(async move {
            store::get::<Book>(tx.handle(), None, record.book_id)
                .await
                .map_err(AppError::book_lookup)?;
            store::insert(tx.handle(), None, &record).await?;
            Ok::<_, AppError>(record)
        })
    })
    .await?;

    tracing::info!(
        transaction_id = %record.id,
        book_id = %record.book_id,
        "Transaction recorded"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> AppResult<Json<Transaction>> {
    let id = parse_id(&transaction_id)?;
    let record = state
        .models
        .transaction
        .get(id)
        .await
        .map_err(AppError::transaction_lookup)?;
    Ok(Json(record))
}

async fn update_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
    Json(request): Json<UpdateTransactionRequest>,
) -> AppResult<Json<Transaction>> {
    let id = parse_id(&transaction_id)?;

    let mut changes = Changes::new();
    if let Some(description) = request.description {
        changes = changes.set("description", description);
    }
    if let Some(amount) = request.amount {
        changes = changes.set("amount", amount);
    }
    if let Some(kind) = request.kind {
        changes = changes.set("type", kind);
    }
    if let Some(date) = request.date_transaction {
        changes = changes.set("date_transaction", date);
    }

    let rows = state
        .models
        .transaction
        .update(changes, Predicate::eq("id", id))
        .await?;
    if rows == 0 {
        return Err(AppError::TransactionNotFound(id.to_string()));
    }

    let record = state
        .models
        .transaction
        .get(id)
        .await
        .map_err(AppError::transaction_lookup)?;
    Ok(Json(record))
}

async fn delete_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&transaction_id)?;

    let rows = state
        .models
        .transaction
        .delete(Predicate::eq("id", id))
        .await?;
    if rows == 0 {
        return Err(AppError::TransactionNotFound(id.to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
