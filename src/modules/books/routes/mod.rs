//! HTTP handlers for `/books`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookstore_http::error::AppError;
use serde_json::{json, Value};

use super::models::{BookEnvelope, BookList, MessageBody};
use super::repository::{BookRepository, RepositoryError};
use super::schema::{self, ValidationError};

pub type SharedRepository = Arc<dyn BookRepository>;

/// Routes for the books resource, bound to `repo`.
pub fn router(repo: SharedRepository) -> Router {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/{isbn}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(repo)
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        let details = err
            .violations
            .iter()
            .map(|v| {
                json!({
                    "field": v.field,
                    "error": v.kind.code(),
                    "message": v.to_string(),
                })
            })
            .collect();
        AppError::validation(details, err.to_string())
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => AppError::not_found(err.to_string()),
            RepositoryError::Conflict(ref isbn) => AppError::conflict(
                vec![json!({ "field": "isbn", "value": isbn })],
                err.to_string(),
            ),
            RepositoryError::Store(e) => AppError::Internal(e.into()),
        }
    }
}

async fn list_books(State(repo): State<SharedRepository>) -> Result<Json<BookList>, AppError> {
    let books = repo.list_all().await?;
    Ok(Json(BookList { books }))
}

async fn get_book(
    State(repo): State<SharedRepository>,
    Path(isbn): Path<String>,
) -> Result<Json<BookEnvelope>, AppError> {
    let book = repo.get_by_isbn(&isbn).await?;
    Ok(Json(BookEnvelope { book }))
}

async fn create_book(
    State(repo): State<SharedRepository>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<BookEnvelope>), AppError> {
    let Json(payload) = payload?;
    let book = schema::validate_new_book(&payload)?;
    let book = repo.create(&book).await?;

    tracing::info!(isbn = %book.isbn, "book created");
    Ok((StatusCode::CREATED, Json(BookEnvelope { book })))
}

async fn update_book(
    State(repo): State<SharedRepository>,
    Path(isbn): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BookEnvelope>, AppError> {
    let Json(payload) = payload?;
    let patch = schema::validate_patch(&payload)?;
    let book = repo.update(&isbn, &patch).await?;
    Ok(Json(BookEnvelope { book }))
}

async fn delete_book(
    State(repo): State<SharedRepository>,
    Path(isbn): Path<String>,
) -> Result<Json<MessageBody>, AppError> {
    repo.delete(&isbn).await?;

    tracing::info!(%isbn, "book deleted");
    Ok(Json(MessageBody {
        message: "Book deleted".to_string(),
    }))
}
