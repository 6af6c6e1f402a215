//! HTTP handlers for `/books`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use bookshelf_http::{ApiResponse, AppError};

use super::models::{
    parse_numeric_flag, Book, BookFilter, BookId, BookPayload, BookSummary, PayloadError,
};
use super::registry::{BookRegistry, RegistryError};

/// Routes for the Books module, bound to `registry`.
pub fn router(registry: Arc<BookRegistry>) -> Router {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/{book_id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(registry)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBook {
    pub book_id: BookId,
}

#[derive(Debug, Serialize)]
pub struct BookList {
    pub books: Vec<BookSummary>,
}

#[derive(Debug, Serialize)]
pub struct BookDetail {
    pub book: Book,
}

/// Raw query string; flag decoding happens in [`ListQuery::into_filter`].
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub name: Option<String>,
    pub reading: Option<String>,
    pub finished: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> Result<BookFilter, AppError> {
        Ok(BookFilter {
            name: self.name.filter(|name| !name.is_empty()),
            reading: decode_flag("reading", self.reading.as_deref())?,
            finished: decode_flag("finished", self.finished.as_deref())?,
        })
    }
}

fn decode_flag(field: &str, raw: Option<&str>) -> Result<Option<bool>, AppError> {
    raw.map(|value| {
        parse_numeric_flag(value)
            .map_err(|err| AppError::bad_request(format!("Invalid {field} filter: {err}")))
    })
    .transpose()
}

/// Which handler is failing; decides the wording of the fail message.
#[derive(Debug, Clone, Copy)]
enum Operation {
    Create,
    Get,
    Update,
    Delete,
}

impl Operation {
    fn decode(self, Json(body): Json<Value>) -> Result<BookPayload, AppError> {
        BookPayload::from_json(body).map_err(|err| match err {
            PayloadError::Invalid(reason) => self.failure(RegistryError::Validation(reason)),
            PayloadError::Malformed(err) => {
                AppError::bad_request(format!("Invalid request payload: {err}"))
            }
        })
    }

    fn failure(self, err: RegistryError) -> AppError {
        match (self, err) {
            (Operation::Create, RegistryError::Validation(reason)) => {
                AppError::validation(format!("Failed to add book. {reason}"))
            }
            (Operation::Update, RegistryError::Validation(reason)) => {
                AppError::validation(format!("Failed to update book. {reason}"))
            }
            (Operation::Get, RegistryError::NotFound { .. }) => {
                AppError::not_found("Book not found")
            }
            (Operation::Update, RegistryError::NotFound { .. }) => {
                AppError::not_found("Failed to update book. Id not found")
            }
            (Operation::Delete, RegistryError::NotFound { .. }) => {
                AppError::not_found("Failed to delete book. Id not found")
            }
            (_, err) => AppError::Internal(err.into()),
        }
    }
}

async fn create_book(
    State(registry): State<Arc<BookRegistry>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<ApiResponse<CreatedBook>, AppError> {
    let payload = Operation::Create.decode(body?)?;
    let book_id = registry
        .create(payload)
        .map_err(|err| Operation::Create.failure(err))?;

    Ok(ApiResponse::created(
        "Book added successfully",
        CreatedBook { book_id },
    ))
}

async fn list_books(
    State(registry): State<Arc<BookRegistry>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<ApiResponse<BookList>, AppError> {
    let Query(query) = query?;
    let filter = query.into_filter()?;
    let books = registry
        .list(&filter)
        .map_err(|err| AppError::Internal(err.into()))?;

    Ok(ApiResponse::ok(BookList { books }))
}

async fn get_book(
    State(registry): State<Arc<BookRegistry>>,
    Path(book_id): Path<String>,
) -> Result<ApiResponse<BookDetail>, AppError> {
    let book = registry
        .get(&book_id)
        .map_err(|err| Operation::Get.failure(err))?;

    Ok(ApiResponse::ok(BookDetail { book }))
}

async fn update_book(
    State(registry): State<Arc<BookRegistry>>,
    Path(book_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<ApiResponse<()>, AppError> {
    let payload = Operation::Update.decode(body?)?;
    registry
        .update(&book_id, payload)
        .map_err(|err| Operation::Update.failure(err))?;

    Ok(ApiResponse::message("Book updated successfully"))
}

async fn delete_book(
    State(registry): State<Arc<BookRegistry>>,
    Path(book_id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    registry
        .delete(&book_id)
        .map_err(|err| Operation::Delete.failure(err))?;

    Ok(ApiResponse::message("Book deleted successfully"))
}
