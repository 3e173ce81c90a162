//! HTTP handlers for the Books module.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use libris_http::error::AppError;
use libris_http::extract::{AppJson, AppPath};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::error::BookError;
use super::models::{Book, BookId, CreateBook, UpdateBook};
use super::service::{BookService, UnitOfWork};

/// Shared handler state.
///
/// Every request runs under a child of `shutdown`, so work that has not yet
/// written anything is abandoned once the module stops.
pub struct BooksState<U: UnitOfWork> {
    pub service: Arc<BookService<U>>,
    pub shutdown: CancellationToken,
}

impl<U: UnitOfWork> Clone for BooksState<U> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<U: UnitOfWork> BooksState<U> {
    pub(crate) fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        let message = err.to_string();
        match err {
            BookError::InvalidArgument { field, message: reason } => AppError::validation(
                vec![json!({ "field": field, "error": reason })],
                message,
            ),
            BookError::InvalidState(_) => AppError::conflict(Vec::new(), message),
            BookError::AlreadyExists(id) => {
                AppError::conflict(vec![json!({ "id": id })], message)
            }
            BookError::NotFound(_) => AppError::not_found(message),
            BookError::Cancelled => AppError::unavailable(message),
        }
    }
}

/// Routes mounted under `/api/books`.
pub fn router<U: UnitOfWork + 'static>(state: BooksState<U>) -> Router {
    Router::new()
        .route("/", get(list_books::<U>).post(create_book::<U>))
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(get_book::<U>)
                .put(update_book::<U>)
                .delete(delete_book::<U>),
        )
        .route("/{id}/checkout", post(checkout_book::<U>))
        .route("/{id}/return", post(return_book::<U>))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books<U: UnitOfWork>(
    State(state): State<BooksState<U>>,
) -> Result<Json<Vec<Book>>, AppError> {
    let books = state.service.get_all_books(&state.request_token()).await?;
    Ok(Json(books))
}

async fn get_book<U: UnitOfWork>(
    State(state): State<BooksState<U>>,
    AppPath(id): AppPath<BookId>,
) -> Result<Json<Book>, AppError> {
    match state
        .service
        .get_book_by_id(id, &state.request_token())
        .await?
    {
        Some(book) => Ok(Json(book)),
        None => {
            tracing::warn!(book_id = %id, "book not found");
            Err(AppError::not_found(format!("book {id} not found")))
        }
    }
}

async fn create_book<U: UnitOfWork>(
    State(state): State<BooksState<U>>,
    AppJson(request): AppJson<CreateBook>,
) -> Result<impl IntoResponse, AppError> {
    let book = state
        .service
        .create_book(
            request.title,
            request.author,
            request.isbn,
            request.published_date,
            request.page_count,
            &state.request_token(),
        )
        .await?;

    let location = format!("/api/books/{}", book.id());
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(book)))
}

async fn update_book<U: UnitOfWork>(
    State(state): State<BooksState<U>>,
    AppPath(id): AppPath<BookId>,
    AppJson(request): AppJson<UpdateBook>,
) -> Result<Json<Book>, AppError> {
    let book = state
        .service
        .update_book(
            id,
            request.title,
            request.author,
            request.page_count,
            &state.request_token(),
        )
        .await?;
    Ok(Json(book))
}

async fn delete_book<U: UnitOfWork>(
    State(state): State<BooksState<U>>,
    AppPath(id): AppPath<BookId>,
) -> Result<StatusCode, AppError> {
    state
        .service
        .delete_book(id, &state.request_token())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn checkout_book<U: UnitOfWork>(
    State(state): State<BooksState<U>>,
    AppPath(id): AppPath<BookId>,
) -> Result<Json<Book>, AppError> {
    let book = state
        .service
        .checkout_book(id, &state.request_token())
        .await?;
    Ok(Json(book))
}

async fn return_book<U: UnitOfWork>(
    State(state): State<BooksState<U>>,
    AppPath(id): AppPath<BookId>,
) -> Result<Json<Book>, AppError> {
    let book = state
        .service
        .return_book(id, &state.request_token())
        .await?;
    Ok(Json(book))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_errors_map_to_distinct_statuses() {
        let id = BookId::new_v4();
        let cases = [
            (BookError::invalid_argument("title", "cannot be empty"), StatusCode::BAD_REQUEST),
            (BookError::InvalidState("nope".into()), StatusCode::CONFLICT),
            (BookError::AlreadyExists(id), StatusCode::CONFLICT),
            (BookError::NotFound(id), StatusCode::NOT_FOUND),
            (BookError::Cancelled, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }
}
