//! Book storage contract and its in-memory implementation.
//!
//! Every operation checks the cancellation token first and fails with
//! [`BookError::Cancelled`] without touching the store.

use async_trait::async_trait;
use libris_store::{MemoryStore, StoreError};
use tokio_util::sync::CancellationToken;

use super::error::{ensure_not_cancelled, BookError, BookResult};
use super::models::{Book, BookId};

/// Change applied to a stored book by [`BookRepository::update_with`].
pub type BookChange<'a> = Box<dyn FnOnce(&mut Book) -> BookResult<()> + Send + 'a>;

/// Storage-agnostic access to book records.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Returns the stored book, or `None` if there is none with `id`.
    async fn get_by_id(&self, id: BookId, cancel: &CancellationToken)
        -> BookResult<Option<Book>>;

    /// Point-in-time snapshot of every stored book, in no particular order.
    async fn get_all(&self, cancel: &CancellationToken) -> BookResult<Vec<Book>>;

    /// Stores a new book; `AlreadyExists` if its id is taken.
    async fn add(&self, book: Book, cancel: &CancellationToken) -> BookResult<Book>;

    /// Replaces an existing book; `NotFound` if its id is not stored.
    async fn update(&self, book: Book, cancel: &CancellationToken) -> BookResult<Book>;

    /// Reads, changes and writes back one book as a single step.
    ///
    /// No other write to `id` can land between the read and the write. If
    /// `change` fails, its error is returned and the stored book is kept.
    /// `NotFound` if its id is not stored.
    async fn update_with(
        &self,
        id: BookId,
        change: BookChange<'_>,
        cancel: &CancellationToken,
    ) -> BookResult<Book>;

    /// Removes a book; `NotFound` if its id is not stored.
    async fn delete(&self, id: BookId, cancel: &CancellationToken) -> BookResult<()>;
}

/// Process-lifetime repository over a sharded concurrent map.
#[derive(Default)]
pub struct InMemoryBookRepository {
    books: MemoryStore<BookId, Book>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn get_by_id(
        &self,
        id: BookId,
        cancel: &CancellationToken,
    ) -> BookResult<Option<Book>> {
        ensure_not_cancelled(cancel)?;
        Ok(self.books.get(&id))
    }

    async fn get_all(&self, cancel: &CancellationToken) -> BookResult<Vec<Book>> {
        ensure_not_cancelled(cancel)?;
        Ok(self.books.snapshot())
    }

    async fn add(&self, book: Book, cancel: &CancellationToken) -> BookResult<Book> {
        ensure_not_cancelled(cancel)?;
        let id = book.id();
        self.books.insert_new(id, book).map_err(|err| match err {
            StoreError::Occupied => BookError::AlreadyExists(id),
            StoreError::Vacant => BookError::NotFound(id),
        })
    }

    async fn update(&self, book: Book, cancel: &CancellationToken) -> BookResult<Book> {
        ensure_not_cancelled(cancel)?;
        let id = book.id();
        self.books
            .replace_existing(&id, book)
            .map_err(|_| BookError::NotFound(id))
    }

    async fn update_with(
        &self,
        id: BookId,
        change: BookChange<'_>,
        cancel: &CancellationToken,
    ) -> BookResult<Book> {
        ensure_not_cancelled(cancel)?;
        self.books
            .modify(&id, change)
            .map_err(|_| BookError::NotFound(id))?
    }

    async fn delete(&self, id: BookId, cancel: &CancellationToken) -> BookResult<()> {
        ensure_not_cancelled(cancel)?;
        self.books
            .remove_existing(&id)
            .map(|_| ())
            .map_err(|_| BookError::NotFound(id))
    }
}
