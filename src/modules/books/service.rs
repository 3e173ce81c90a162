//! Book use-case service.
//!
//! # Responsibility
//! - Sequence repository calls for each use case and commit through the
//!   unit of work.
//! - Turn a missing target into [`BookError::NotFound`] before touching
//!   the entity.
//!
//! # Invariants
//! - Books are only changed through their own behavior methods.
//! - The service holds no mutable state; the repository is the only shared
//!   resource.
//!
//! Updates and status changes go through [`BookRepository::update_with`],
//! so each one checks the book it actually overwrites. Two racing checkouts
//! of one book admit exactly one; two racing detail updates both apply in
//! commit order; an update racing a delete fails with `NotFound` and never
//! recreates the removed record.

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use super::error::{BookError, BookResult};
use super::models::{Book, BookId};
use super::repository::{BookRepository, InMemoryBookRepository};

/// Transactional boundary around the book repository.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn books(&self) -> &dyn BookRepository;

    /// Commits pending changes, returning how many units were written.
    async fn save_changes(&self, cancel: &CancellationToken) -> BookResult<usize>;
}

/// Unit of work over [`InMemoryBookRepository`].
///
/// Repository writes are visible immediately, so committing has nothing
/// left to flush. A buffered store would check `cancel` here before
/// flushing; this one never reports `Cancelled` for a write already made.
pub struct InMemoryUnitOfWork {
    books: Arc<InMemoryBookRepository>,
}

impl InMemoryUnitOfWork {
    pub fn new(books: Arc<InMemoryBookRepository>) -> Self {
        Self { books }
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn books(&self) -> &dyn BookRepository {
        self.books.as_ref()
    }

    async fn save_changes(&self, _cancel: &CancellationToken) -> BookResult<usize> {
        Ok(1)
    }
}

/// Use-case entry points for the book catalog.
pub struct BookService<U: UnitOfWork> {
    uow: U,
}

impl<U: UnitOfWork> BookService<U> {
    pub fn new(uow: U) -> Self {
        Self { uow }
    }

    pub async fn create_book(
        &self,
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        published_date: OffsetDateTime,
        page_count: i32,
        cancel: &CancellationToken,
    ) -> BookResult<Book> {
        let title = title.into();
        tracing::info!(title = %title, "creating book");

        let book = Book::new(title, author, isbn, published_date, page_count)
            .inspect_err(|err| tracing::warn!(error = %err, "rejected new book"))?;

        let book = self.uow.books().add(book, cancel).await?;
        self.uow.save_changes(cancel).await?;

        tracing::info!(book_id = %book.id(), "book created");
        Ok(book)
    }

    pub async fn get_book_by_id(
        &self,
        id: BookId,
        cancel: &CancellationToken,
    ) -> BookResult<Option<Book>> {
        tracing::debug!(book_id = %id, "retrieving book");
        self.uow.books().get_by_id(id, cancel).await
    }

    pub async fn get_all_books(&self, cancel: &CancellationToken) -> BookResult<Vec<Book>> {
        tracing::debug!("retrieving all books");
        self.uow.books().get_all(cancel).await
    }

    pub async fn update_book(
        &self,
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        page_count: i32,
        cancel: &CancellationToken,
    ) -> BookResult<Book> {
        tracing::info!(book_id = %id, "updating book");

        let (title, author): (String, String) = (title.into(), author.into());
        let book = self
            .uow
            .books()
            .update_with(
                id,
                Box::new(move |book: &mut Book| book.update_details(title, author, page_count)),
                cancel,
            )
            .await
            .inspect_err(|err| log_rejection(id, "update", err))?;
        self.uow.save_changes(cancel).await?;

        tracing::info!(book_id = %id, "book updated");
        Ok(book)
    }

    pub async fn delete_book(&self, id: BookId, cancel: &CancellationToken) -> BookResult<()> {
        tracing::info!(book_id = %id, "deleting book");

        self.require(id, "delete", cancel).await?;
        self.uow.books().delete(id, cancel).await?;
        self.uow.save_changes(cancel).await?;

        tracing::info!(book_id = %id, "book deleted");
        Ok(())
    }

    /// Lends a book out; `InvalidState` unless it is available.
    pub async fn checkout_book(&self, id: BookId, cancel: &CancellationToken) -> BookResult<Book> {
        self.transition(id, "checkout", Book::mark_as_checked_out, cancel)
            .await
    }

    /// Takes a lent book back; `InvalidState` unless it is checked out.
    pub async fn return_book(&self, id: BookId, cancel: &CancellationToken) -> BookResult<Book> {
        self.transition(id, "return", Book::mark_as_returned, cancel)
            .await
    }

    async fn transition(
        &self,
        id: BookId,
        action: &'static str,
        apply: fn(&mut Book) -> BookResult<()>,
        cancel: &CancellationToken,
    ) -> BookResult<Book> {
        tracing::info!(book_id = %id, action, "changing book status");

        let book = self
            .uow
            .books()
            .update_with(id, Box::new(apply), cancel)
            .await
            .inspect_err(|err| log_rejection(id, action, err))?;
        self.uow.save_changes(cancel).await?;

        tracing::info!(book_id = %id, action, status = %book.status(), "book status changed");
        Ok(book)
    }

    async fn require(
        &self,
        id: BookId,
        action: &'static str,
        cancel: &CancellationToken,
    ) -> BookResult<Book> {
        match self.uow.books().get_by_id(id, cancel).await? {
            Some(book) => Ok(book),
            None => {
                tracing::warn!(book_id = %id, action, "book not found");
                Err(BookError::NotFound(id))
            }
        }
    }
}

fn log_rejection(id: BookId, action: &'static str, err: &BookError) {
    match err {
        BookError::NotFound(_) => tracing::warn!(book_id = %id, action, "book not found"),
        BookError::Cancelled => tracing::debug!(book_id = %id, action, "cancelled"),
        _ => tracing::warn!(book_id = %id, action, error = %err, "rejected book change"),
    }
}
