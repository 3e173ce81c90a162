//! Book domain model.
//!
//! # Invariants
//! - `title`, `author` and `isbn` are never empty or whitespace-only.
//! - `page_count` is always positive.
//! - `id`, `isbn`, `published_date` and `created_at` never change after
//!   construction.
//! - `status` moves only through [`Book::mark_as_checked_out`] and
//!   [`Book::mark_as_returned`].

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::{BookError, BookResult};

/// Stable identifier of a book record.
pub type BookId = Uuid;

/// Circulation state of a book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    /// On the shelf and free to check out.
    #[default]
    Available,
    /// Lent to a patron.
    CheckedOut,
    /// Held for a patron. No transition leads here yet.
    Reserved,
    /// Withdrawn from circulation. No transition leads here yet.
    OutOfService,
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Available => "available",
            Self::CheckedOut => "checked_out",
            Self::Reserved => "reserved",
            Self::OutOfService => "out_of_service",
        };
        f.write_str(label)
    }
}

/// Catalog record for one book.
///
/// Fields are private so every write goes through a validating method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    id: BookId,
    title: String,
    author: String,
    isbn: String,
    #[serde(with = "time::serde::rfc3339")]
    published_date: OffsetDateTime,
    page_count: i32,
    status: BookStatus,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    updated_at: Option<OffsetDateTime>,
}

impl Book {
    /// Creates an available book with a fresh id.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        published_date: OffsetDateTime,
        page_count: i32,
    ) -> BookResult<Self> {
        let title = require_text("title", title.into())?;
        let author = require_text("author", author.into())?;
        let isbn = require_text("isbn", isbn.into())?;
        let page_count = require_positive_pages(page_count)?;

        Ok(Self {
            id: Uuid::new_v4(),
            title,
            author,
            isbn,
            published_date,
            page_count,
            status: BookStatus::Available,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
        })
    }

    /// Replaces the editable details.
    ///
    /// All three values are checked before any is written, so a rejected
    /// update leaves the book untouched.
    pub fn update_details(
        &mut self,
        title: impl Into<String>,
        author: impl Into<String>,
        page_count: i32,
    ) -> BookResult<()> {
        let title = require_text("title", title.into())?;
        let author = require_text("author", author.into())?;
        let page_count = require_positive_pages(page_count)?;

        self.title = title;
        self.author = author;
        self.page_count = page_count;
        self.touch();
        Ok(())
    }

    /// `Available` -> `CheckedOut`.
    pub fn mark_as_checked_out(&mut self) -> BookResult<()> {
        if self.status != BookStatus::Available {
            return Err(BookError::InvalidState(format!(
                "book {} is not available for checkout (status: {})",
                self.id, self.status
            )));
        }
        self.status = BookStatus::CheckedOut;
        self.touch();
        Ok(())
    }

    /// `CheckedOut` -> `Available`.
    pub fn mark_as_returned(&mut self) -> BookResult<()> {
        if self.status != BookStatus::CheckedOut {
            return Err(BookError::InvalidState(format!(
                "book {} is not checked out (status: {})",
                self.id, self.status
            )));
        }
        self.status = BookStatus::Available;
        self.touch();
        Ok(())
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn published_date(&self) -> OffsetDateTime {
        self.published_date
    }

    pub fn page_count(&self) -> i32 {
        self.page_count
    }

    pub fn status(&self) -> BookStatus {
        self.status
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<OffsetDateTime> {
        self.updated_at
    }

    fn touch(&mut self) {
        self.updated_at = Some(OffsetDateTime::now_utc());
    }
}

fn require_text(field: &'static str, value: String) -> BookResult<String> {
    if value.trim().is_empty() {
        return Err(BookError::invalid_argument(field, "cannot be empty"));
    }
    Ok(value)
}

fn require_positive_pages(page_count: i32) -> BookResult<i32> {
    if page_count <= 0 {
        return Err(BookError::invalid_argument(
            "page_count",
            "must be positive",
        ));
    }
    Ok(page_count)
}

/// Request model for creating a new book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_date: OffsetDateTime,
    pub page_count: i32,
}

/// Request model for editing a book's details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBook {
    pub title: String,
    pub author: String,
    pub page_count: i32,
}
