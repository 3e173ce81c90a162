use time::macros::datetime;
use tokio_util::sync::CancellationToken;

use super::error::BookResult;
use super::models::Book;
use super::service::{BookService, UnitOfWork};

/// Adds a handful of well-known titles to the catalog.
///
/// Stops at the first failure; books created before it stay in place.
pub async fn seed_sample_data<U: UnitOfWork>(
    service: &BookService<U>,
    cancel: &CancellationToken,
) -> BookResult<Vec<Book>> {
    let samples = [
        (
            "Clean Code",
            "Robert C. Martin",
            "978-0132350884",
            datetime!(2008-08-01 0:00 UTC),
            464,
        ),
        (
            "The Pragmatic Programmer",
            "Dave Thomas and Andy Hunt",
            "978-0201616224",
            datetime!(1999-10-20 0:00 UTC),
            352,
        ),
        (
            "Design Patterns",
            "Gang of Four",
            "978-0201633610",
            datetime!(1994-10-31 0:00 UTC),
            395,
        ),
    ];

    tracing::info!(count = samples.len(), "seeding sample data");

    let mut created = Vec::with_capacity(samples.len());
    for (title, author, isbn, published, pages) in samples {
        created.push(
            service
                .create_book(title, author, isbn, published, pages, cancel)
                .await?,
        );
    }

    tracing::info!("sample data seeded");
    Ok(created)
}
