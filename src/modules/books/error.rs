use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub type BookResult<T> = Result<T, BookError>;

/// Failure kinds surfaced by the book entity, repository and service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    /// Malformed input such as a blank title or a non-positive page count.
    #[error("invalid {field}: {message}")]
    InvalidArgument {
        field: &'static str,
        message: String,
    },

    /// Status transition not allowed from the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("book {0} not found")]
    NotFound(Uuid),

    #[error("book {0} already exists")]
    AlreadyExists(Uuid),

    /// The caller gave up before anything was changed.
    #[error("operation cancelled")]
    Cancelled,
}

impl BookError {
    pub fn invalid_argument(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            message: message.into(),
        }
    }
}

/// Fails with [`BookError::Cancelled`] once `cancel` has fired.
pub fn ensure_not_cancelled(cancel: &CancellationToken) -> BookResult<()> {
    if cancel.is_cancelled() {
        Err(BookError::Cancelled)
    } else {
        Ok(())
    }
}
