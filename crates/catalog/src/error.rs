//! Library-specific failures.

use libris_core::{BookId, DomainError, UserId};
use thiserror::Error;

/// Result type used by the catalog.
pub type LibraryResult<T> = Result<T, LibraryError>;

/// Every way a library operation can be rejected.
///
/// Messages carry the identifying context (title, id, email) available at
/// the point of failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LibraryError {
    #[error("missing required fields: {0}")]
    MissingFields(&'static str),

    #[error("page count must be positive (got {0})")]
    InvalidPages(i32),

    #[error("invalid email '{0}'")]
    InvalidEmail(String),

    #[error("a book with ISBN '{0}' already exists")]
    DuplicateIsbn(String),

    #[error("a user with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("no book with id {0}")]
    BookNotFound(BookId),

    #[error("no user with id {0}")]
    UserNotFound(UserId),

    #[error("no active loan for book '{0}'")]
    NoActiveLoan(String),

    #[error("book '{0}' is already on loan")]
    AlreadyOnLoan(String),

    #[error("book '{0}' is not on loan")]
    NotOnLoan(String),

    #[error("book '{0}' cannot be lent")]
    BookNotLendable(String),

    #[error("user '{0}' is not eligible to borrow")]
    UserNotEligible(String),

    #[error("book '{0}' is not valid")]
    InvalidBook(String),

    #[error("timestamp {0} is out of range for this operation")]
    InvalidTimestamp(String),

    #[error("library lock poisoned")]
    LockPoisoned,
}

impl From<LibraryError> for DomainError {
    fn from(err: LibraryError) -> Self {
        let msg = err.to_string();
        match err {
            LibraryError::MissingFields(_)
            | LibraryError::InvalidPages(_)
            | LibraryError::InvalidEmail(_)
            | LibraryError::InvalidTimestamp(_) => DomainError::validation(msg),
            LibraryError::DuplicateIsbn(_)
            | LibraryError::DuplicateEmail(_)
            | LibraryError::AlreadyOnLoan(_)
            | LibraryError::NotOnLoan(_)
            | LibraryError::BookNotLendable(_)
            | LibraryError::UserNotEligible(_) => DomainError::conflict(msg),
            LibraryError::BookNotFound(_)
            | LibraryError::UserNotFound(_)
            | LibraryError::NoActiveLoan(_) => DomainError::not_found(msg),
            LibraryError::InvalidBook(_) | LibraryError::LockPoisoned => {
                DomainError::invariant(msg)
            }
        }
    }
}
