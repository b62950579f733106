use serde::{Deserialize, Serialize};

use libris_core::{BookId, Entity};

use crate::error::{LibraryError, LibraryResult};
use crate::policy::DEFAULT_LARGE_BOOK_PAGES;

/// Availability of a catalog book.
///
/// ```text
///            borrow (lendable)
///  Available ─────────────────▶ OnLoan
///            ◀─────────────────
///                 return
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Available,
    OnLoan,
}

impl core::fmt::Display for Availability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Available => f.write_str("Available"),
            Self::OnLoan => f.write_str("On loan"),
        }
    }
}

/// Entity: a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    id: BookId,
    title: String,
    author: String,
    isbn: String,
    pages: i32,
    on_loan: bool,
}

impl Book {
    /// A new, available book. Performs no validation.
    pub fn new(
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        pages: i32,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            pages,
            on_loan: false,
        }
    }

    pub fn id_typed(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Empty means "unspecified".
    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn pages(&self) -> i32 {
        self.pages
    }

    pub fn is_on_loan(&self) -> bool {
        self.on_loan
    }

    pub fn availability(&self) -> Availability {
        if self.on_loan {
            Availability::OnLoan
        } else {
            Availability::Available
        }
    }

    /// `[<id>] <title> by <author> - <availability>`
    pub fn info(&self) -> String {
        format!(
            "[{}] {} by {} - {}",
            self.id,
            self.title,
            self.author,
            self.availability()
        )
    }

    /// Not on loan and has a positive page count.
    pub fn is_lendable(&self) -> bool {
        !self.on_loan && self.pages > 0
    }

    /// More pages than the default threshold. Ignores any library policy;
    /// see `Library::is_large` for the configured check.
    pub fn is_large(&self) -> bool {
        self.is_larger_than(DEFAULT_LARGE_BOOK_PAGES)
    }

    pub fn is_larger_than(&self, threshold: i32) -> bool {
        self.pages > threshold
    }

    /// Whether a non-empty `isbn` collides with this book's ISBN.
    pub(crate) fn has_isbn(&self, isbn: &str) -> bool {
        !isbn.is_empty() && self.isbn == isbn
    }

    pub fn borrow(&mut self) -> LibraryResult<()> {
        if self.on_loan {
            return Err(LibraryError::AlreadyOnLoan(self.title.clone()));
        }
        if self.pages <= 0 {
            return Err(LibraryError::InvalidBook(self.title.clone()));
        }
        self.on_loan = true;
        Ok(())
    }

    pub fn return_book(&mut self) -> LibraryResult<()> {
        if !self.on_loan {
            return Err(LibraryError::NotOnLoan(self.title.clone()));
        }
        self.on_loan = false;
        Ok(())
    }

    /// Replace title, author and page count.
    pub fn update_info(
        &mut self,
        title: impl Into<String>,
        author: impl Into<String>,
        pages: i32,
    ) -> LibraryResult<()> {
        let (title, author) = (title.into(), author.into());
        Self::validate_info(&title, &author, pages)?;
        self.replace_info(title, author, pages);
        Ok(())
    }

    pub(crate) fn replace_info(&mut self, title: String, author: String, pages: i32) {
        self.title = title;
        self.author = author;
        self.pages = pages;
    }

    pub(crate) fn validate_info(title: &str, author: &str, pages: i32) -> LibraryResult<()> {
        if title.is_empty() || author.is_empty() {
            return Err(LibraryError::MissingFields("title and author"));
        }
        if pages <= 0 {
            return Err(LibraryError::InvalidPages(pages));
        }
        Ok(())
    }

    // Only the aggregate's `apply` flips this; it has already validated.
    pub(crate) fn set_on_loan(&mut self, on_loan: bool) {
        self.on_loan = on_loan;
    }
}

impl Entity for Book {
    type Id = BookId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl core::fmt::Display for Book {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.info())
    }
}
