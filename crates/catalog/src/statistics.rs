use serde::{Deserialize, Serialize};

use libris_core::ValueObject;

/// Point-in-time counts for one library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStatistics {
    pub name: String,
    pub total_books: usize,
    pub books_on_loan: usize,
    pub available_books: usize,
    pub active_users: usize,
    pub active_loans: usize,
}

impl ValueObject for LibraryStatistics {}

impl core::fmt::Display for LibraryStatistics {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Statistics for {}:", self.name)?;
        writeln!(f, "  Total books: {}", self.total_books)?;
        writeln!(f, "  Books on loan: {}", self.books_on_loan)?;
        writeln!(f, "  Available books: {}", self.available_books)?;
        writeln!(f, "  Active users: {}", self.active_users)?;
        write!(f, "  Active loans: {}", self.active_loans)
    }
}
