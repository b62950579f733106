//! Strongly-typed identifiers used across the domain.
//!
//! Books, users and loans draw their identifiers from one shared
//! [`IdSequence`], so identifiers are unique across all three kinds but not
//! contiguous within a kind.

use serde::{Deserialize, Serialize};

/// Identifier of a catalog book.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(u64);

/// Identifier of a registered borrower.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

/// Identifier of a loan record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(u64);

macro_rules! impl_sequence_newtype {
    ($t:ty) => {
        impl $t {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<u64> for $t {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for u64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

impl_sequence_newtype!(BookId);
impl_sequence_newtype!(UserId);
impl_sequence_newtype!(LoanId);

/// Monotonic identifier source shared by every entity kind of one aggregate.
///
/// Starts at 1. `peek` is used while deciding, `advance` while applying, so
/// a rejected command never consumes an identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSequence {
    next: u64,
}

impl Default for IdSequence {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// The identifier the next created entity will receive.
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Move past `issued`. Never moves backwards.
    pub fn advance(&mut self, issued: u64) {
        self.next = self.next.max(issued.saturating_add(1));
    }
}
