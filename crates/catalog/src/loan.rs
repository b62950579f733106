use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use libris_core::{BookId, Entity, LoanId, UserId};

/// A dated record that a book is (or was) in the custody of a user.
///
/// Once returned, a loan is never modified again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    id: LoanId,
    book_id: BookId,
    user_id: UserId,
    issued_at: DateTime<Utc>,
    due_at: DateTime<Utc>,
    returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    pub(crate) fn open(
        id: LoanId,
        book_id: BookId,
        user_id: UserId,
        issued_at: DateTime<Utc>,
        due_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            book_id,
            user_id,
            issued_at,
            due_at,
            returned_at: None,
        }
    }

    pub fn id_typed(&self) -> LoanId {
        self.id
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        self.returned_at
    }

    pub fn is_returned(&self) -> bool {
        self.returned_at.is_some()
    }

    /// Open loan for `book_id`.
    pub fn is_open_for(&self, book_id: BookId) -> bool {
        !self.is_returned() && self.book_id == book_id
    }

    /// Open and past its due date at `at`.
    pub fn is_overdue(&self, at: DateTime<Utc>) -> bool {
        !self.is_returned() && at > self.due_at
    }

    /// Close the loan. A closed loan keeps its first return time.
    pub(crate) fn close(&mut self, at: DateTime<Utc>) {
        if self.returned_at.is_none() {
            self.returned_at = Some(at);
        }
    }
}

impl Entity for Loan {
    type Id = LoanId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
