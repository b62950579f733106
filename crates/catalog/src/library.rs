use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use libris_core::{Aggregate, AggregateRoot, BookId, Entity, IdSequence, LoanId, UserId};
use libris_events::{Event, EventEnvelope};

use crate::book::Book;
use crate::error::{LibraryError, LibraryResult};
use crate::loan::Loan;
use crate::policy::LibraryPolicy;
use crate::statistics::LibraryStatistics;
use crate::user::{User, validate_email};

/// Stream name used for journal envelopes.
pub const AGGREGATE_TYPE: &str = "library";

/// Aggregate root: Library.
///
/// Owns every book, user and loan of one in-memory catalog. Identifiers for
/// all three kinds come from one shared sequence starting at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    name: String,
    address: String,
    books: Vec<Book>,
    users: Vec<User>,
    loans: Vec<Loan>,
    ids: IdSequence,
    policy: LibraryPolicy,
    version: u64,
    journal: Vec<EventEnvelope<LibraryEvent>>,
}

impl AggregateRoot for Library {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.name
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: AddBook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub pages: i32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RegisterUser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: IssueLoan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLoan {
    pub book_id: BookId,
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReturnLoan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLoan {
    pub book_id: BookId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateBookInfo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBookInfo {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub pages: i32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ActivateUser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateUser {
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeactivateUser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivateUser {
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateUserContact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUserContact {
    pub user_id: UserId,
    pub email: String,
    pub phone: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LibraryCommand {
    AddBook(AddBook),
    RegisterUser(RegisterUser),
    IssueLoan(IssueLoan),
    ReturnLoan(ReturnLoan),
    UpdateBookInfo(UpdateBookInfo),
    ActivateUser(ActivateUser),
    DeactivateUser(DeactivateUser),
    UpdateUserContact(UpdateUserContact),
}

impl LibraryCommand {
    pub fn name(&self) -> &'static str {
        match self {
            LibraryCommand::AddBook(_) => "add_book",
            LibraryCommand::RegisterUser(_) => "register_user",
            LibraryCommand::IssueLoan(_) => "issue_loan",
            LibraryCommand::ReturnLoan(_) => "return_loan",
            LibraryCommand::UpdateBookInfo(_) => "update_book_info",
            LibraryCommand::ActivateUser(_) => "activate_user",
            LibraryCommand::DeactivateUser(_) => "deactivate_user",
            LibraryCommand::UpdateUserContact(_) => "update_user_contact",
        }
    }
}

/// Event: BookAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookAdded {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub pages: i32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: UserRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegistered {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LoanIssued. The book goes on loan in the same step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanIssued {
    pub loan_id: LoanId,
    pub book_id: BookId,
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

/// Event: LoanReturned. The book becomes available in the same step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanReturned {
    pub loan_id: LoanId,
    pub book_id: BookId,
    pub returned_at: DateTime<Utc>,
}

/// Event: BookInfoUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInfoUpdated {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub pages: i32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: UserActivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActivated {
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: UserDeactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDeactivated {
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: UserContactUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContactUpdated {
    pub user_id: UserId,
    pub email: String,
    pub phone: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LibraryEvent {
    BookAdded(BookAdded),
    UserRegistered(UserRegistered),
    LoanIssued(LoanIssued),
    LoanReturned(LoanReturned),
    BookInfoUpdated(BookInfoUpdated),
    UserActivated(UserActivated),
    UserDeactivated(UserDeactivated),
    UserContactUpdated(UserContactUpdated),
}

impl Event for LibraryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LibraryEvent::BookAdded(_) => "library.book.added",
            LibraryEvent::UserRegistered(_) => "library.user.registered",
            LibraryEvent::LoanIssued(_) => "library.loan.issued",
            LibraryEvent::LoanReturned(_) => "library.loan.returned",
            LibraryEvent::BookInfoUpdated(_) => "library.book.info_updated",
            LibraryEvent::UserActivated(_) => "library.user.activated",
            LibraryEvent::UserDeactivated(_) => "library.user.deactivated",
            LibraryEvent::UserContactUpdated(_) => "library.user.contact_updated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LibraryEvent::BookAdded(e) => e.occurred_at,
            LibraryEvent::UserRegistered(e) => e.occurred_at,
            LibraryEvent::LoanIssued(e) => e.issued_at,
            LibraryEvent::LoanReturned(e) => e.returned_at,
            LibraryEvent::BookInfoUpdated(e) => e.occurred_at,
            LibraryEvent::UserActivated(e) => e.occurred_at,
            LibraryEvent::UserDeactivated(e) => e.occurred_at,
            LibraryEvent::UserContactUpdated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Library {
    type Command = LibraryCommand;
    type Event = LibraryEvent;
    type Error = LibraryError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LibraryEvent::BookAdded(e) => {
                self.books.push(Book::new(
                    e.book_id,
                    e.title.clone(),
                    e.author.clone(),
                    e.isbn.clone(),
                    e.pages,
                ));
                self.ids.advance(e.book_id.get());
            }
            LibraryEvent::UserRegistered(e) => {
                self.users.push(User::new(
                    e.user_id,
                    e.name.clone(),
                    e.email.clone(),
                    e.phone.clone(),
                ));
                self.ids.advance(e.user_id.get());
            }
            LibraryEvent::LoanIssued(e) => {
                self.loans.push(Loan::open(
                    e.loan_id,
                    e.book_id,
                    e.user_id,
                    e.issued_at,
                    e.due_at,
                ));
                if let Some(book) = self.find_book_mut(e.book_id) {
                    book.set_on_loan(true);
                }
                self.ids.advance(e.loan_id.get());
            }
            LibraryEvent::LoanReturned(e) => {
                if let Some(loan) = self.loans.iter_mut().find(|l| l.has_id(e.loan_id)) {
                    loan.close(e.returned_at);
                }
                if let Some(book) = self.find_book_mut(e.book_id) {
                    book.set_on_loan(false);
                }
            }
            LibraryEvent::BookInfoUpdated(e) => {
                if let Some(book) = self.find_book_mut(e.book_id) {
                    book.replace_info(e.title.clone(), e.author.clone(), e.pages);
                }
            }
            LibraryEvent::UserActivated(e) => {
                if let Some(user) = self.find_user_mut(e.user_id) {
                    user.activate();
                }
            }
            LibraryEvent::UserDeactivated(e) => {
                if let Some(user) = self.find_user_mut(e.user_id) {
                    user.deactivate();
                }
            }
            LibraryEvent::UserContactUpdated(e) => {
                if let Some(user) = self.find_user_mut(e.user_id) {
                    user.replace_contact(e.email.clone(), e.phone.clone());
                }
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LibraryCommand::AddBook(cmd) => self.handle_add_book(cmd),
            LibraryCommand::RegisterUser(cmd) => self.handle_register_user(cmd),
            LibraryCommand::IssueLoan(cmd) => self.handle_issue_loan(cmd),
            LibraryCommand::ReturnLoan(cmd) => self.handle_return_loan(cmd),
            LibraryCommand::UpdateBookInfo(cmd) => self.handle_update_book_info(cmd),
            LibraryCommand::ActivateUser(cmd) => {
                self.require_user(cmd.user_id)?;
                Ok(vec![LibraryEvent::UserActivated(UserActivated {
                    user_id: cmd.user_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
            LibraryCommand::DeactivateUser(cmd) => {
                self.require_user(cmd.user_id)?;
                Ok(vec![LibraryEvent::UserDeactivated(UserDeactivated {
                    user_id: cmd.user_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
            LibraryCommand::UpdateUserContact(cmd) => self.handle_update_user_contact(cmd),
        }
    }
}

impl Library {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self::with_policy(name, address, LibraryPolicy::default())
    }

    pub fn with_policy(
        name: impl Into<String>,
        address: impl Into<String>,
        policy: LibraryPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            books: Vec::new(),
            users: Vec::new(),
            loans: Vec::new(),
            ids: IdSequence::new(),
            policy,
            version: 0,
            journal: Vec::new(),
        }
    }

    /// Rebuild state by applying previously recorded events in order.
    ///
    /// The rebuilt library starts with an empty journal.
    pub fn from_events<'a>(
        name: impl Into<String>,
        address: impl Into<String>,
        policy: LibraryPolicy,
        events: impl IntoIterator<Item = &'a LibraryEvent>,
    ) -> Self {
        let mut library = Self::with_policy(name, address, policy);
        for event in events {
            library.apply(event);
        }
        library
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn policy(&self) -> &LibraryPolicy {
        &self.policy
    }

    /// Identifier the next created book, user or loan will receive.
    pub fn next_id(&self) -> u64 {
        self.ids.peek()
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    /// Every event produced by a successful command, in order.
    pub fn journal(&self) -> &[EventEnvelope<LibraryEvent>] {
        &self.journal
    }

    /// Decide, apply and journal a command.
    ///
    /// A rejected command leaves the library untouched.
    pub fn dispatch(&mut self, command: &LibraryCommand) -> LibraryResult<Vec<LibraryEvent>> {
        let events = match self.execute(command) {
            Ok(events) => events,
            Err(err) => {
                tracing::debug!(command = command.name(), error = %err, "command rejected");
                return Err(err);
            }
        };

        for event in &events {
            self.record(event);
        }
        Ok(events)
    }

    fn record(&mut self, event: &LibraryEvent) {
        match event {
            LibraryEvent::BookAdded(e) if e.pages <= 0 => {
                tracing::warn!(book_id = %e.book_id, pages = e.pages, "book added with non-positive page count; it cannot be lent");
            }
            LibraryEvent::BookAdded(e) => {
                tracing::info!(book_id = %e.book_id, title = %e.title, "book added");
            }
            LibraryEvent::UserRegistered(e) => {
                tracing::info!(user_id = %e.user_id, email = %e.email, "user registered");
            }
            LibraryEvent::LoanIssued(e) => {
                tracing::info!(loan_id = %e.loan_id, book_id = %e.book_id, user_id = %e.user_id, due_at = %e.due_at, "loan issued");
            }
            LibraryEvent::LoanReturned(e) => {
                tracing::info!(loan_id = %e.loan_id, book_id = %e.book_id, "loan returned");
            }
            other => tracing::debug!(event = %other.schema_key(), "event applied"),
        }

        let sequence_number = self.journal.len() as u64 + 1;
        self.journal
            .push(EventEnvelope::seal(AGGREGATE_TYPE, sequence_number, event.clone()));
    }

    pub fn add_book(
        &mut self,
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        pages: i32,
    ) -> LibraryResult<&Book> {
        let book_id = BookId::new(self.next_id());
        self.dispatch(&LibraryCommand::AddBook(AddBook {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            pages,
            occurred_at: Utc::now(),
        }))?;
        self.require_book(book_id)
    }

    /// New users are always active.
    pub fn register_user(
        &mut self,
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> LibraryResult<&User> {
        let user_id = UserId::new(self.next_id());
        self.dispatch(&LibraryCommand::RegisterUser(RegisterUser {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            occurred_at: Utc::now(),
        }))?;
        self.require_user(user_id)
    }

    /// Lend a book: creates the loan and marks the book on loan together.
    pub fn issue_loan(&mut self, book_id: BookId, user_id: UserId) -> LibraryResult<&Loan> {
        let loan_id = LoanId::new(self.next_id());
        self.dispatch(&LibraryCommand::IssueLoan(IssueLoan {
            book_id,
            user_id,
            occurred_at: Utc::now(),
        }))?;
        self.find_loan(loan_id)
            .ok_or(LibraryError::BookNotFound(book_id))
    }

    /// Close the open loan for `book_id` and make the book available again.
    pub fn return_loan(&mut self, book_id: BookId) -> LibraryResult<&Loan> {
        let events = self.dispatch(&LibraryCommand::ReturnLoan(ReturnLoan {
            book_id,
            occurred_at: Utc::now(),
        }))?;

        events
            .iter()
            .find_map(|e| match e {
                LibraryEvent::LoanReturned(e) => Some(e.loan_id),
                _ => None,
            })
            .and_then(|loan_id| self.find_loan(loan_id))
            .ok_or(LibraryError::BookNotFound(book_id))
    }

    pub fn update_book_info(
        &mut self,
        book_id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        pages: i32,
    ) -> LibraryResult<()> {
        self.dispatch(&LibraryCommand::UpdateBookInfo(UpdateBookInfo {
            book_id,
            title: title.into(),
            author: author.into(),
            pages,
            occurred_at: Utc::now(),
        }))
        .map(drop)
    }

    pub fn activate_user(&mut self, user_id: UserId) -> LibraryResult<()> {
        self.dispatch(&LibraryCommand::ActivateUser(ActivateUser {
            user_id,
            occurred_at: Utc::now(),
        }))
        .map(drop)
    }

    pub fn deactivate_user(&mut self, user_id: UserId) -> LibraryResult<()> {
        self.dispatch(&LibraryCommand::DeactivateUser(DeactivateUser {
            user_id,
            occurred_at: Utc::now(),
        }))
        .map(drop)
    }

    pub fn update_user_contact(
        &mut self,
        user_id: UserId,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> LibraryResult<()> {
        self.dispatch(&LibraryCommand::UpdateUserContact(UpdateUserContact {
            user_id,
            email: email.into(),
            phone: phone.into(),
            occurred_at: Utc::now(),
        }))
        .map(drop)
    }

    /// First book with `id`, in insertion order.
    pub fn find_book(&self, id: BookId) -> Option<&Book> {
        self.books.iter().find(|b| b.has_id(id))
    }

    /// Live handle: changes made through it are visible in the library.
    ///
    /// Borrow/return through this handle bypass the loan ledger.
    pub fn find_book_mut(&mut self, id: BookId) -> Option<&mut Book> {
        self.books.iter_mut().find(|b| b.has_id(id))
    }

    pub fn find_user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.has_id(id))
    }

    /// Live handle: changes made through it are visible in the library.
    pub fn find_user_mut(&mut self, id: UserId) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.has_id(id))
    }

    pub fn find_loan(&self, id: LoanId) -> Option<&Loan> {
        self.loans.iter().find(|l| l.has_id(id))
    }

    pub fn open_loan_for(&self, book_id: BookId) -> Option<&Loan> {
        self.loans.iter().find(|l| l.is_open_for(book_id))
    }

    pub fn loans_for_user(&self, user_id: UserId) -> impl Iterator<Item = &Loan> + '_ {
        self.loans.iter().filter(move |l| l.user_id() == user_id)
    }

    pub fn overdue_loans(&self, at: DateTime<Utc>) -> impl Iterator<Item = &Loan> + '_ {
        self.loans.iter().filter(move |l| l.is_overdue(at))
    }

    pub fn available_books(&self) -> impl Iterator<Item = &Book> + '_ {
        self.books.iter().filter(|b| !b.is_on_loan())
    }

    /// Whether `book` counts as extensive under this library's policy.
    pub fn is_large(&self, book: &Book) -> bool {
        book.is_larger_than(self.policy.large_book_pages)
    }

    /// One info line per available book, each large book followed by a note.
    pub fn list_available(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for book in self.available_books() {
            lines.push(book.info());
            if self.is_large(book) {
                lines.push(format!("    Extensive book ({} pages)", book.pages()));
            }
        }
        lines
    }

    pub fn statistics(&self) -> LibraryStatistics {
        let total_books = self.books.len();
        let books_on_loan = self.books.iter().filter(|b| b.is_on_loan()).count();
        let active_users = self.users.iter().filter(|u| u.is_active()).count();
        let active_loans = self.loans.iter().filter(|l| !l.is_returned()).count();

        LibraryStatistics {
            name: self.name.clone(),
            total_books,
            books_on_loan,
            available_books: total_books - books_on_loan,
            active_users,
            active_loans,
        }
    }
}

impl Library {
    fn require_book(&self, id: BookId) -> LibraryResult<&Book> {
        self.find_book(id).ok_or(LibraryError::BookNotFound(id))
    }

    fn require_user(&self, id: UserId) -> LibraryResult<&User> {
        self.find_user(id).ok_or(LibraryError::UserNotFound(id))
    }

    fn handle_add_book(&self, cmd: &AddBook) -> LibraryResult<Vec<LibraryEvent>> {
        if cmd.title.is_empty() || cmd.author.is_empty() {
            return Err(LibraryError::MissingFields("title and author"));
        }
        if self.books.iter().any(|b| b.has_isbn(&cmd.isbn)) {
            return Err(LibraryError::DuplicateIsbn(cmd.isbn.clone()));
        }

        Ok(vec![LibraryEvent::BookAdded(BookAdded {
            book_id: BookId::new(self.ids.peek()),
            title: cmd.title.clone(),
            author: cmd.author.clone(),
            isbn: cmd.isbn.clone(),
            pages: cmd.pages,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_register_user(&self, cmd: &RegisterUser) -> LibraryResult<Vec<LibraryEvent>> {
        if cmd.name.is_empty() || cmd.email.is_empty() {
            return Err(LibraryError::MissingFields("name and email"));
        }
        validate_email(&cmd.email)?;
        if self.users.iter().any(|u| u.email() == cmd.email) {
            return Err(LibraryError::DuplicateEmail(cmd.email.clone()));
        }

        Ok(vec![LibraryEvent::UserRegistered(UserRegistered {
            user_id: UserId::new(self.ids.peek()),
            name: cmd.name.clone(),
            email: cmd.email.clone(),
            phone: cmd.phone.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_issue_loan(&self, cmd: &IssueLoan) -> LibraryResult<Vec<LibraryEvent>> {
        let book = self.require_book(cmd.book_id)?;
        let user = self.require_user(cmd.user_id)?;

        if !user.may_borrow() {
            return Err(LibraryError::UserNotEligible(user.name().to_string()));
        }
        if !book.is_lendable() {
            return Err(LibraryError::BookNotLendable(book.title().to_string()));
        }

        let due_at = cmd
            .occurred_at
            .checked_add_signed(self.policy.loan_period())
            .ok_or_else(|| LibraryError::InvalidTimestamp(cmd.occurred_at.to_string()))?;

        Ok(vec![LibraryEvent::LoanIssued(LoanIssued {
            loan_id: LoanId::new(self.ids.peek()),
            book_id: cmd.book_id,
            user_id: cmd.user_id,
            issued_at: cmd.occurred_at,
            due_at,
        })])
    }

    fn handle_return_loan(&self, cmd: &ReturnLoan) -> LibraryResult<Vec<LibraryEvent>> {
        let book = self.require_book(cmd.book_id)?;
        let loan = self
            .open_loan_for(cmd.book_id)
            .ok_or_else(|| LibraryError::NoActiveLoan(book.title().to_string()))?;

        // Only reachable when the flag was reset through a live handle.
        if !book.is_on_loan() {
            return Err(LibraryError::NotOnLoan(book.title().to_string()));
        }

        Ok(vec![LibraryEvent::LoanReturned(LoanReturned {
            loan_id: loan.id_typed(),
            book_id: cmd.book_id,
            returned_at: cmd.occurred_at,
        })])
    }

    fn handle_update_book_info(&self, cmd: &UpdateBookInfo) -> LibraryResult<Vec<LibraryEvent>> {
        self.require_book(cmd.book_id)?;
        Book::validate_info(&cmd.title, &cmd.author, cmd.pages)?;

        Ok(vec![LibraryEvent::BookInfoUpdated(BookInfoUpdated {
            book_id: cmd.book_id,
            title: cmd.title.clone(),
            author: cmd.author.clone(),
            pages: cmd.pages,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_user_contact(
        &self,
        cmd: &UpdateUserContact,
    ) -> LibraryResult<Vec<LibraryEvent>> {
        self.require_user(cmd.user_id)?;
        validate_email(&cmd.email)?;
        if self
            .users
            .iter()
            .any(|u| !u.has_id(cmd.user_id) && u.email() == cmd.email)
        {
            return Err(LibraryError::DuplicateEmail(cmd.email.clone()));
        }

        Ok(vec![LibraryEvent::UserContactUpdated(UserContactUpdated {
            user_id: cmd.user_id,
            email: cmd.email.clone(),
            phone: cmd.phone.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn stocked_library() -> (Library, BookId, UserId) {
        let mut library = Library::new("Central", "Main Ave 123");
        let book_id = library
            .add_book("Clean Code", "Robert Martin", "978-0-13-235088-4", 464)
            .unwrap()
            .id_typed();
        let user_id = library
            .register_user("Maria", "maria@example.com", "+56 999")
            .unwrap()
            .id_typed();
        (library, book_id, user_id)
    }

    #[test]
    fn issue_loan_command_emits_loan_issued_with_due_date() {
        let (library, book_id, user_id) = stocked_library();
        let at = test_time();

        let events = library
            .handle(&LibraryCommand::IssueLoan(IssueLoan {
                book_id,
                user_id,
                occurred_at: at,
            }))
            .unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            LibraryEvent::LoanIssued(e) => {
                assert_eq!(e.loan_id, LoanId::new(3));
                assert_eq!(e.book_id, book_id);
                assert_eq!(e.user_id, user_id);
                assert_eq!(e.issued_at, at);
                assert_eq!(e.due_at, at + Duration::days(14));
            }
            _ => panic!("Expected LoanIssued event"),
        }
    }

    #[test]
    fn handle_does_not_mutate() {
        let (library, book_id, user_id) = stocked_library();
        let before = library.clone();
        library
            .handle(&LibraryCommand::IssueLoan(IssueLoan {
                book_id,
                user_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(library, before);
    }

    #[test]
    fn issue_loan_marks_book_on_loan() {
        let (mut library, book_id, user_id) = stocked_library();
        library.issue_loan(book_id, user_id).unwrap();

        assert!(library.find_book(book_id).unwrap().is_on_loan());
        assert_eq!(
            library.open_loan_for(book_id).unwrap().user_id(),
            user_id
        );
    }

    #[test]
    fn lending_a_book_twice_is_rejected() {
        let (mut library, book_id, user_id) = stocked_library();
        library.issue_loan(book_id, user_id).unwrap();

        let err = library.issue_loan(book_id, user_id).unwrap_err();
        assert_eq!(err, LibraryError::BookNotLendable("Clean Code".to_string()));
        assert_eq!(library.loans().len(), 1);
    }

    #[test]
    fn book_without_pages_is_not_lendable() {
        let mut library = Library::new("Central", "Main Ave 123");
        let book_id = library.add_book("Pamphlet", "Anon", "", 0).unwrap().id_typed();
        let user_id = library.register_user("A", "a@x", "").unwrap().id_typed();

        let err = library.issue_loan(book_id, user_id).unwrap_err();
        assert_eq!(err, LibraryError::BookNotLendable("Pamphlet".to_string()));
    }

    #[test]
    fn return_without_loan_is_rejected() {
        let (mut library, book_id, _) = stocked_library();
        let err = library.return_loan(book_id).unwrap_err();
        assert_eq!(err, LibraryError::NoActiveLoan("Clean Code".to_string()));
    }

    #[test]
    fn return_after_flag_reset_through_handle_reports_not_on_loan() {
        let (mut library, book_id, user_id) = stocked_library();
        library.issue_loan(book_id, user_id).unwrap();
        library
            .find_book_mut(book_id)
            .unwrap()
            .return_book()
            .unwrap();

        let err = library.return_loan(book_id).unwrap_err();
        assert_eq!(err, LibraryError::NotOnLoan("Clean Code".to_string()));
        assert!(library.open_loan_for(book_id).is_some());
    }

    #[test]
    fn live_handles_are_visible_in_library() {
        let (mut library, book_id, user_id) = stocked_library();
        library.find_user_mut(user_id).unwrap().deactivate();
        library
            .find_book_mut(book_id)
            .unwrap()
            .update_info("Clean Code 2nd", "Robert C. Martin", 480)
            .unwrap();

        assert!(!library.find_user(user_id).unwrap().is_active());
        assert_eq!(library.find_book(book_id).unwrap().title(), "Clean Code 2nd");
    }

    #[test]
    fn update_user_contact_rejects_email_of_other_user() {
        let (mut library, _, user_id) = stocked_library();
        library.register_user("Juan", "juan@example.com", "").unwrap();

        let err = library
            .update_user_contact(user_id, "juan@example.com", "1")
            .unwrap_err();
        assert_eq!(err, LibraryError::DuplicateEmail("juan@example.com".to_string()));

        // Re-submitting one's own email is fine.
        library
            .update_user_contact(user_id, "maria@example.com", "2")
            .unwrap();
        assert_eq!(library.find_user(user_id).unwrap().phone(), "2");
    }

    #[test]
    fn update_book_info_through_library_validates() {
        let (mut library, book_id, _) = stocked_library();
        assert_eq!(
            library.update_book_info(book_id, "T", "A", -1).unwrap_err(),
            LibraryError::InvalidPages(-1)
        );
        assert_eq!(
            library
                .update_book_info(BookId::new(42), "T", "A", 10)
                .unwrap_err(),
            LibraryError::BookNotFound(BookId::new(42))
        );

        library.update_book_info(book_id, "T", "A", 10).unwrap();
        assert_eq!(library.find_book(book_id).unwrap().pages(), 10);
    }

    #[test]
    fn activation_commands_require_known_user() {
        let (mut library, _, user_id) = stocked_library();
        assert_eq!(
            library.deactivate_user(UserId::new(77)).unwrap_err(),
            LibraryError::UserNotFound(UserId::new(77))
        );

        library.deactivate_user(user_id).unwrap();
        assert!(!library.find_user(user_id).unwrap().may_borrow());
        library.activate_user(user_id).unwrap();
        assert!(library.find_user(user_id).unwrap().may_borrow());
    }

    #[test]
    fn journal_records_successful_commands_only() {
        let (mut library, book_id, user_id) = stocked_library();
        let _ = library.add_book("Dup", "X", "978-0-13-235088-4", 10);
        library.issue_loan(book_id, user_id).unwrap();
        library.return_loan(book_id).unwrap();

        let types: Vec<&str> = library.journal().iter().map(|e| e.event_type()).collect();
        assert_eq!(
            types,
            vec![
                "library.book.added",
                "library.user.registered",
                "library.loan.issued",
                "library.loan.returned",
            ]
        );
        let sequence: Vec<u64> = library
            .journal()
            .iter()
            .map(|e| e.sequence_number())
            .collect();
        assert_eq!(sequence, vec![1, 2, 3, 4]);
        assert_eq!(library.version(), 4);
        assert!(library.journal().iter().all(|e| e.aggregate_type() == AGGREGATE_TYPE));
        assert_eq!(
            library.journal()[0].payload().schema_key(),
            "library.book.added/v1"
        );
    }

    #[test]
    fn replaying_journal_rebuilds_state() {
        let (mut library, book_id, user_id) = stocked_library();
        library.issue_loan(book_id, user_id).unwrap();
        library.add_book("Go Programming", "Alan Donovan", "", 380).unwrap();

        let events: Vec<LibraryEvent> = library
            .journal()
            .iter()
            .map(|e| e.payload().clone())
            .collect();
        let rebuilt = Library::from_events(
            library.name(),
            library.address(),
            library.policy().clone(),
            &events,
        );

        assert_eq!(rebuilt.books(), library.books());
        assert_eq!(rebuilt.users(), library.users());
        assert_eq!(rebuilt.loans(), library.loans());
        assert_eq!(rebuilt.next_id(), library.next_id());
        assert_eq!(rebuilt.version(), library.version());
        assert!(rebuilt.journal().is_empty());
    }

    #[test]
    fn overdue_loans_use_policy_period() {
        let policy = LibraryPolicy {
            loan_period_days: 7,
            ..LibraryPolicy::default()
        };
        let mut library = Library::with_policy("Branch", "Side St", policy);
        let book_id = library.add_book("T", "A", "", 100).unwrap().id_typed();
        let user_id = library.register_user("U", "u@x", "").unwrap().id_typed();
        let due_at = library.issue_loan(book_id, user_id).unwrap().due_at();

        assert_eq!(library.overdue_loans(due_at).count(), 0);
        assert_eq!(
            library.overdue_loans(due_at + Duration::hours(1)).count(),
            1
        );
        assert_eq!(library.loans_for_user(user_id).count(), 1);
    }

    #[test]
    fn list_available_flags_extensive_books() {
        let mut library = Library::new("Central", "Main Ave 123");
        library.add_book("El Quijote", "Cervantes", "1", 863).unwrap();
        let short = library.add_book("Short", "Someone", "2", 120).unwrap().id_typed();
        library.add_book("Clean Code", "Robert Martin", "3", 464).unwrap();
        let user_id = library.register_user("U", "u@x", "").unwrap().id_typed();
        library.issue_loan(BookId::new(3), user_id).unwrap();

        assert_eq!(
            library.list_available(),
            vec![
                "[1] El Quijote by Cervantes - Available".to_string(),
                "    Extensive book (863 pages)".to_string(),
                format!("[{short}] Short by Someone - Available"),
            ]
        );
    }

    #[test]
    fn issue_loan_at_end_of_time_is_rejected_without_loan() {
        let (mut library, book_id, user_id) = stocked_library();
        let before = library.clone();

        let err = library
            .dispatch(&LibraryCommand::IssueLoan(IssueLoan {
                book_id,
                user_id,
                occurred_at: DateTime::<Utc>::MAX_UTC,
            }))
            .unwrap_err();
        match err {
            LibraryError::InvalidTimestamp(_) => {}
            other => panic!("Expected InvalidTimestamp, got {other:?}"),
        }
        assert!(library.loans().is_empty());
        assert!(!library.find_book(book_id).unwrap().is_on_loan());
        assert_eq!(library, before);
    }

    #[test]
    fn large_book_check_follows_policy() {
        let policy = LibraryPolicy {
            large_book_pages: 500,
            ..LibraryPolicy::default()
        };
        let mut library = Library::with_policy("Branch", "Side St", policy);
        let id = library.add_book("Clean Code", "Robert Martin", "", 464).unwrap().id_typed();
        let book = library.find_book(id).unwrap();

        assert!(book.is_large());
        assert!(!library.is_large(book));
        assert_eq!(
            library.list_available(),
            vec![format!("[{id}] Clean Code by Robert Martin - Available")]
        );
    }

    #[test]
    fn empty_library_lists_nothing() {
        let library = Library::new("Empty", "Nowhere");
        assert!(library.list_available().is_empty());
        assert_eq!(library.next_id(), 1);
        assert_eq!(library.id(), "Empty");
    }
}
