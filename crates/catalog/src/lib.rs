//! Library catalog domain module (command/event driven).
//!
//! Books, users and loans owned by one [`Library`] aggregate, implemented as
//! deterministic domain logic (no IO, no storage).

pub mod book;
pub mod error;
pub mod library;
pub mod loan;
pub mod policy;
pub mod shared;
pub mod statistics;
pub mod user;


pub use book::{Availability, Book};
pub use error::{LibraryError, LibraryResult};
pub use library::{
    ActivateUser, AddBook, BookAdded, BookInfoUpdated, DeactivateUser, IssueLoan, Library,
    LibraryCommand, LibraryEvent, LoanIssued, LoanReturned, RegisterUser, ReturnLoan,
    UpdateBookInfo, UpdateUserContact, UserActivated, UserContactUpdated, UserDeactivated,
    UserRegistered,
};
pub use loan::Loan;
pub use policy::LibraryPolicy;
pub use shared::SharedLibrary;
pub use statistics::LibraryStatistics;
pub use user::User;

pub use libris_core::{BookId, LoanId, UserId};
