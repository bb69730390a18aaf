//! Data models for the lending server

pub mod book;
pub mod loan;
pub mod role;
pub mod user;

// Re-export commonly used types
pub use book::Book;
pub use loan::{Loan, LoanScope};
pub use role::{Action, Role};
pub use user::User;
