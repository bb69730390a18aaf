//! Loan model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::User;

/// A book copy lent to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    /// `None` while the copy is still out
    pub return_date: Option<DateTime<Utc>>,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.due_date < now
    }
}

/// Create loan request
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoan {
    /// Borrower; defaults to the caller
    pub user_id: Option<i32>,
    pub book_id: i32,
    /// Defaults to now
    pub loan_date: Option<DateTime<Utc>>,
    pub due_date: DateTime<Utc>,
}

/// Update loan request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLoan {
    pub due_date: Option<DateTime<Utc>>,
    /// Setting this closes the loan
    pub return_date: Option<DateTime<Utc>>,
}

/// Return loan request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnLoan {
    /// Defaults to now
    pub return_date: Option<DateTime<Utc>>,
}

/// Loan list filter applied by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanScope {
    All,
    Borrower(i32),
}

impl LoanScope {
    /// Privileged roles see every loan, everyone else only their own
    pub fn for_caller(caller: &User) -> Self {
        if caller.role.is_privileged() {
            LoanScope::All
        } else {
            LoanScope::Borrower(caller.id)
        }
    }

    pub fn includes(&self, loan: &Loan) -> bool {
        match self {
            LoanScope::All => true,
            LoanScope::Borrower(user_id) => loan.user_id == *user_id,
        }
    }
}
