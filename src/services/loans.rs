//! Loan management service

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{CreateLoan, Loan, LoanScope, UpdateLoan},
        role::Action,
        user::User,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Loans the caller may see: everything for privileged roles, otherwise
    /// only their own
    pub async fn list_loans(&self, caller: &User) -> Vec<Loan> {
        self.repository.loans.list(LoanScope::for_caller(caller)).await
    }

    pub async fn get_loan(&self, caller: &User, id: i32) -> AppResult<Loan> {
        let loan = self.repository.loans.get_by_id(id).await?;
        ensure_owner_or(caller, &loan, Action::ReadAllLoans)?;
        Ok(loan)
    }

    /// Borrow a book. Lending on behalf of someone else needs `LendToOthers`.
    pub async fn create_loan(&self, caller: &User, loan: CreateLoan) -> AppResult<Loan> {
        let borrower = loan.user_id.unwrap_or(caller.id);
        if borrower != caller.id {
            caller.require(Action::LendToOthers)?;
        }

        let loan_date = loan.loan_date.unwrap_or_else(Utc::now);
        let created = self
            .repository
            .loans
            .create(borrower, loan.book_id, loan_date, loan.due_date)
            .await?;

        tracing::info!(
            "Loan {} issued: book {} to user {} (by {})",
            created.id,
            created.book_id,
            created.user_id,
            caller.username
        );
        Ok(created)
    }

    /// Edit a loan (librarian operation)
    pub async fn update_loan(&self, id: i32, update: UpdateLoan) -> AppResult<Loan> {
        let updated = self.repository.loans.update(id, &update).await?;
        if update.return_date.is_some() {
            tracing::info!("Loan {} returned: book {}", updated.id, updated.book_id);
        }
        Ok(updated)
    }

    /// Return a loan; borrowers may close their own loans
    pub async fn return_loan(
        &self,
        caller: &User,
        id: i32,
        return_date: Option<chrono::DateTime<Utc>>,
    ) -> AppResult<Loan> {
        let loan = self.repository.loans.get_by_id(id).await?;
        ensure_owner_or(caller, &loan, Action::ManageLoans)?;

        let returned = self
            .repository
            .loans
            .return_loan(id, return_date.unwrap_or_else(Utc::now))
            .await?;
        tracing::info!("Loan {} returned: book {}", returned.id, returned.book_id);
        Ok(returned)
    }
}

fn ensure_owner_or(caller: &User, loan: &Loan, action: Action) -> AppResult<()> {
    if loan.user_id == caller.id {
        return Ok(());
    }
    caller.require(action).map_err(|_| {
        AppError::Authorization(format!("Loan {} belongs to another user", loan.id))
    })
}
