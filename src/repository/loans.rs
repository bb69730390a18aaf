//! Loans repository
//!
//! Every operation that touches a book's `available` counter holds the write
//! lock for its whole duration, so the loan table and the counter always move
//! together.

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanScope, UpdateLoan},
};

use super::{Db, Tables};

#[derive(Clone)]
pub struct LoansRepository {
    db: Db,
}

impl LoansRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// List loans visible in the given scope, ordered by id
    pub async fn list(&self, scope: LoanScope) -> Vec<Loan> {
        self.db
            .read()
            .await
            .loans
            .values()
            .filter(|l| scope.includes(l))
            .cloned()
            .collect()
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        self.db
            .read()
            .await
            .loans
            .get(&id)
            .cloned()
            .ok_or_else(|| loan_not_found(id))
    }

    /// Issue a loan: takes one available copy of the book
    pub async fn create(
        &self,
        user_id: i32,
        book_id: i32,
        loan_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> AppResult<Loan> {
        let mut tables = self.db.write().await;

        if !tables.users.contains_key(&user_id) {
            return Err(AppError::Validation(format!("User with id {} does not exist", user_id)));
        }
        if due_date < loan_date {
            return Err(AppError::Validation("Due date cannot be before loan date".to_string()));
        }

        let book = tables
            .books
            .get_mut(&book_id)
            .ok_or_else(|| AppError::Validation(format!("Book with id {} does not exist", book_id)))?;
        if book.available <= 0 {
            return Err(AppError::Validation(format!("No copies of \"{}\" are available", book.title)));
        }
        book.available -= 1;

        let loan = Loan {
            id: tables.next_loan_id(),
            user_id,
            book_id,
            loan_date,
            due_date,
            return_date: None,
        };
        tables.loans.insert(loan.id, loan.clone());
        Ok(loan)
    }

    /// Close a loan and give the copy back to the shelf
    pub async fn return_loan(&self, id: i32, return_date: DateTime<Utc>) -> AppResult<Loan> {
        let mut tables = self.db.write().await;
        close_loan(&mut tables, id, return_date)
    }

    /// Edit a loan's due date and/or close it. Nothing changes if any part is
    /// rejected.
    pub async fn update(&self, id: i32, update: &UpdateLoan) -> AppResult<Loan> {
        let mut tables = self.db.write().await;

        let loan = tables.loans.get(&id).ok_or_else(|| loan_not_found(id))?;

        if let Some(due_date) = update.due_date {
            if !loan.is_active() {
                return Err(AppError::State(format!("Loan {} has already been returned", id)));
            }
            if due_date < loan.loan_date {
                return Err(AppError::Validation("Due date cannot be before loan date".to_string()));
            }
        }

        if let Some(return_date) = update.return_date {
            close_loan(&mut tables, id, return_date)?;
        }

        let loan = tables.loans.get_mut(&id).ok_or_else(|| loan_not_found(id))?;
        if let Some(due_date) = update.due_date {
            loan.due_date = due_date;
        }
        Ok(loan.clone())
    }

    /// Outstanding loans of a given book
    pub async fn count_active_for_book(&self, book_id: i32) -> usize {
        self.db
            .read()
            .await
            .loans
            .values()
            .filter(|l| l.book_id == book_id && l.is_active())
            .count()
    }

    /// Outstanding loans of a given borrower
    pub async fn count_active_for_user(&self, user_id: i32) -> usize {
        self.db
            .read()
            .await
            .loans
            .values()
            .filter(|l| l.user_id == user_id && l.is_active())
            .count()
    }
}

fn loan_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Loan with id {} not found", id))
}

fn close_loan(tables: &mut Tables, id: i32, return_date: DateTime<Utc>) -> AppResult<Loan> {
    let loan = tables.loans.get_mut(&id).ok_or_else(|| loan_not_found(id))?;

    if !loan.is_active() {
        return Err(AppError::State(format!("Loan {} has already been returned", id)));
    }
    if return_date < loan.loan_date {
        return Err(AppError::Validation("Return date cannot be before loan date".to_string()));
    }
    loan.return_date = Some(return_date);
    let loan = loan.clone();

    match tables.books.get_mut(&loan.book_id) {
        Some(book) => book.available = book.available.saturating_add(1).min(book.quantity),
        None => tracing::warn!(
            "Loan {} returned for book {} which no longer exists",
            loan.id,
            loan.book_id
        ),
    }

    Ok(loan)
}
