//! Dashboard statistics service

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    models::{
        loan::LoanScope,
        role::Action,
        user::User,
    },
    repository::Repository,
};

/// Dashboard counters, scoped to what the caller may see
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Number of titles in the catalog
    pub books: usize,
    /// Total copies owned
    pub copies: i64,
    /// Copies on the shelf
    pub available_copies: i64,
    pub active_loans: usize,
    pub overdue_loans: usize,
    /// Only reported to callers allowed to read users
    pub users: Option<usize>,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_stats(&self, caller: &User) -> StatsResponse {
        let books = self.repository.books.list().await;
        let loans = self.repository.loans.list(LoanScope::for_caller(caller)).await;
        let now = Utc::now();

        let users = if caller.role.allows(Action::ReadUsers) {
            Some(self.repository.users.count().await)
        } else {
            None
        };

        StatsResponse {
            books: books.len(),
            copies: books.iter().map(|b| b.quantity as i64).sum(),
            available_copies: books.iter().map(|b| b.available as i64).sum(),
            active_loans: loans.iter().filter(|l| l.is_active()).count(),
            overdue_loans: loans.iter().filter(|l| l.is_overdue(now)).count(),
            users,
        }
    }
}
