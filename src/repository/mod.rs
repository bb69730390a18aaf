//! Repository layer: the in-memory catalog and loan store

pub mod books;
pub mod loans;
pub mod users;

use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::RwLock;

use crate::models::{
    book::{Book, CreateBook},
    loan::Loan,
    user::User,
};

/// Keyed record tables. Ids are allocated per table and never reused.
#[derive(Debug, Default)]
pub struct Tables {
    pub users: BTreeMap<i32, User>,
    pub books: BTreeMap<i32, Book>,
    pub loans: BTreeMap<i32, Loan>,
    last_user_id: i32,
    last_book_id: i32,
    last_loan_id: i32,
}

impl Tables {
    fn next_user_id(&mut self) -> i32 {
        self.last_user_id += 1;
        self.last_user_id
    }

    fn next_book_id(&mut self) -> i32 {
        self.last_book_id += 1;
        self.last_book_id
    }

    fn next_loan_id(&mut self) -> i32 {
        self.last_loan_id += 1;
        self.last_loan_id
    }
}

pub type Db = Arc<RwLock<Tables>>;

/// Main repository struct; all sub-repositories share the same tables
#[derive(Clone)]
pub struct Repository {
    db: Db,
    pub books: books::BooksRepository,
    pub users: users::UsersRepository,
    pub loans: loans::LoansRepository,
}

impl Repository {
    /// Create an empty store
    pub fn new() -> Self {
        let db: Db = Arc::new(RwLock::new(Tables::default()));
        Self {
            books: books::BooksRepository::new(db.clone()),
            users: users::UsersRepository::new(db.clone()),
            loans: loans::LoansRepository::new(db.clone()),
            db,
        }
    }

    /// Add a few well-known titles so a fresh server has something to lend
    pub async fn seed_sample_books(&self) -> crate::AppResult<usize> {
        let samples = [
            ("Dom Casmurro", "Machado de Assis", "9788535910682", 5),
            ("O Pequeno Príncipe", "Antoine de Saint-Exupéry", "9788574068794", 3),
            ("1984", "George Orwell", "9788535914849", 4),
        ];

        for (title, author, isbn, quantity) in samples {
            self.books
                .create(&CreateBook {
                    title: title.to_string(),
                    author: author.to_string(),
                    isbn: isbn.to_string(),
                    quantity: Some(quantity),
                    available: None,
                })
                .await?;
        }

        Ok(samples.len())
    }

    /// Drop every record and reset id allocation
    pub async fn clear(&self) {
        let mut tables = self.db.write().await;
        *tables = Tables::default();
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}
