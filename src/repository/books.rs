//! Books repository

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, CreateBook, UpdateBook},
};

use super::{Db, Tables};

#[derive(Clone)]
pub struct BooksRepository {
    db: Db,
}

impl BooksRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// List all books ordered by id
    pub async fn list(&self) -> Vec<Book> {
        self.db.read().await.books.values().cloned().collect()
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.db
            .read()
            .await
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Create a new book
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let mut tables = self.db.write().await;

        ensure_isbn_free(&tables, &book.isbn, None)?;

        let created = Book {
            id: tables.next_book_id(),
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            quantity: book.quantity(),
            available: book.available(),
        };
        if !created.is_consistent() {
            return Err(AppError::Validation(
                "Available copies must be between 0 and quantity".to_string(),
            ));
        }

        tables.books.insert(created.id, created.clone());
        Ok(created)
    }

    /// Update a book.
    ///
    /// Changing `quantity` without an explicit `available` moves `available`
    /// by the same amount, so the number of copies on loan stays put.
    pub async fn update(&self, id: i32, update: &UpdateBook) -> AppResult<Book> {
        let mut tables = self.db.write().await;

        let current = tables
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        if let Some(ref isbn) = update.isbn {
            ensure_isbn_free(&tables, isbn, Some(id))?;
        }

        let quantity = update.quantity.unwrap_or(current.quantity);
        let available = match update.available {
            Some(available) => available,
            None => quantity
                .checked_sub(current.quantity)
                .and_then(|delta| current.available.checked_add(delta))
                .ok_or_else(|| AppError::Validation("Copy counts out of range".to_string()))?,
        };

        let updated = Book {
            id,
            title: update.title.clone().unwrap_or(current.title),
            author: update.author.clone().unwrap_or(current.author),
            isbn: update.isbn.clone().unwrap_or(current.isbn),
            quantity,
            available,
        };
        if !updated.is_consistent() {
            return Err(AppError::Validation(format!(
                "Invalid copy counts: available {} of quantity {}",
                updated.available, updated.quantity
            )));
        }

        tables.books.insert(id, updated.clone());
        Ok(updated)
    }

    /// Delete a book. Loans referencing it are left untouched.
    pub async fn delete(&self, id: i32) -> AppResult<Book> {
        self.db
            .write()
            .await
            .books
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }
}

fn ensure_isbn_free(tables: &Tables, isbn: &str, except: Option<i32>) -> AppResult<()> {
    let taken = tables
        .books
        .values()
        .any(|b| b.isbn == isbn && Some(b.id) != except);

    if taken {
        return Err(AppError::Conflict(format!("A book with ISBN {} already exists", isbn)));
    }
    Ok(())
}
