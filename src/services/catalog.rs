//! Catalog management service

use validator::Validate;

use crate::{
    error::AppResult,
    models::book::{Book, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_books(&self) -> Vec<Book> {
        self.repository.books.list().await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;

        let created = self.repository.books.create(&book).await?;
        tracing::info!("Catalog: created book {} ({})", created.id, created.isbn);
        Ok(created)
    }

    pub async fn update_book(&self, id: i32, book: UpdateBook) -> AppResult<Book> {
        book.validate()?;
        self.repository.books.update(id, &book).await
    }

    /// Delete a book. Outstanding loans on it do not block the deletion; they
    /// keep pointing at the removed id.
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        let active = self.repository.loans.count_active_for_book(id).await;
        let book = self.repository.books.delete(id).await?;

        if active > 0 {
            tracing::warn!(
                "Catalog: deleted book {} ({}) with {} active loan(s)",
                book.id,
                book.isbn,
                active
            );
        } else {
            tracing::info!("Catalog: deleted book {} ({})", book.id, book.isbn);
        }
        Ok(())
    }
}
