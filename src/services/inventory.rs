//! Inventory ledger: book creation, stock resizing and retirement

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookStatus, CreateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct InventoryService {
    repository: Repository,
}

impl InventoryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Add a book to the catalog with every copy available
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;
        let created = self.repository.books.create_book(&book).await?;
        tracing::info!(
            "Inventory: created book id={} with {} copies",
            created.id,
            created.total_copies
        );
        Ok(created)
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_book(id).await
    }

    /// Change the number of copies owned. Copies on loan stay on loan; the
    /// shelf count absorbs the difference and never leaves `[0, new_total]`.
    pub async fn resize_inventory(&self, id: i32, new_total: i32) -> AppResult<Book> {
        if new_total < 0 {
            return Err(AppError::Validation(format!(
                "Total copies cannot be negative, got {}",
                new_total
            )));
        }
        let book = self.repository.books.resize_book(id, new_total).await?;
        tracing::info!(
            "Inventory: book id={} resized to {} copies ({} available)",
            book.id,
            book.total_copies,
            book.available_copies
        );
        Ok(book)
    }

    /// Withdraw a book from lending. Copies already out can still be returned.
    pub async fn retire(&self, id: i32) -> AppResult<Book> {
        let book = self.repository.books.set_status(id, BookStatus::Retired).await?;
        tracing::info!("Inventory: book id={} retired", id);
        Ok(book)
    }

    pub async fn unretire(&self, id: i32) -> AppResult<Book> {
        let book = self.repository.books.set_status(id, BookStatus::Active).await?;
        tracing::info!("Inventory: book id={} back in circulation", id);
        Ok(book)
    }

    /// Fails only when the store cannot be reached
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.books.ping().await
    }
}
