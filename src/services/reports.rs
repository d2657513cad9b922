//! Read-only predicates over ledger state for the reporting layer

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    repository::Repository,
};

#[derive(Clone)]
pub struct ReportService {
    repository: Repository,
}

impl ReportService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Active and at least one copy on the shelf
    pub async fn is_available(&self, book_id: i32) -> AppResult<bool> {
        let book = self.repository.books.get_book(book_id).await?;
        Ok(book.is_available())
    }

    /// `None` until the checkout is returned
    pub async fn is_on_time(&self, checkout_id: i32) -> AppResult<Option<bool>> {
        let checkout = self.repository.checkouts.get_checkout(checkout_id).await?;
        Ok(checkout.is_on_time())
    }

    /// Checkouts started within `[start, end]`, both ends inclusive
    pub async fn count_borrowed_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<i64> {
        if start > end {
            return Err(AppError::Validation(format!(
                "Range start {} is after end {}",
                start, end
            )));
        }
        self.repository
            .checkouts
            .count_borrowed_between(start, end)
            .await
    }
}
