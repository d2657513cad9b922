//! Checkout transaction processor: borrow and return

use chrono::{DateTime, Utc};

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::checkout::{Checkout, NewCheckout},
    repository::Repository,
};

#[derive(Clone)]
pub struct CheckoutService {
    repository: Repository,
    lending: LendingConfig,
}

impl CheckoutService {
    pub fn new(repository: Repository, lending: LendingConfig) -> Self {
        Self { repository, lending }
    }

    /// Borrow one copy of a book. `loan_days` falls back to the configured
    /// default loan length.
    pub async fn borrow(
        &self,
        book_id: i32,
        borrower_id: i32,
        loan_days: Option<i64>,
    ) -> AppResult<Checkout> {
        self.borrow_at(book_id, borrower_id, loan_days, Utc::now()).await
    }

    pub(crate) async fn borrow_at(
        &self,
        book_id: i32,
        borrower_id: i32,
        loan_days: Option<i64>,
        now: DateTime<Utc>,
    ) -> AppResult<Checkout> {
        let loan_days = loan_days.unwrap_or(self.lending.default_loan_days);
        if !(1..=self.lending.max_loan_days).contains(&loan_days) {
            return Err(AppError::Validation(format!(
                "Loan days must be between 1 and {}, got {}",
                self.lending.max_loan_days, loan_days
            )));
        }

        let new = NewCheckout::new(book_id, borrower_id, now, loan_days);
        match self.repository.checkouts.borrow(new).await {
            Ok(checkout) => {
                tracing::info!(
                    "Checkout id={}: book id={} lent to borrower id={} until {}",
                    checkout.id,
                    book_id,
                    borrower_id,
                    checkout.due_date
                );
                Ok(checkout)
            }
            Err(e) => {
                if e.is_business() {
                    tracing::debug!("Borrow of book id={} refused: {}", book_id, e);
                }
                Err(e)
            }
        }
    }

    /// Close a checkout and put its copy back on the shelf. Only the first
    /// return of a checkout succeeds.
    pub async fn return_checkout(&self, checkout_id: i32) -> AppResult<Checkout> {
        self.return_checkout_at(checkout_id, Utc::now()).await
    }

    pub(crate) async fn return_checkout_at(
        &self,
        checkout_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Checkout> {
        let checkout = self.repository.checkouts.return_checkout(checkout_id, now).await?;
        if checkout.is_late == Some(true) {
            tracing::info!(
                "Checkout id={}: book id={} returned late (due {})",
                checkout.id,
                checkout.book_id,
                checkout.due_date
            );
        } else {
            tracing::info!(
                "Checkout id={}: book id={} returned",
                checkout.id,
                checkout.book_id
            );
        }
        Ok(checkout)
    }

    pub async fn get_checkout(&self, checkout_id: i32) -> AppResult<Checkout> {
        self.repository.checkouts.get_checkout(checkout_id).await
    }

    /// Open checkouts of a borrower, soonest due first
    pub async fn active_for_borrower(&self, borrower_id: i32) -> AppResult<Vec<Checkout>> {
        self.repository.checkouts.active_for_borrower(borrower_id).await
    }
}
