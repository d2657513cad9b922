//! Repository layer for ledger storage
//!
//! Every mutating method is a single atomic step against the store: a
//! conditional update whose outcome is read from the affected row, never a
//! read followed by a separate write of the same counter.

pub mod books;
pub mod checkouts;
pub mod memory;
pub mod reviews;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookStatus, CreateBook},
        checkout::{Checkout, NewCheckout},
        review::{CreateReview, Review, UpdateReview},
    },
};

/// Book rows: stock counters, status and rating aggregates
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a book with every copy on the shelf and an empty rating
    async fn create_book(&self, book: &CreateBook) -> AppResult<Book>;

    async fn get_book(&self, id: i32) -> AppResult<Book>;

    /// Set `total_copies` and shift `available_copies` by the same delta,
    /// clamped to `[0, new_total]`
    async fn resize_book(&self, id: i32, new_total: i32) -> AppResult<Book>;

    async fn set_status(&self, id: i32, status: BookStatus) -> AppResult<Book>;

    /// Shift the rating aggregate by `count_delta` reviews totalling
    /// `sum_delta`, recomputing the average. Fails with a validation error if
    /// the count would go negative.
    async fn shift_rating(&self, id: i32, count_delta: i32, sum_delta: i64) -> AppResult<Book>;

    /// Round-trip to the store
    async fn ping(&self) -> AppResult<()>;
}

/// Checkout rows and the stock movements tied to them
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// Take one copy of the book if it is active and in stock, and record the
    /// checkout in the same step
    async fn borrow(&self, checkout: NewCheckout) -> AppResult<Checkout>;

    /// Close an open checkout at `at` and put its copy back on the shelf
    async fn return_checkout(&self, id: i32, at: DateTime<Utc>) -> AppResult<Checkout>;

    async fn get_checkout(&self, id: i32) -> AppResult<Checkout>;

    async fn active_for_borrower(&self, borrower_id: i32) -> AppResult<Vec<Checkout>>;

    /// Checkouts with `borrow_date` in `[start, end]`
    async fn count_borrowed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<i64>;
}

/// Review rows together with the rating aggregates they feed.
///
/// Every mutating method changes the review row and shifts the affected
/// aggregates in one atomic step; either both land or neither does.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Insert a review and count its rating on the book
    async fn create_review(&self, review: &CreateReview, date: DateTime<Utc>) -> AppResult<Review>;

    async fn get_review(&self, id: i32) -> AppResult<Review>;

    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<Review>>;

    /// Apply a partial update to a review. The aggregate shift is derived from
    /// the row as it stood when the update locked it, so concurrent edits of
    /// one review serialize.
    async fn update_review(&self, id: i32, update: &UpdateReview) -> AppResult<Review>;

    /// Delete a review and uncount its rating, returning the removed row
    async fn delete_review(&self, id: i32) -> AppResult<Review>;
}

/// Main repository struct holding one handle per store
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
    pub checkouts: Arc<dyn CheckoutStore>,
    pub reviews: Arc<dyn ReviewStore>,
}

impl Repository {
    /// Create a PostgreSQL-backed repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            checkouts: Arc::new(checkouts::CheckoutsRepository::new(pool.clone())),
            reviews: Arc::new(reviews::ReviewsRepository::new(pool)),
        }
    }

    /// Create a repository backed by a single in-process store
    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::new();
        Self {
            books: Arc::new(store.clone()),
            checkouts: Arc::new(store.clone()),
            reviews: Arc::new(store),
        }
    }
}

/// Pool for the database-backed tests, which run with
/// `DATABASE_URL=... cargo test -- --ignored`
#[cfg(test)]
pub(crate) async fn test_pool() -> Pool<Postgres> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    pool
}
