//! Checkouts repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult, Entity},
    models::{
        book::BookStatus,
        checkout::{Checkout, NewCheckout},
    },
};

use super::CheckoutStore;

#[derive(Clone)]
pub struct CheckoutsRepository {
    pool: Pool<Postgres>,
}

impl CheckoutsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckoutStore for CheckoutsRepository {
    async fn borrow(&self, checkout: NewCheckout) -> AppResult<Checkout> {
        let mut tx = self.pool.begin().await?;

        // The guard and the decrement are one statement; concurrent borrowers
        // serialize on the book row and the losers see no row come back.
        let taken: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1
            WHERE id = $1 AND status = 'active' AND available_copies > 0
            RETURNING id
            "#,
        )
        .bind(checkout.book_id)
        .fetch_optional(&mut *tx)
        .await?;

        if taken.is_none() {
            let status: Option<BookStatus> =
                sqlx::query_scalar("SELECT status FROM books WHERE id = $1")
                    .bind(checkout.book_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            return Err(match status {
                None => AppError::NotFound(Entity::Book, checkout.book_id),
                Some(BookStatus::Retired) => AppError::RetiredBook(checkout.book_id),
                Some(BookStatus::Active) => AppError::OutOfStock(checkout.book_id),
            });
        }

        let created = sqlx::query_as::<_, Checkout>(
            r#"
            INSERT INTO checkouts (book_id, borrower_id, borrow_date, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(checkout.book_id)
        .bind(checkout.borrower_id)
        .bind(checkout.borrow_date)
        .bind(checkout.due_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn return_checkout(&self, id: i32, at: DateTime<Utc>) -> AppResult<Checkout> {
        let mut tx = self.pool.begin().await?;

        let closed = sqlx::query_as::<_, Checkout>(
            r#"
            UPDATE checkouts
            SET return_date = $2, is_late = $2 > due_date
            WHERE id = $1 AND return_date IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(closed) = closed else {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM checkouts WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;

            return Err(if exists {
                AppError::AlreadyReturned(id)
            } else {
                AppError::NotFound(Entity::Checkout, id)
            });
        };

        // Capped so a book shrunk while copies were out stays within its total
        sqlx::query(
            r#"
            UPDATE books
            SET available_copies = LEAST(available_copies + 1, total_copies)
            WHERE id = $1
            "#,
        )
        .bind(closed.book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(closed)
    }

    async fn get_checkout(&self, id: i32) -> AppResult<Checkout> {
        sqlx::query_as::<_, Checkout>("SELECT * FROM checkouts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound(Entity::Checkout, id))
    }

    async fn active_for_borrower(&self, borrower_id: i32) -> AppResult<Vec<Checkout>> {
        let checkouts = sqlx::query_as::<_, Checkout>(
            r#"
            SELECT * FROM checkouts
            WHERE borrower_id = $1 AND return_date IS NULL
            ORDER BY due_date
            "#,
        )
        .bind(borrower_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(checkouts)
    }

    async fn count_borrowed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM checkouts WHERE borrow_date BETWEEN $1 AND $2")
                .bind(start)
                .bind(end)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
