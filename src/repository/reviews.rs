//! Reviews repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult, Entity},
    models::review::{CreateReview, RatingShift, Review, UpdateReview},
};

use super::{books::shift_rating_on, ReviewStore};

const FOREIGN_KEY_VIOLATION: &str = "23503";

/// A write naming a book that does not exist trips the `reviews.book_id`
/// foreign key
fn missing_book(e: sqlx::Error, book_id: i32) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            return AppError::NotFound(Entity::Book, book_id);
        }
    }
    AppError::Database(e)
}

#[derive(Clone)]
pub struct ReviewsRepository {
    pool: Pool<Postgres>,
}

impl ReviewsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewStore for ReviewsRepository {
    async fn create_review(&self, review: &CreateReview, date: DateTime<Utc>) -> AppResult<Review> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (book_id, reviewer_id, rating, comment, date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(review.book_id)
        .bind(review.reviewer_id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| missing_book(e, review.book_id))?;

        let shift = RatingShift::add(&created);
        shift_rating_on(&mut tx, shift.book_id, shift.count_delta, shift.sum_delta).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_review(&self, id: i32) -> AppResult<Review> {
        sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound(Entity::Review, id))
    }

    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE book_id = $1 ORDER BY date DESC, id DESC",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    async fn update_review(&self, id: i32, update: &UpdateReview) -> AppResult<Review> {
        let mut tx = self.pool.begin().await?;

        // The row lock holds off other editors of this review until commit
        let current = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound(Entity::Review, id))?;

        let next = current.updated(update);
        let saved = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET book_id = $2, rating = $3, comment = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(next.book_id)
        .bind(next.rating)
        .bind(&next.comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| missing_book(e, next.book_id))?;

        for shift in RatingShift::between(&current, &saved) {
            shift_rating_on(&mut tx, shift.book_id, shift.count_delta, shift.sum_delta).await?;
        }

        tx.commit().await?;

        Ok(saved)
    }

    async fn delete_review(&self, id: i32) -> AppResult<Review> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query_as::<_, Review>("DELETE FROM reviews WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound(Entity::Review, id))?;

        let shift = RatingShift::remove(&removed);
        shift_rating_on(&mut tx, shift.book_id, shift.count_delta, shift.sum_delta).await?;

        tx.commit().await?;

        Ok(removed)
    }
}
