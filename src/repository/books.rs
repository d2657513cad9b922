//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult, Entity},
    models::book::{Book, BookStatus, CreateBook},
};

use super::BookStore;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Shift a book's rating aggregate on `conn`, so callers can run it inside
/// their own transaction. Fails with a validation error if the count would go
/// negative.
pub(super) async fn shift_rating_on(
    conn: &mut PgConnection,
    id: i32,
    count_delta: i32,
    sum_delta: i64,
) -> AppResult<Book> {
    let updated = sqlx::query_as::<_, Book>(
        r#"
        UPDATE books
        SET rating_count = rating_count + $2,
            rating_sum = CASE WHEN rating_count + $2 = 0 THEN 0 ELSE rating_sum + $3 END,
            rating_average = CASE
                WHEN rating_count + $2 = 0 THEN 0
                ELSE ROUND((rating_sum + $3)::numeric / (rating_count + $2), 2)
            END
        WHERE id = $1 AND rating_count + $2 >= 0
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(count_delta)
    .bind(sum_delta)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(book) = updated {
        return Ok(book);
    }

    // Only picks the error; nothing is written after a refused shift
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Err(if exists {
        AppError::Validation(format!("Book {} has no rating to remove", id))
    } else {
        AppError::NotFound(Entity::Book, id)
    })
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn create_book(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, total_copies, available_copies, status)
            VALUES ($1, $2, $3, $3, 'active')
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.total_copies)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn get_book(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound(Entity::Book, id))
    }

    async fn resize_book(&self, id: i32, new_total: i32) -> AppResult<Book> {
        // Every SET expression sees the pre-update row
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET available_copies = LEAST(GREATEST(available_copies + ($2 - total_copies), 0), $2),
                total_copies = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(new_total)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound(Entity::Book, id))
    }

    async fn set_status(&self, id: i32, status: BookStatus) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("UPDATE books SET status = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound(Entity::Book, id))
    }

    async fn shift_rating(&self, id: i32, count_delta: i32, sum_delta: i64) -> AppResult<Book> {
        let mut conn = self.pool.acquire().await?;
        shift_rating_on(&mut conn, id, count_delta, sum_delta).await
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
