//! Review aggregator: incremental maintenance of per-book rating aggregates
//!
//! Each operation is one atomic shift of `(count, sum)` on a single book row;
//! the average is rederived from the shifted values in the same statement.
//! Reviews are never rescanned.

use crate::{
    error::AppResult,
    models::{book::Book, review::check_rating},
    repository::Repository,
};

#[derive(Clone)]
pub struct RatingService {
    repository: Repository,
    move_attempts: u32,
}

impl RatingService {
    pub fn new(repository: Repository, move_attempts: u32) -> Self {
        Self {
            repository,
            move_attempts: move_attempts.max(1),
        }
    }

    /// Count a new rating for a book
    pub async fn add_review(&self, book_id: i32, rating: i16) -> AppResult<Book> {
        check_rating(rating)?;
        let book = self
            .repository
            .books
            .shift_rating(book_id, 1, i64::from(rating))
            .await?;
        tracing::debug!("Rating: book id={} +{} -> avg {}", book_id, rating, book.rating_average);
        Ok(book)
    }

    /// Replace one rating of a book with another; the count is unchanged
    pub async fn edit_review(&self, book_id: i32, old_rating: i16, new_rating: i16) -> AppResult<Book> {
        check_rating(old_rating)?;
        check_rating(new_rating)?;
        let book = self
            .repository
            .books
            .shift_rating(book_id, 0, i64::from(new_rating) - i64::from(old_rating))
            .await?;
        tracing::debug!(
            "Rating: book id={} {} -> {} -> avg {}",
            book_id,
            old_rating,
            new_rating,
            book.rating_average
        );
        Ok(book)
    }

    /// Drop one rating from a book. The average falls back to 0 once the
    /// last rating is gone.
    pub async fn remove_review(&self, book_id: i32, rating: i16) -> AppResult<Book> {
        check_rating(rating)?;
        let book = self
            .repository
            .books
            .shift_rating(book_id, -1, -i64::from(rating))
            .await?;
        tracing::debug!("Rating: book id={} -{} -> avg {}", book_id, rating, book.rating_average);
        Ok(book)
    }

    /// Relocate a rating from one book to another.
    ///
    /// The two legs are independent atomic updates, not one transaction. Each
    /// leg is retried on storage failure; business errors stop immediately.
    /// Returns the old and the new book.
    pub async fn move_review(
        &self,
        old_book_id: i32,
        new_book_id: i32,
        rating: i16,
    ) -> AppResult<(Book, Book)> {
        check_rating(rating)?;
        let rating = i64::from(rating);

        let old_book = self.shift_with_retry(old_book_id, -1, -rating).await?;
        let new_book = self.shift_with_retry(new_book_id, 1, rating).await?;

        tracing::info!(
            "Rating: moved a {} rating from book id={} to book id={}",
            rating,
            old_book_id,
            new_book_id
        );
        Ok((old_book, new_book))
    }

    async fn shift_with_retry(&self, book_id: i32, count_delta: i32, sum_delta: i64) -> AppResult<Book> {
        let mut attempt = 1;
        loop {
            match self
                .repository
                .books
                .shift_rating(book_id, count_delta, sum_delta)
                .await
            {
                Ok(book) => return Ok(book),
                Err(e) if e.is_business() || attempt >= self.move_attempts => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "Rating: shift on book id={} failed (attempt {}/{}): {}",
                        book_id,
                        attempt,
                        self.move_attempts,
                        e
                    );
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{AppError, Entity},
        models::book::{BookStatus, CreateBook},
        repository::{MockBookStore, MockCheckoutStore, MockReviewStore},
    };
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    async fn setup() -> (RatingService, i32, i32) {
        let repository = Repository::in_memory();
        let mut ids = Vec::new();
        for title in ["Piranesi", "Jonathan Strange & Mr Norrell"] {
            let book = repository
                .books
                .create_book(&CreateBook {
                    title: title.into(),
                    author: Some("Susanna Clarke".into()),
                    total_copies: 1,
                })
                .await
                .unwrap();
            ids.push(book.id);
        }
        (RatingService::new(repository, 3), ids[0], ids[1])
    }

    #[tokio::test]
    async fn test_ratings_accumulate_exactly() {
        let (service, book_id, _) = setup().await;
        for rating in [5, 3, 4] {
            service.add_review(book_id, rating).await.unwrap();
        }
        let book = service.repository.books.get_book(book_id).await.unwrap();
        assert_eq!(book.rating_count, 3);
        assert_eq!(book.rating_sum, 12);
        assert_eq!(book.rating_average, Decimal::new(400, 2));

        let book = service.remove_review(book_id, 3).await.unwrap();
        assert_eq!(book.rating_count, 2);
        assert_eq!(book.rating_sum, 9);
        assert_eq!(book.rating_average, Decimal::new(450, 2));
    }

    #[tokio::test]
    async fn test_removing_last_rating_resets_average() {
        let (service, book_id, _) = setup().await;
        service.add_review(book_id, 2).await.unwrap();

        let book = service.remove_review(book_id, 2).await.unwrap();
        assert_eq!(book.rating_count, 0);
        assert_eq!(book.rating_average, Decimal::ZERO);

        let err = service.remove_review(book_id, 2).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_edit_keeps_count() {
        let (service, book_id, _) = setup().await;
        service.add_review(book_id, 1).await.unwrap();
        service.add_review(book_id, 2).await.unwrap();

        let book = service.edit_review(book_id, 1, 5).await.unwrap();
        assert_eq!(book.rating_count, 2);
        assert_eq!(book.rating_sum, 7);
        assert_eq!(book.rating_average, Decimal::new(350, 2));
    }

    #[tokio::test]
    async fn test_move_shifts_both_books() {
        let (service, from, to) = setup().await;
        service.add_review(from, 4).await.unwrap();
        service.add_review(from, 5).await.unwrap();

        let (old_book, new_book) = service.move_review(from, to, 4).await.unwrap();
        assert_eq!((old_book.rating_count, old_book.rating_sum), (1, 5));
        assert_eq!(old_book.rating_average, Decimal::new(500, 2));
        assert_eq!((new_book.rating_count, new_book.rating_sum), (1, 4));
        assert_eq!(new_book.rating_average, Decimal::new(400, 2));
    }

    #[tokio::test]
    async fn test_out_of_range_rating_is_rejected() {
        let (service, book_id, _) = setup().await;
        assert!(matches!(service.add_review(book_id, 6).await, Err(AppError::Validation(_))));
        assert!(matches!(service.add_review(book_id, 0).await, Err(AppError::Validation(_))));
        assert!(matches!(
            service.add_review(book_id + 10, 3).await,
            Err(AppError::NotFound(Entity::Book, _))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_ratings_do_not_lose_updates() {
        let (service, book_id, _) = setup().await;
        let handles: Vec<_> = (0..50)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move { service.add_review(book_id, (i % 5 + 1) as i16).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let book = service.repository.books.get_book(book_id).await.unwrap();
        assert_eq!(book.rating_count, 50);
        assert_eq!(book.rating_sum, 150);
        assert_eq!(book.rating_average, Decimal::new(300, 2));
    }

    fn stored_book(id: i32, count: i32, sum: i64) -> Book {
        let mut book = Book {
            id,
            title: "Mocked".into(),
            author: None,
            total_copies: 1,
            available_copies: 1,
            status: BookStatus::Active,
            rating_count: 0,
            rating_sum: 0,
            rating_average: Decimal::ZERO,
            created_at: Utc::now(),
        };
        book.set_rating(crate::models::RatingAggregate::new(count, sum));
        book
    }

    fn mocked(books: MockBookStore) -> Repository {
        Repository {
            books: Arc::new(books),
            checkouts: Arc::new(MockCheckoutStore::new()),
            reviews: Arc::new(MockReviewStore::new()),
        }
    }

    #[tokio::test]
    async fn test_move_retries_failed_leg() {
        let failures = Arc::new(AtomicUsize::new(0));
        let mut books = MockBookStore::new();
        books
            .expect_shift_rating()
            .withf(|id, count, sum| *id == 1 && *count == -1 && *sum == -3)
            .times(1)
            .returning(|id, _, _| Ok(stored_book(id, 0, 0)));
        books
            .expect_shift_rating()
            .withf(|id, count, sum| *id == 2 && *count == 1 && *sum == 3)
            .times(2)
            .returning({
                let failures = failures.clone();
                move |id, _, _| {
                    if failures.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(AppError::Database(sqlx::Error::PoolTimedOut))
                    } else {
                        Ok(stored_book(id, 1, 3))
                    }
                }
            });

        let service = RatingService::new(mocked(books), 3);
        let (_, new_book) = service.move_review(1, 2, 3).await.unwrap();
        assert_eq!(new_book.rating_count, 1);
        assert_eq!(failures.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_move_gives_up_after_configured_attempts() {
        let mut books = MockBookStore::new();
        books
            .expect_shift_rating()
            .times(2)
            .returning(|_, _, _| Err(AppError::Database(sqlx::Error::PoolTimedOut)));

        let service = RatingService::new(mocked(books), 2);
        let err = service.move_review(1, 2, 4).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_move_does_not_retry_missing_book() {
        let mut books = MockBookStore::new();
        books
            .expect_shift_rating()
            .times(1)
            .returning(|id, _, _| Err(AppError::NotFound(Entity::Book, id)));

        let service = RatingService::new(mocked(books), 5);
        let err = service.move_review(8, 2, 4).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(Entity::Book, 8)));
    }
}
