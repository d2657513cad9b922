//! Review records, kept in step with the rating aggregates of their books

use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppResult,
    models::review::{CreateReview, Review, UpdateReview},
    repository::Repository,
};

#[derive(Clone)]
pub struct ReviewService {
    repository: Repository,
}

impl ReviewService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_review(&self, id: i32) -> AppResult<Review> {
        self.repository.reviews.get_review(id).await
    }

    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<Review>> {
        // Unknown book is a 404, not an empty list
        self.repository.books.get_book(book_id).await?;
        self.repository.reviews.list_for_book(book_id).await
    }

    /// Store a review and count its rating
    pub async fn create_review(&self, review: CreateReview) -> AppResult<Review> {
        review.validate()?;
        let created = self.repository.reviews.create_review(&review, Utc::now()).await?;
        tracing::info!(
            "Review id={} by reviewer id={} added to book id={}",
            created.id,
            created.reviewer_id,
            created.book_id
        );
        Ok(created)
    }

    /// Apply a partial update. A rating change on the same book is an edit of
    /// its aggregate; a change of book relocates the (possibly new) rating.
    /// A comment-only change touches no aggregate.
    pub async fn update_review(&self, id: i32, update: UpdateReview) -> AppResult<Review> {
        update.validate()?;
        let saved = self.repository.reviews.update_review(id, &update).await?;
        tracing::info!("Review id={} updated (book id={}, rating {})", id, saved.book_id, saved.rating);
        Ok(saved)
    }

    /// Delete a review and uncount its rating
    pub async fn delete_review(&self, id: i32) -> AppResult<Review> {
        let removed = self.repository.reviews.delete_review(id).await?;
        tracing::info!("Review id={} removed from book id={}", id, removed.book_id);
        Ok(removed)
    }
}
