//! Review model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, AppResult};

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

/// Review model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Review {
    pub id: i32,
    pub book_id: i32,
    pub reviewer_id: i32,
    pub rating: i16,
    pub comment: Option<String>,
    pub date: DateTime<Utc>,
}

/// Create review request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReview {
    pub book_id: i32,
    pub reviewer_id: i32,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,
    pub comment: Option<String>,
}

/// Update review request; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateReview {
    /// Moving a review to another book
    pub book_id: Option<i32>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i16>,
    pub comment: Option<String>,
}

impl Review {
    /// The row after applying `update`; absent fields keep their value
    pub fn updated(&self, update: &UpdateReview) -> Review {
        let mut next = self.clone();
        if let Some(book_id) = update.book_id {
            next.book_id = book_id;
        }
        if let Some(rating) = update.rating {
            next.rating = rating;
        }
        if update.comment.is_some() {
            next.comment = update.comment.clone();
        }
        next
    }
}

/// One `(count, sum)` shift of a book's rating aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingShift {
    pub book_id: i32,
    pub count_delta: i32,
    pub sum_delta: i64,
}

impl RatingShift {
    pub fn add(review: &Review) -> Self {
        Self {
            book_id: review.book_id,
            count_delta: 1,
            sum_delta: i64::from(review.rating),
        }
    }

    pub fn remove(review: &Review) -> Self {
        Self {
            book_id: review.book_id,
            count_delta: -1,
            sum_delta: -i64::from(review.rating),
        }
    }

    /// Shifts taking the aggregates from counting `before` to counting
    /// `after`, in ascending book id order so concurrent writers lock book
    /// rows in the same order.
    pub fn between(before: &Review, after: &Review) -> Vec<Self> {
        let mut shifts = if before.book_id != after.book_id {
            vec![Self::remove(before), Self::add(after)]
        } else if before.rating != after.rating {
            vec![Self {
                book_id: after.book_id,
                count_delta: 0,
                sum_delta: i64::from(after.rating) - i64::from(before.rating),
            }]
        } else {
            Vec::new()
        };
        shifts.sort_by_key(|shift| shift.book_id);
        shifts
    }
}

pub fn check_rating(rating: i16) -> AppResult<()> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Rating must be between {} and {}, got {}",
            MIN_RATING, MAX_RATING, rating
        )))
    }
}
