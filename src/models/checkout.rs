//! Checkout (borrow/return) model and related types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Checkout model from database. Rows are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Checkout {
    pub id: i32,
    pub book_id: i32,
    pub borrower_id: i32,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    /// Set only when the copy comes back
    pub is_late: Option<bool>,
}

impl Checkout {
    /// Still on loan
    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }

    /// `None` while the copy is still out, otherwise whether it came back by
    /// the due date
    pub fn is_on_time(&self) -> Option<bool> {
        self.return_date.map(|returned| returned <= self.due_date)
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && now > self.due_date
    }
}

/// Values for a checkout row about to be inserted alongside a stock decrement
#[derive(Debug, Clone)]
pub struct NewCheckout {
    pub book_id: i32,
    pub borrower_id: i32,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

impl NewCheckout {
    pub fn new(book_id: i32, borrower_id: i32, borrow_date: DateTime<Utc>, loan_days: i64) -> Self {
        Self {
            book_id,
            borrower_id,
            borrow_date,
            due_date: borrow_date + Duration::days(loan_days),
        }
    }
}

/// Borrow request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BorrowRequest {
    pub book_id: i32,
    /// Already authenticated borrower
    pub borrower_id: i32,
    /// Defaults to the configured loan length
    #[validate(range(min = 1, message = "Loan must last at least one day"))]
    pub loan_days: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkout(return_date: Option<DateTime<Utc>>) -> Checkout {
        let borrow_date = Utc::now() - Duration::days(20);
        Checkout {
            id: 1,
            book_id: 1,
            borrower_id: 1,
            borrow_date,
            due_date: borrow_date + Duration::days(14),
            return_date,
            is_late: None,
        }
    }

    #[test]
    fn test_on_time_is_unknown_until_returned() {
        let open = checkout(None);
        assert_eq!(open.is_on_time(), None);
        assert!(open.is_overdue(Utc::now()));

        let due = open.due_date;
        assert_eq!(checkout(Some(due)).is_on_time(), Some(true));
        assert_eq!(checkout(Some(due - Duration::days(1))).is_on_time(), Some(true));
        assert_eq!(checkout(Some(due + Duration::seconds(1))).is_on_time(), Some(false));
    }

    #[test]
    fn test_due_date_adds_loan_days() {
        let now = Utc::now();
        let new = NewCheckout::new(3, 7, now, 14);
        assert_eq!(new.due_date - new.borrow_date, Duration::days(14));
    }
}
