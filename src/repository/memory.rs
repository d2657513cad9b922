//! In-process ledger store
//!
//! Holds every table behind one mutex; each trait method runs inside a single
//! critical section, which gives the same all-or-nothing behaviour as the
//! conditional updates of the PostgreSQL repositories.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult, Entity},
    models::{
        book::{resized_available, Book, BookStatus, CreateBook},
        checkout::{Checkout, NewCheckout},
        review::{CreateReview, RatingShift, Review, UpdateReview},
    },
};

use super::{BookStore, CheckoutStore, ReviewStore};

#[derive(Default)]
struct Tables {
    books: BTreeMap<i32, Book>,
    checkouts: BTreeMap<i32, Checkout>,
    reviews: BTreeMap<i32, Review>,
    last_book_id: i32,
    last_checkout_id: i32,
    last_review_id: i32,
}

impl Tables {
    fn book_mut(&mut self, id: i32) -> AppResult<&mut Book> {
        self.books
            .get_mut(&id)
            .ok_or(AppError::NotFound(Entity::Book, id))
    }

    /// Copy of a book with `shift` applied to its rating; nothing is stored
    fn shifted_book(&self, shift: RatingShift) -> AppResult<Book> {
        let mut book = self
            .books
            .get(&shift.book_id)
            .cloned()
            .ok_or(AppError::NotFound(Entity::Book, shift.book_id))?;
        let rating = book
            .rating()
            .shifted(shift.count_delta, shift.sum_delta)
            .ok_or_else(|| {
                AppError::Validation(format!("Book {} has no rating to remove", shift.book_id))
            })?;
        book.set_rating(rating);
        Ok(book)
    }

    /// Check every shift before storing any of them
    fn apply_shifts(&mut self, shifts: &[RatingShift]) -> AppResult<()> {
        let shifted = shifts
            .iter()
            .map(|shift| self.shifted_book(*shift))
            .collect::<AppResult<Vec<_>>>()?;
        for book in shifted {
            self.books.insert(book.id, book);
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn create_book(&self, book: &CreateBook) -> AppResult<Book> {
        let mut tables = self.tables.lock().await;
        tables.last_book_id += 1;
        let created = Book {
            id: tables.last_book_id,
            title: book.title.clone(),
            author: book.author.clone(),
            total_copies: book.total_copies,
            available_copies: book.total_copies,
            status: BookStatus::Active,
            rating_count: 0,
            rating_sum: 0,
            rating_average: Decimal::ZERO,
            created_at: Utc::now(),
        };
        tables.books.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_book(&self, id: i32) -> AppResult<Book> {
        let tables = self.tables.lock().await;
        tables
            .books
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound(Entity::Book, id))
    }

    async fn resize_book(&self, id: i32, new_total: i32) -> AppResult<Book> {
        let mut tables = self.tables.lock().await;
        let book = tables.book_mut(id)?;
        book.available_copies = resized_available(book.total_copies, book.available_copies, new_total);
        book.total_copies = new_total;
        Ok(book.clone())
    }

    async fn set_status(&self, id: i32, status: BookStatus) -> AppResult<Book> {
        let mut tables = self.tables.lock().await;
        let book = tables.book_mut(id)?;
        book.status = status;
        Ok(book.clone())
    }

    async fn shift_rating(&self, id: i32, count_delta: i32, sum_delta: i64) -> AppResult<Book> {
        let mut tables = self.tables.lock().await;
        let book = tables.shifted_book(RatingShift {
            book_id: id,
            count_delta,
            sum_delta,
        })?;
        tables.books.insert(id, book.clone());
        Ok(book)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl CheckoutStore for MemoryStore {
    async fn borrow(&self, checkout: NewCheckout) -> AppResult<Checkout> {
        let mut tables = self.tables.lock().await;
        let book = tables.book_mut(checkout.book_id)?;
        match book.status {
            BookStatus::Retired => return Err(AppError::RetiredBook(book.id)),
            BookStatus::Active if book.available_copies <= 0 => {
                return Err(AppError::OutOfStock(book.id))
            }
            BookStatus::Active => book.available_copies -= 1,
        }

        tables.last_checkout_id += 1;
        let created = Checkout {
            id: tables.last_checkout_id,
            book_id: checkout.book_id,
            borrower_id: checkout.borrower_id,
            borrow_date: checkout.borrow_date,
            due_date: checkout.due_date,
            return_date: None,
            is_late: None,
        };
        tables.checkouts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn return_checkout(&self, id: i32, at: DateTime<Utc>) -> AppResult<Checkout> {
        let mut tables = self.tables.lock().await;
        let checkout = tables
            .checkouts
            .get_mut(&id)
            .ok_or(AppError::NotFound(Entity::Checkout, id))?;
        if checkout.return_date.is_some() {
            return Err(AppError::AlreadyReturned(id));
        }
        checkout.return_date = Some(at);
        checkout.is_late = Some(at > checkout.due_date);
        let closed = checkout.clone();

        if let Some(book) = tables.books.get_mut(&closed.book_id) {
            book.available_copies = (book.available_copies + 1).min(book.total_copies);
        }
        Ok(closed)
    }

    async fn get_checkout(&self, id: i32) -> AppResult<Checkout> {
        let tables = self.tables.lock().await;
        tables
            .checkouts
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound(Entity::Checkout, id))
    }

    async fn active_for_borrower(&self, borrower_id: i32) -> AppResult<Vec<Checkout>> {
        let tables = self.tables.lock().await;
        let mut active: Vec<Checkout> = tables
            .checkouts
            .values()
            .filter(|c| c.borrower_id == borrower_id && c.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|c| c.due_date);
        Ok(active)
    }

    async fn count_borrowed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<i64> {
        let tables = self.tables.lock().await;
        let count = tables
            .checkouts
            .values()
            .filter(|c| c.borrow_date >= start && c.borrow_date <= end)
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn create_review(&self, review: &CreateReview, date: DateTime<Utc>) -> AppResult<Review> {
        let mut tables = self.tables.lock().await;
        let created = Review {
            id: tables.last_review_id + 1,
            book_id: review.book_id,
            reviewer_id: review.reviewer_id,
            rating: review.rating,
            comment: review.comment.clone(),
            date,
        };
        tables.apply_shifts(&[RatingShift::add(&created)])?;

        tables.last_review_id = created.id;
        tables.reviews.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_review(&self, id: i32) -> AppResult<Review> {
        let tables = self.tables.lock().await;
        tables
            .reviews
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound(Entity::Review, id))
    }

    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<Review>> {
        let tables = self.tables.lock().await;
        let mut reviews: Vec<Review> = tables
            .reviews
            .values()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(reviews)
    }

    async fn update_review(&self, id: i32, update: &UpdateReview) -> AppResult<Review> {
        let mut tables = self.tables.lock().await;
        let current = tables
            .reviews
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound(Entity::Review, id))?;
        let saved = current.updated(update);
        // A move to an unknown book fails its shift
        tables.apply_shifts(&RatingShift::between(&current, &saved))?;

        tables.reviews.insert(id, saved.clone());
        Ok(saved)
    }

    async fn delete_review(&self, id: i32) -> AppResult<Review> {
        let mut tables = self.tables.lock().await;
        let removed = tables
            .reviews
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound(Entity::Review, id))?;
        tables.apply_shifts(&[RatingShift::remove(&removed)])?;

        tables.reviews.remove(&id);
        Ok(removed)
    }
}
