//! Data models for the lending ledger

pub mod book;
pub mod checkout;
pub mod review;

// Re-export commonly used types
pub use book::{Book, BookStatus, RatingAggregate};
pub use checkout::Checkout;
pub use review::Review;
