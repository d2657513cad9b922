//! API handlers for the lending ledger REST endpoints
//!
//! Callers are authenticated upstream; borrower and reviewer ids arrive in
//! the request body already validated.

pub mod books;
pub mod checkouts;
pub mod health;
pub mod openapi;
pub mod ratings;
pub mod reports;
pub mod reviews;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Inventory
        .route("/books", post(books::create_book))
        .route("/books/:id", get(books::get_book))
        .route("/books/:id/inventory", put(books::resize_inventory))
        .route("/books/:id/retire", post(books::retire_book))
        .route("/books/:id/unretire", post(books::unretire_book))
        .route("/books/:id/available", get(reports::is_available))
        .route("/books/:id/reviews", get(reviews::list_book_reviews))
        // Checkouts
        .route("/checkouts", post(checkouts::borrow))
        .route("/checkouts/:id", get(checkouts::get_checkout))
        .route("/checkouts/:id/return", post(checkouts::return_checkout))
        .route("/checkouts/:id/on-time", get(reports::is_on_time))
        .route("/borrowers/:id/checkouts", get(checkouts::get_borrower_checkouts))
        // Reviews
        .route("/reviews", post(reviews::create_review))
        .route(
            "/reviews/:id",
            get(reviews::get_review)
                .put(reviews::update_review)
                .delete(reviews::delete_review),
        )
        // Rating aggregates
        .route(
            "/books/:id/ratings",
            post(ratings::add_rating).put(ratings::edit_rating),
        )
        .route("/books/:id/ratings/remove", post(ratings::remove_rating))
        .route("/ratings/move", post(ratings::move_rating))
        // Reports
        .route("/reports/borrowed", get(reports::count_borrowed))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
