//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, checkouts, health, ratings, reports, reviews};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lending Ledger API",
        version = "0.3.0",
        description = "Library stock, checkout and rating consistency REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::create_book,
        books::get_book,
        books::resize_inventory,
        books::retire_book,
        books::unretire_book,
        // Checkouts
        checkouts::borrow,
        checkouts::get_checkout,
        checkouts::return_checkout,
        checkouts::get_borrower_checkouts,
        // Reviews
        reviews::create_review,
        reviews::get_review,
        reviews::update_review,
        reviews::delete_review,
        reviews::list_book_reviews,
        // Rating aggregates
        ratings::add_rating,
        ratings::edit_rating,
        ratings::remove_rating,
        ratings::move_rating,
        // Reports
        reports::is_available,
        reports::is_on_time,
        reports::count_borrowed,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::BookStatus,
            crate::models::book::CreateBook,
            crate::models::book::ResizeInventory,
            // Checkouts
            crate::models::checkout::Checkout,
            crate::models::checkout::BorrowRequest,
            checkouts::ReturnResponse,
            // Reviews
            crate::models::review::Review,
            crate::models::review::CreateReview,
            crate::models::review::UpdateReview,
            ratings::RatingRequest,
            ratings::EditRatingRequest,
            ratings::MoveRatingRequest,
            ratings::MoveRatingResponse,
            // Reports
            reports::AvailabilityResponse,
            reports::OnTimeResponse,
            reports::BorrowedRangeQuery,
            reports::BorrowedCountResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Inventory management"),
        (name = "checkouts", description = "Borrowing and returning"),
        (name = "reviews", description = "Reviews and rating aggregates"),
        (name = "reports", description = "Read-only ledger predicates")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
