//! Rating aggregate endpoints
//!
//! For collaborators that keep their own review rows and only need the
//! per-book `(count, sum)` aggregate maintained.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppResult, models::book::Book};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RatingRequest {
    pub rating: i16,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EditRatingRequest {
    pub old_rating: i16,
    pub new_rating: i16,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveRatingRequest {
    pub old_book_id: i32,
    pub new_book_id: i32,
    pub rating: i16,
}

#[derive(Serialize, ToSchema)]
pub struct MoveRatingResponse {
    pub old_book: Book,
    pub new_book: Book,
}

/// Count a rating for a book
#[utoipa::path(
    post,
    path = "/books/{id}/ratings",
    tag = "reviews",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = RatingRequest,
    responses(
        (status = 200, description = "Aggregate after the rating", body = Book),
        (status = 400, description = "Rating outside 1-5"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn add_rating(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<RatingRequest>,
) -> AppResult<Json<Book>> {
    let book = state.services.ratings.add_review(id, request.rating).await?;
    Ok(Json(book))
}

/// Replace one rating of a book with another
#[utoipa::path(
    put,
    path = "/books/{id}/ratings",
    tag = "reviews",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = EditRatingRequest,
    responses(
        (status = 200, description = "Aggregate after the edit", body = Book),
        (status = 400, description = "Rating outside 1-5"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn edit_rating(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<EditRatingRequest>,
) -> AppResult<Json<Book>> {
    let book = state
        .services
        .ratings
        .edit_review(id, request.old_rating, request.new_rating)
        .await?;
    Ok(Json(book))
}

/// Drop one rating from a book
#[utoipa::path(
    post,
    path = "/books/{id}/ratings/remove",
    tag = "reviews",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = RatingRequest,
    responses(
        (status = 200, description = "Aggregate after the removal", body = Book),
        (status = 400, description = "Rating outside 1-5 or nothing to remove"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn remove_rating(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<RatingRequest>,
) -> AppResult<Json<Book>> {
    let book = state.services.ratings.remove_review(id, request.rating).await?;
    Ok(Json(book))
}

/// Relocate a rating from one book to another
#[utoipa::path(
    post,
    path = "/ratings/move",
    tag = "reviews",
    request_body = MoveRatingRequest,
    responses(
        (status = 200, description = "Both aggregates after the move", body = MoveRatingResponse),
        (status = 400, description = "Rating outside 1-5 or nothing to remove"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn move_rating(
    State(state): State<crate::AppState>,
    Json(request): Json<MoveRatingRequest>,
) -> AppResult<Json<MoveRatingResponse>> {
    let (old_book, new_book) = state
        .services
        .ratings
        .move_review(request.old_book_id, request.new_book_id, request.rating)
        .await?;
    Ok(Json(MoveRatingResponse { old_book, new_book }))
}
