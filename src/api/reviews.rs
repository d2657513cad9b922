//! Review endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::review::{CreateReview, Review, UpdateReview},
};

/// Post a review and count its rating
#[utoipa::path(
    post,
    path = "/reviews",
    tag = "reviews",
    request_body = CreateReview,
    responses(
        (status = 201, description = "Review created", body = Review),
        (status = 400, description = "Rating out of range"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_review(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateReview>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let review = state.services.reviews.create_review(request).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Get a review
#[utoipa::path(
    get,
    path = "/reviews/{id}",
    tag = "reviews",
    params(
        ("id" = i32, Path, description = "Review ID")
    ),
    responses(
        (status = 200, description = "Review", body = Review),
        (status = 404, description = "Review not found")
    )
)]
pub async fn get_review(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Review>> {
    let review = state.services.reviews.get_review(id).await?;
    Ok(Json(review))
}

/// Edit a review's rating, comment or book
#[utoipa::path(
    put,
    path = "/reviews/{id}",
    tag = "reviews",
    params(
        ("id" = i32, Path, description = "Review ID")
    ),
    request_body = UpdateReview,
    responses(
        (status = 200, description = "Review updated", body = Review),
        (status = 400, description = "Rating out of range"),
        (status = 404, description = "Review or book not found")
    )
)]
pub async fn update_review(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateReview>,
) -> AppResult<Json<Review>> {
    let review = state.services.reviews.update_review(id, request).await?;
    Ok(Json(review))
}

/// Delete a review and uncount its rating
#[utoipa::path(
    delete,
    path = "/reviews/{id}",
    tag = "reviews",
    params(
        ("id" = i32, Path, description = "Review ID")
    ),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn delete_review(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.reviews.delete_review(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reviews of a book, newest first
#[utoipa::path(
    get,
    path = "/books/{id}/reviews",
    tag = "reviews",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Reviews of the book", body = Vec<Review>),
        (status = 404, description = "Book not found")
    )
)]
pub async fn list_book_reviews(
    State(state): State<crate::AppState>,
    Path(book_id): Path<i32>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = state.services.reviews.list_for_book(book_id).await?;
    Ok(Json(reviews))
}
