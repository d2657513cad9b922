//! Checkout (borrow/return) endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::checkout::{BorrowRequest, Checkout},
};

/// Return response with the closed checkout
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
    /// Closed checkout
    pub checkout: Checkout,
}

/// Borrow one copy of a book
#[utoipa::path(
    post,
    path = "/checkouts",
    tag = "checkouts",
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Copy lent", body = Checkout),
        (status = 400, description = "Invalid loan length"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "No copy available or book retired")
    )
)]
pub async fn borrow(
    State(state): State<crate::AppState>,
    Json(request): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<Checkout>)> {
    request.validate()?;

    let checkout = state
        .services
        .checkouts
        .borrow(request.book_id, request.borrower_id, request.loan_days)
        .await?;

    Ok((StatusCode::CREATED, Json(checkout)))
}

/// Get a checkout
#[utoipa::path(
    get,
    path = "/checkouts/{id}",
    tag = "checkouts",
    params(
        ("id" = i32, Path, description = "Checkout ID")
    ),
    responses(
        (status = 200, description = "Checkout details", body = Checkout),
        (status = 404, description = "Checkout not found")
    )
)]
pub async fn get_checkout(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Checkout>> {
    let checkout = state.services.checkouts.get_checkout(id).await?;
    Ok(Json(checkout))
}

/// Return a borrowed copy
#[utoipa::path(
    post,
    path = "/checkouts/{id}/return",
    tag = "checkouts",
    params(
        ("id" = i32, Path, description = "Checkout ID")
    ),
    responses(
        (status = 200, description = "Copy returned", body = ReturnResponse),
        (status = 404, description = "Checkout not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_checkout(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    let checkout = state.services.checkouts.return_checkout(id).await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        checkout,
    }))
}

/// Open checkouts of a borrower
#[utoipa::path(
    get,
    path = "/borrowers/{id}/checkouts",
    tag = "checkouts",
    params(
        ("id" = i32, Path, description = "Borrower ID")
    ),
    responses(
        (status = 200, description = "Open checkouts, soonest due first", body = Vec<Checkout>)
    )
)]
pub async fn get_borrower_checkouts(
    State(state): State<crate::AppState>,
    Path(borrower_id): Path<i32>,
) -> AppResult<Json<Vec<Checkout>>> {
    let checkouts = state.services.checkouts.active_for_borrower(borrower_id).await?;
    Ok(Json(checkouts))
}
