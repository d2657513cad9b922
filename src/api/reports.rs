//! Reporting endpoints: point-in-time predicates over ledger state

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppResult;

#[derive(Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub book_id: i32,
    pub available: bool,
}

#[derive(Serialize, ToSchema)]
pub struct OnTimeResponse {
    pub checkout_id: i32,
    /// Null while the checkout is open
    pub on_time: Option<bool>,
}

/// Borrow count query (inclusive range)
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BorrowedRangeQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct BorrowedCountResponse {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub count: i64,
}

/// Whether a book can be borrowed right now
#[utoipa::path(
    get,
    path = "/books/{id}/available",
    tag = "reports",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Availability", body = AvailabilityResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn is_available(
    State(state): State<crate::AppState>,
    Path(book_id): Path<i32>,
) -> AppResult<Json<AvailabilityResponse>> {
    let available = state.services.reports.is_available(book_id).await?;
    Ok(Json(AvailabilityResponse { book_id, available }))
}

/// Whether a checkout came back by its due date
#[utoipa::path(
    get,
    path = "/checkouts/{id}/on-time",
    tag = "reports",
    params(
        ("id" = i32, Path, description = "Checkout ID")
    ),
    responses(
        (status = 200, description = "On-time status", body = OnTimeResponse),
        (status = 404, description = "Checkout not found")
    )
)]
pub async fn is_on_time(
    State(state): State<crate::AppState>,
    Path(checkout_id): Path<i32>,
) -> AppResult<Json<OnTimeResponse>> {
    let on_time = state.services.reports.is_on_time(checkout_id).await?;
    Ok(Json(OnTimeResponse { checkout_id, on_time }))
}

/// Number of checkouts started in a date range
#[utoipa::path(
    get,
    path = "/reports/borrowed",
    tag = "reports",
    params(BorrowedRangeQuery),
    responses(
        (status = 200, description = "Borrow count", body = BorrowedCountResponse),
        (status = 400, description = "Start after end")
    )
)]
pub async fn count_borrowed(
    State(state): State<crate::AppState>,
    Query(query): Query<BorrowedRangeQuery>,
) -> AppResult<Json<BorrowedCountResponse>> {
    let count = state
        .services
        .reports
        .count_borrowed_in_range(query.start, query.end)
        .await?;

    Ok(Json(BorrowedCountResponse {
        start: query.start,
        end: query.end,
        count,
    }))
}
