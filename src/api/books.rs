//! Book inventory endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::book::{Book, CreateBook, ResizeInventory},
};

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid copy count or title")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.services.inventory.create_book(request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Get a book with its stock and rating
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.inventory.get_book(id).await?;
    Ok(Json(book))
}

/// Change the number of copies owned
#[utoipa::path(
    put,
    path = "/books/{id}/inventory",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = ResizeInventory,
    responses(
        (status = 200, description = "Inventory resized", body = Book),
        (status = 400, description = "Negative total"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn resize_inventory(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<ResizeInventory>,
) -> AppResult<Json<Book>> {
    let book = state
        .services
        .inventory
        .resize_inventory(id, request.total_copies)
        .await?;
    Ok(Json(book))
}

/// Withdraw a book from lending
#[utoipa::path(
    post,
    path = "/books/{id}/retire",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book retired", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn retire_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.inventory.retire(id).await?;
    Ok(Json(book))
}

/// Put a retired book back into circulation
#[utoipa::path(
    post,
    path = "/books/{id}/unretire",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book active again", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn unretire_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.inventory.unretire(id).await?;
    Ok(Json(book))
}
