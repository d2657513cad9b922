//! API integration tests
//!
//! The router runs in-process over the in-memory store; no server or
//! database is needed.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use lending_ledger::{api, repository::Repository, AppConfig, AppState};

fn app() -> Router {
    api::router(AppState::new(AppConfig::default(), Repository::in_memory()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(format!("/api/v1{}", uri))
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("Failed to send request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Failed to parse response")
    };
    (status, body)
}

async fn create_book(app: &Router, total_copies: i32) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/books",
        Some(json!({ "title": "The Name of the Rose", "author": "Umberto Eco", "total_copies": total_copies })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().expect("No id in response")
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_create_book_validation() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": "Empty shelf", "total_copies": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_borrow_and_return_scenario() {
    let app = app();
    let book_id = create_book(&app, 1).await;

    let (status, first) = send(
        &app,
        Method::POST,
        "/checkouts",
        Some(json!({ "book_id": book_id, "borrower_id": 1, "loan_days": 14 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(first["return_date"].is_null());

    let (_, book) = send(&app, Method::GET, &format!("/books/{}", book_id), None).await;
    assert_eq!(book["available_copies"], 0);

    let (status, body) = send(
        &app,
        Method::POST,
        "/checkouts",
        Some(json!({ "book_id": book_id, "borrower_id": 2, "loan_days": 14 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "OutOfStock");

    let checkout_id = first["id"].as_i64().unwrap();
    let (status, _) = send(&app, Method::GET, &format!("/checkouts/{}/on-time", checkout_id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::POST, &format!("/checkouts/{}/return", checkout_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "returned");
    assert_eq!(body["checkout"]["is_late"], false);

    let (status, body) = send(&app, Method::POST, &format!("/checkouts/{}/return", checkout_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "AlreadyReturned");

    let (_, body) = send(&app, Method::GET, &format!("/books/{}/available", book_id), None).await;
    assert_eq!(body["available"], true);

    let (_, body) = send(&app, Method::GET, &format!("/checkouts/{}/on-time", checkout_id), None).await;
    assert_eq!(body["on_time"], true);
}

#[tokio::test]
async fn test_retired_book_is_refused() {
    let app = app();
    let book_id = create_book(&app, 2).await;

    let (status, body) = send(&app, Method::POST, &format!("/books/{}/retire", book_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "retired");

    let (status, body) = send(
        &app,
        Method::POST,
        "/checkouts",
        Some(json!({ "book_id": book_id, "borrower_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "RetiredBook");

    let (status, _) = send(&app, Method::POST, &format!("/books/{}/unretire", book_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        Method::POST,
        "/checkouts",
        Some(json!({ "book_id": book_id, "borrower_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_resize_inventory() {
    let app = app();
    let book_id = create_book(&app, 3).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/books/{}/inventory", book_id),
        Some(json!({ "total_copies": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_copies"], 1);
    assert_eq!(body["available_copies"], 1);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/books/999/inventory",
        Some(json!({ "total_copies": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchBook");
}

#[tokio::test]
async fn test_review_aggregates() {
    let app = app();
    let book_id = create_book(&app, 1).await;

    let mut review_ids = Vec::new();
    for rating in [5, 3, 4] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/reviews",
            Some(json!({ "book_id": book_id, "reviewer_id": 3, "rating": rating })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        review_ids.push(body["id"].as_i64().unwrap());
    }

    let (_, book) = send(&app, Method::GET, &format!("/books/{}", book_id), None).await;
    assert_eq!(book["rating_count"], 3);
    assert_eq!(book["rating_sum"], 12);

    let (status, _) = send(&app, Method::DELETE, &format!("/reviews/{}", review_ids[1]), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, book) = send(&app, Method::GET, &format!("/books/{}", book_id), None).await;
    assert_eq!(book["rating_count"], 2);
    assert_eq!(book["rating_sum"], 9);

    let (_, reviews) = send(&app, Method::GET, &format!("/books/{}/reviews", book_id), None).await;
    assert_eq!(reviews.as_array().map(Vec::len), Some(2));

    let (status, _) = send(
        &app,
        Method::POST,
        "/reviews",
        Some(json!({ "book_id": book_id, "reviewer_id": 3, "rating": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_borrowed_range_report() {
    let app = app();
    let book_id = create_book(&app, 2).await;
    for borrower in [1, 2] {
        send(
            &app,
            Method::POST,
            "/checkouts",
            Some(json!({ "book_id": book_id, "borrower_id": borrower })),
        )
        .await;
    }

    let (status, body) = send(
        &app,
        Method::GET,
        "/reports/borrowed?start=2000-01-01T00:00:00Z&end=2999-01-01T00:00:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let (status, _) = send(
        &app,
        Method::GET,
        "/reports/borrowed?start=2999-01-01T00:00:00Z&end=2000-01-01T00:00:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_borrows_of_last_copy() {
    let app = app();
    let book_id = create_book(&app, 1).await;

    let request = |borrower: i64| {
        let app = app.clone();
        tokio::spawn(async move {
            send(
                &app,
                Method::POST,
                "/checkouts",
                Some(json!({ "book_id": book_id, "borrower_id": borrower })),
            )
            .await
            .0
        })
    };
    let (a, b) = (request(1), request(2));
    let mut statuses = vec![a.await.unwrap(), b.await.unwrap()];
    statuses.sort();

    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);

    let (_, book) = send(&app, Method::GET, &format!("/books/{}", book_id), None).await;
    assert_eq!(book["available_copies"], 0);
}

#[tokio::test]
async fn test_rating_aggregate_routes() {
    let app = app();
    let from = create_book(&app, 1).await;
    let to = create_book(&app, 1).await;

    for rating in [5, 3, 4] {
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/books/{}/ratings", from),
            Some(json!({ "rating": rating })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, book) = send(
        &app,
        Method::POST,
        &format!("/books/{}/ratings/remove", from),
        Some(json!({ "rating": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["rating_count"], 2);
    assert_eq!(book["rating_sum"], 9);

    let (status, book) = send(
        &app,
        Method::PUT,
        &format!("/books/{}/ratings", from),
        Some(json!({ "old_rating": 4, "new_rating": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["rating_sum"], 6);

    let (status, body) = send(
        &app,
        Method::POST,
        "/ratings/move",
        Some(json!({ "old_book_id": from, "new_book_id": to, "rating": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["old_book"]["rating_count"], 1);
    assert_eq!(body["new_book"]["rating_sum"], 5);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/books/{}/ratings/remove", to),
        Some(json!({ "rating": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_review_edits_keep_rating_sum() {
    let app = app();
    let book_id = create_book(&app, 1).await;
    let (_, created) = send(
        &app,
        Method::POST,
        "/reviews",
        Some(json!({ "book_id": book_id, "reviewer_id": 4, "rating": 1 })),
    )
    .await;
    let review_id = created["id"].as_i64().unwrap();

    let handles: Vec<_> = [4, 5, 2]
        .into_iter()
        .map(|rating| {
            let app = app.clone();
            tokio::spawn(async move {
                send(
                    &app,
                    Method::PUT,
                    &format!("/reviews/{}", review_id),
                    Some(json!({ "rating": rating })),
                )
                .await
                .0
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    let (_, review) = send(&app, Method::GET, &format!("/reviews/{}", review_id), None).await;
    let (_, book) = send(&app, Method::GET, &format!("/books/{}", book_id), None).await;
    assert_eq!(book["rating_count"], 1);
    assert_eq!(book["rating_sum"], review["rating"]);
}
