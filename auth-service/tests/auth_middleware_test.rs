mod common;

use axum::http::{header, Method, Request, StatusCode};
use axum::body::Body;
use serde_json::json;
use tower::util::ServiceExt;

use common::*;

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let (app, _) = test_app();

    let (status, body) = get(&app, "/users/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn garbage_and_non_bearer_headers_are_rejected() {
    let (app, _) = test_app();

    let (status, body) = request_with_bearer(&app, Method::GET, "/users/me", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], json!("INVALID_TOKEN"));

    let request = Request::builder()
        .method(Method::GET)
        .uri("/users/me")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_tokens_cannot_reach_protected_routes() {
    let (app, _) = test_app();
    let body = register_user(&app, "judy@example.com", "password123").await;

    let (status, response) =
        request_with_bearer(&app, Method::GET, "/users/me", &refresh_token(&body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["code"], json!("WRONG_TOKEN_KIND"));
}

#[tokio::test]
async fn access_token_resolves_the_current_user() {
    let (app, _) = test_app();
    let body = register_user(&app, "ken@example.com", "password123").await;

    let (status, response) =
        request_with_bearer(&app, Method::GET, "/users/me", &access_token(&body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["email"], json!("ken@example.com"));
    assert_eq!(response["data"]["role"], json!("GENERAL"));
    assert!(response["data"].get("password_hash").is_none());
}
