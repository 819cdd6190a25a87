#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use auth_service::config::{
    AuthConfig, Environment, GoogleOAuthConfig, JwtConfig, SecurityConfig, SwaggerConfig,
    SwaggerMode,
};
use auth_service::services::{
    AdminService, AuthService, GoogleOAuthService, InMemoryUserStore, JwtService, UserStore,
};
use auth_service::{build_router, AppState};

pub const TEST_ADMIN_SECRET: &str = "integration-admin-secret";
pub const TEST_REDIRECT_URI: &str = "http://localhost:3000/oauth/callback";

pub fn test_config() -> AuthConfig {
    AuthConfig {
        common: service_core::config::Config {
            host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            port: 8080,
        },
        environment: Environment::Dev,
        service_name: "auth-service-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "warn".to_string(),
        jwt: JwtConfig {
            secret: "integration-test-secret-0123456789abcdef".to_string(),
            access_token_expiry_hours: 24,
            refresh_token_expiry_days: 7,
        },
        google: GoogleOAuthConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_uris: vec![TEST_REDIRECT_URI.to_string()],
            exchange_timeout_seconds: 2,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            admin_secret_key: TEST_ADMIN_SECRET.to_string(),
        },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Disabled,
        },
    }
}

pub fn test_state() -> AppState {
    let config = test_config();
    let store: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
    let jwt = JwtService::new(&config.jwt);

    AppState {
        store: store.clone(),
        jwt: jwt.clone(),
        auth_service: AuthService::new(store.clone(), jwt.clone()),
        oauth_service: GoogleOAuthService::new(store.clone(), jwt.clone(), &config.google)
            .expect("oauth service"),
        admin_service: AdminService::new(store, jwt, config.security.admin_secret_key.clone()),
        config,
    }
}

pub fn test_app() -> (Router, AppState) {
    let state = test_state();
    let app = build_router(state.clone()).expect("router");
    (app, state)
}

async fn dispatch(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    dispatch(app, request).await
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    dispatch(app, request).await
}

pub async fn request_with_bearer(
    app: &Router,
    method: Method,
    uri: &str,
    token: &str,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    dispatch(app, request).await
}

/// Register a user and return the response body (asserts success).
pub async fn register_user(app: &Router, email: &str, password: &str) -> Value {
    let (status, body) = post_json(
        app,
        "/auth/register",
        json!({
            "email": email,
            "password": password,
            "name": "Test User",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {}", body);
    body
}

pub fn access_token(body: &Value) -> String {
    body["data"]["tokens"]["access_token"]
        .as_str()
        .expect("access token")
        .to_string()
}

pub fn refresh_token(body: &Value) -> String {
    body["data"]["tokens"]["refresh_token"]
        .as_str()
        .expect("refresh token")
        .to_string()
}
