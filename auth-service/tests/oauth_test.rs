mod common;

use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;

use auth_service::services::{
    decode_state, GoogleOAuthService, JwtService, OAuthAction, OAuthState, ServiceError,
    UserStore,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use common::*;

#[tokio::test]
async fn authorization_url_carries_role_and_action_in_state() {
    let (app, _) = test_app();

    let uri = format!(
        "/auth/oauth2/google/url?redirect_uri={}&user_type=COMPANY&action=SIGNUP",
        urlencoding::encode(TEST_REDIRECT_URI)
    );
    let (status, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let url = body["data"]["authorization_url"].as_str().unwrap();
    assert!(url.contains("client_id=test-client-id"));
    assert!(url.contains("response_type=code"));

    let raw_state = url
        .split("state=")
        .nth(1)
        .and_then(|s| s.split('&').next())
        .unwrap();
    let decoded = urlencoding::decode(raw_state).unwrap();
    let state = decode_state(Some(&decoded));
    assert_eq!(state.role, Some(auth_service::models::UserRole::Company));
    assert_eq!(state.action, OAuthAction::Signup);
    assert_eq!(state.redirect_uri, TEST_REDIRECT_URI);
    assert!(!state.nonce.is_empty());
}

#[tokio::test]
async fn authorization_url_rejects_unlisted_redirects() {
    let (app, _) = test_app();

    let (status, body) = get(
        &app,
        "/auth/oauth2/google/url?redirect_uri=http://evil.example/cb",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("REDIRECT_URI_NOT_ALLOWED"));
}

#[tokio::test]
async fn callback_without_a_code_is_a_bad_request() {
    let (app, _) = test_app();

    let (status, _) = get(&app, "/auth/oauth2/google/callback?state=whatever").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(
        &app,
        "/auth/oauth2/google/callback",
        json!({"error": "access_denied"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], json!("OAUTH2_AUTHENTICATION_FAILED"));
}

/// Bind a port, then drop the listener so connections to it are
/// refused. The exchange must fail closed without creating a user.
fn dead_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/token", port)
}

#[tokio::test]
async fn unreachable_provider_fails_closed_without_side_effects() {
    let state = test_state();
    let store: Arc<dyn UserStore> = state.store.clone();
    let endpoint = dead_endpoint();
    let oauth = GoogleOAuthService::new(
        state.store.clone(),
        JwtService::new(&state.config.jwt),
        &state.config.google,
    )
    .unwrap()
    .with_endpoints(endpoint.clone(), endpoint);

    let err = oauth
        .handle_callback("some-code", None, Some(TEST_REDIRECT_URI))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::OAuth2AuthenticationFailed));

    let ghost = store.find_by_email("anyone@example.com").await.unwrap();
    assert!(ghost.is_none());
}

#[tokio::test]
async fn forged_state_redirect_is_still_allowlist_checked() {
    let state = test_state();
    let endpoint = dead_endpoint();
    let oauth = GoogleOAuthService::new(
        state.store.clone(),
        JwtService::new(&state.config.jwt),
        &state.config.google,
    )
    .unwrap()
    .with_endpoints(endpoint.clone(), endpoint);

    // A client can mint its own state blob; an unlisted redirect inside
    // it must be rejected, not handed to the code exchange.
    let forged = OAuthState {
        nonce: "forged".to_string(),
        role: None,
        action: OAuthAction::Signup,
        redirect_uri: "http://evil.example/cb".to_string(),
    };
    let blob = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());

    let err = oauth
        .handle_callback("some-code", Some(&blob), None)
        .await
        .unwrap_err();
    // A reached exchange would surface OAuth2AuthenticationFailed here
    // (the endpoint is dead), so this proves the gate fired first.
    assert!(matches!(err, ServiceError::RedirectUriNotAllowed));
}

#[tokio::test]
async fn callback_redirect_uri_must_be_allowlisted_before_any_exchange() {
    let state = test_state();

    let err = state
        .oauth_service
        .handle_callback("some-code", None, Some("http://evil.example/cb"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::RedirectUriNotAllowed));
}
