use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{SanitizedUser, UserRole};
use crate::services::oauth::OAuthAction;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: String,
    /// Requested role; defaults to GENERAL. ADMIN is rejected here.
    #[serde(default)]
    pub user_type: Option<UserRole>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: SanitizedUser,
    pub tokens: TokenResponse,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct GoogleUrlQuery {
    /// Must exactly match an entry in the configured redirect allowlist.
    pub redirect_uri: String,
    pub user_type: Option<UserRole>,
    pub action: Option<OAuthAction>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorizationUrlResponse {
    pub authorization_url: String,
}

/// Callback parameters, accepted both as query string (GET redirect
/// from the provider) and as a JSON body (POST from a frontend that
/// captured the redirect).
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub redirect_uri: Option<String>,
    /// Set by the provider when the user denied consent.
    pub error: Option<String>,
}
