use axum::{extract::State, http::HeaderMap, Json};
use service_core::error::AppError;

use crate::dtos::auth::{AuthResponse, LoginRequest, RegisterRequest, TokenResponse};
use crate::dtos::ApiResponse;
use crate::middleware::bearer_token;
use crate::utils::validation::ValidatedJson;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created, session issued"),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation failed"),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let response = state.auth_service.register(req).await?;
    Ok(Json(ApiResponse::ok("Registration successful", response)))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued"),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "Unknown email"),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let response = state.auth_service.login(req).await?;
    Ok(Json(ApiResponse::ok("Login successful", response)))
}

/// Expects the refresh token as `Authorization: Bearer <refresh>`.
#[utoipa::path(
    post,
    path = "/auth/refresh-token",
    responses(
        (status = 200, description = "New token pair issued"),
        (status = 400, description = "Missing or malformed Authorization header"),
        (status = 401, description = "Invalid, expired, or wrong-kind token"),
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<TokenResponse>>, AppError> {
    let token = bearer_token(&headers).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("Missing or malformed Authorization header"))
    })?;

    let tokens = state.auth_service.refresh(token).await?;
    Ok(Json(ApiResponse::ok("Token refreshed", tokens)))
}

/// Acknowledged unconditionally; tokens are stateless so there is
/// nothing to revoke server-side.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Logout acknowledged")),
    tag = "auth"
)]
pub async fn logout(State(state): State<AppState>) -> Json<ApiResponse<()>> {
    state.auth_service.logout();
    Json(ApiResponse::message("Logged out"))
}
