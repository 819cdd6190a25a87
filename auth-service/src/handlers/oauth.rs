use axum::{
    extract::{Query, State},
    Json,
};
use service_core::error::AppError;

use crate::dtos::auth::{
    AuthResponse, AuthorizationUrlResponse, GoogleUrlQuery, OAuthCallbackParams,
};
use crate::dtos::ApiResponse;
use crate::services::{OAuthAction, ServiceError};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/auth/oauth2/google/url",
    params(GoogleUrlQuery),
    responses(
        (status = 200, description = "Authorization URL built"),
        (status = 400, description = "Redirect URI not in the allowlist"),
    ),
    tag = "oauth2"
)]
pub async fn google_authorization_url(
    State(state): State<AppState>,
    Query(query): Query<GoogleUrlQuery>,
) -> Result<Json<ApiResponse<AuthorizationUrlResponse>>, AppError> {
    let authorization_url = state.oauth_service.build_authorization_url(
        &query.redirect_uri,
        query.user_type,
        query.action.unwrap_or(OAuthAction::Signup),
    )?;

    Ok(Json(ApiResponse::ok(
        "Authorization URL generated",
        AuthorizationUrlResponse { authorization_url },
    )))
}

/// Provider redirect target (GET with query parameters).
#[utoipa::path(
    get,
    path = "/auth/oauth2/google/callback",
    params(OAuthCallbackParams),
    responses(
        (status = 200, description = "Session issued"),
        (status = 400, description = "Missing code or provider error"),
        (status = 401, description = "Exchange or verification failed"),
        (status = 504, description = "Provider did not respond in time"),
    ),
    tag = "oauth2"
)]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<OAuthCallbackParams>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    complete_callback(state, params).await
}

/// Same flow for frontends that capture the redirect and POST it on.
#[utoipa::path(
    post,
    path = "/auth/oauth2/google/callback",
    request_body = OAuthCallbackParams,
    responses(
        (status = 200, description = "Session issued"),
        (status = 400, description = "Missing code or provider error"),
        (status = 401, description = "Exchange or verification failed"),
        (status = 504, description = "Provider did not respond in time"),
    ),
    tag = "oauth2"
)]
pub async fn google_callback_post(
    State(state): State<AppState>,
    Json(params): Json<OAuthCallbackParams>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    complete_callback(state, params).await
}

async fn complete_callback(
    state: AppState,
    params: OAuthCallbackParams,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    if let Some(error) = params.error.as_deref() {
        tracing::warn!(error, "Provider returned an error on callback");
        return Err(ServiceError::OAuth2AuthenticationFailed.into());
    }

    let code = params
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing authorization code")))?;

    let response = state
        .oauth_service
        .handle_callback(code, params.state.as_deref(), params.redirect_uri.as_deref())
        .await?;

    Ok(Json(ApiResponse::ok("OAuth2 login successful", response)))
}
