use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::dtos::admin::{AdminLoginRequest, AdminVerifyResponse, PromoteRequest};
use crate::dtos::auth::AuthResponse;
use crate::dtos::ApiResponse;
use crate::middleware::AuthUser;
use crate::utils::validation::ValidatedJson;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/admin/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Admin session issued"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account is not an administrator"),
    ),
    tag = "admin"
)]
pub async fn admin_login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AdminLoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let response = state
        .admin_service
        .admin_login(&req.email, &req.password)
        .await?;
    Ok(Json(ApiResponse::ok("Admin login successful", response)))
}

#[utoipa::path(
    post,
    path = "/admin/promote",
    request_body = PromoteRequest,
    responses(
        (status = 200, description = "Account promoted to admin"),
        (status = 403, description = "Wrong promotion secret"),
        (status = 404, description = "Unknown email"),
        (status = 409, description = "Already an admin"),
    ),
    tag = "admin"
)]
pub async fn promote(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PromoteRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state
        .admin_service
        .promote(&req.email, &req.secret_key)
        .await?;
    Ok(Json(ApiResponse::message("User promoted to admin")))
}

/// Confirms the caller still holds ADMIN against the stored record,
/// not just the token claims.
#[utoipa::path(
    get,
    path = "/admin/verify",
    responses(
        (status = 200, description = "Caller is an administrator"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an administrator"),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn verify(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<AdminVerifyResponse>>, AppError> {
    let user = state.admin_service.verify(claims.user_id).await?;
    Ok(Json(ApiResponse::ok(
        "Admin verified",
        AdminVerifyResponse {
            is_admin: true,
            user_id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        },
    )))
}
