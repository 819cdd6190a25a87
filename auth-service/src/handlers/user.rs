use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::dtos::ApiResponse;
use crate::middleware::AuthUser;
use crate::models::SanitizedUser;
use crate::services::ServiceError;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user profile", body = SanitizedUser),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Account no longer exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<SanitizedUser>>, AppError> {
    let user = state
        .store
        .find_by_id(claims.user_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::UserNotFound)?;

    Ok(Json(ApiResponse::ok("Profile", user.sanitized())))
}
