//! auth-service: authentication and authorization for the job
//! platform. Local email/password sessions, Google OAuth2 sign-in,
//! role checks, and secret-gated admin promotion.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use service_core::error::AppError;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{AuthConfig, SwaggerMode};
use crate::services::{AdminService, AuthService, GoogleOAuthService, JwtService, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub store: Arc<dyn UserStore>,
    pub jwt: JwtService,
    pub auth_service: AuthService,
    pub oauth_service: GoogleOAuthService,
    pub admin_service: AdminService,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::oauth::google_authorization_url,
        handlers::oauth::google_callback,
        handlers::oauth::google_callback_post,
        handlers::admin::admin_login,
        handlers::admin::promote,
        handlers::admin::verify,
        handlers::user::get_me,
    ),
    components(schemas(
        dtos::auth::RegisterRequest,
        dtos::auth::LoginRequest,
        dtos::auth::TokenResponse,
        dtos::auth::AuthResponse,
        dtos::auth::AuthorizationUrlResponse,
        dtos::auth::OAuthCallbackParams,
        dtos::admin::AdminLoginRequest,
        dtos::admin::PromoteRequest,
        dtos::admin::AdminVerifyResponse,
        models::SanitizedUser,
        models::UserRole,
        services::OAuthAction,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Local authentication"),
        (name = "oauth2", description = "Federated authentication"),
        (name = "admin", description = "Privilege escalation and admin sessions"),
        (name = "users", description = "Current user"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let origins: Vec<HeaderValue> = state
        .config
        .security
        .allowed_origins
        .iter()
        .map(|origin| {
            origin.parse::<HeaderValue>().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin {}: {}", origin, e))
            })
        })
        .collect::<Result<_, _>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route("/users/me", get(handlers::user::get_me))
        .route("/admin/verify", get(handlers::admin::verify))
        .route_layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    let mut router = Router::new().route("/health", get(health_check));

    if state.config.swagger.enabled == SwaggerMode::Public {
        router = router
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    Ok(router
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh-token", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
        .route(
            "/auth/oauth2/google/url",
            get(handlers::oauth::google_authorization_url),
        )
        .route(
            "/auth/oauth2/google/callback",
            get(handlers::oauth::google_callback).post(handlers::oauth::google_callback_post),
        )
        .route("/admin/login", post(handlers::admin::admin_login))
        .route("/admin/promote", post(handlers::admin::promote))
        .merge(protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}
