use std::sync::Arc;

use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use tokio::net::TcpListener;

use auth_service::config::AuthConfig;
use auth_service::services::{
    AdminService, AuthService, GoogleOAuthService, InMemoryUserStore, JwtService, UserStore,
};
use auth_service::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AuthConfig::from_env()?;
    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting auth service"
    );

    let store: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
    let jwt = JwtService::new(&config.jwt);
    let auth_service = AuthService::new(store.clone(), jwt.clone());
    let oauth_service = GoogleOAuthService::new(store.clone(), jwt.clone(), &config.google)?;
    let admin_service = AdminService::new(
        store.clone(),
        jwt.clone(),
        config.security.admin_secret_key.clone(),
    );

    let state = AppState {
        config: config.clone(),
        store,
        jwt,
        auth_service,
        oauth_service,
        admin_service,
    };

    let app = build_router(state)?;

    let addr = config.common.socket_addr();
    tracing::info!(address = %addr, "Listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
