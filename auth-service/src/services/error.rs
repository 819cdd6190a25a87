use axum::http::StatusCode;
use service_core::error::AppError;
use thiserror::Error;

use super::jwt::TokenError;
use super::store::StoreError;

/// Domain failures raised by the auth flows. Converted to [`AppError`]
/// at the handler boundary so every rejection leaves with a stable
/// machine-readable code.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("No password is set for this account; sign in with the linked provider")]
    PasswordNotSet,

    #[error("User not found")]
    UserNotFound,

    #[error("Email is already registered")]
    DuplicateIdentity,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Expired token")]
    ExpiredToken,

    #[error("Token kind not valid for this operation")]
    WrongTokenKind,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("OAuth2 authentication failed")]
    OAuth2AuthenticationFailed,

    #[error("Invalid OAuth2 token")]
    InvalidOAuth2Token,

    #[error("Expired OAuth2 token")]
    ExpiredOAuth2Token,

    #[error("OAuth2 user info is missing required fields")]
    InvalidOAuth2UserInfo,

    #[error("Identity provider did not respond in time")]
    OAuth2ExchangeTimeout,

    #[error("Redirect URI is not allowed")]
    RedirectUriNotAllowed,

    #[error("Forbidden")]
    Forbidden,

    #[error("User is already an administrator")]
    AlreadyAdmin,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken => ServiceError::InvalidToken,
            TokenError::ExpiredToken => ServiceError::ExpiredToken,
            TokenError::WrongKind => ServiceError::WrongTokenKind,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        fn service(status: StatusCode, code: &'static str, message: String) -> AppError {
            AppError::Service {
                status,
                code,
                message,
            }
        }

        let message = err.to_string();
        match err {
            ServiceError::InvalidCredentials => {
                service(StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", message)
            }
            ServiceError::PasswordNotSet => service(StatusCode::UNAUTHORIZED, "PASSWORD_NOT_SET", message),
            ServiceError::UserNotFound => service(StatusCode::NOT_FOUND, "USER_NOT_FOUND", message),
            ServiceError::DuplicateIdentity => service(StatusCode::CONFLICT, "DUPLICATE_IDENTITY", message),
            ServiceError::InvalidToken => service(StatusCode::UNAUTHORIZED, "INVALID_TOKEN", message),
            ServiceError::ExpiredToken => service(StatusCode::UNAUTHORIZED, "EXPIRED_TOKEN", message),
            ServiceError::WrongTokenKind => service(StatusCode::UNAUTHORIZED, "WRONG_TOKEN_KIND", message),
            ServiceError::InvalidRefreshToken => {
                service(StatusCode::UNAUTHORIZED, "INVALID_REFRESH_TOKEN", message)
            }
            ServiceError::OAuth2AuthenticationFailed => {
                service(StatusCode::UNAUTHORIZED, "OAUTH2_AUTHENTICATION_FAILED", message)
            }
            ServiceError::InvalidOAuth2Token => {
                service(StatusCode::UNAUTHORIZED, "INVALID_OAUTH2_TOKEN", message)
            }
            ServiceError::ExpiredOAuth2Token => {
                service(StatusCode::UNAUTHORIZED, "EXPIRED_OAUTH2_TOKEN", message)
            }
            ServiceError::InvalidOAuth2UserInfo => {
                service(StatusCode::BAD_REQUEST, "INVALID_OAUTH2_USER_INFO", message)
            }
            ServiceError::OAuth2ExchangeTimeout => {
                service(StatusCode::GATEWAY_TIMEOUT, "OAUTH2_EXCHANGE_TIMEOUT", message)
            }
            ServiceError::RedirectUriNotAllowed => {
                service(StatusCode::BAD_REQUEST, "REDIRECT_URI_NOT_ALLOWED", message)
            }
            ServiceError::Forbidden => service(StatusCode::FORBIDDEN, "FORBIDDEN", message),
            ServiceError::AlreadyAdmin => service(StatusCode::CONFLICT, "ALREADY_ADMIN", message),
            ServiceError::Store(StoreError::DuplicateEmail) => AppError::Service {
                status: StatusCode::CONFLICT,
                code: "DUPLICATE_IDENTITY",
                message: StoreError::DuplicateEmail.to_string(),
            },
            ServiceError::Store(StoreError::NotFound) => AppError::Service {
                status: StatusCode::NOT_FOUND,
                code: "USER_NOT_FOUND",
                message: StoreError::NotFound.to_string(),
            },
            ServiceError::Store(other) => AppError::InternalError(anyhow::Error::new(other)),
            ServiceError::Internal(inner) => AppError::InternalError(inner),
        }
    }
}
