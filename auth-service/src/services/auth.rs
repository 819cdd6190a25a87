use chrono::Utc;
use std::sync::Arc;

use crate::dtos::auth::{AuthResponse, LoginRequest, RegisterRequest, TokenResponse};
use crate::models::{NewUser, UserRole};
use crate::utils::password::{hash_password, verify_password, Password};

use super::error::ServiceError;
use super::jwt::{JwtService, TokenError, TokenKind};
use super::store::{StoreError, UserStore};

/// Local email/password authentication flows.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, jwt: JwtService) -> Self {
        AuthService { store, jwt }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, ServiceError> {
        let role = match req.user_type.unwrap_or(UserRole::General) {
            // ADMIN is only reachable through explicit promotion.
            UserRole::Admin => return Err(ServiceError::Forbidden),
            role => role,
        };

        let password_hash = hash_password(&Password::new(req.password))?;

        let user = self
            .store
            .insert(NewUser {
                email: req.email.trim().to_string(),
                password_hash: Some(password_hash),
                name: req.name.trim().to_string(),
                role,
                oauth_provider: None,
                email_verified: false,
            })
            .await
            .map_err(|e| match e {
                StoreError::DuplicateEmail => ServiceError::DuplicateIdentity,
                other => ServiceError::Store(other),
            })?;

        tracing::info!(user_id = user.id, role = %user.role, "User registered");

        let (access_token, refresh_token) = self.jwt.issue_token_pair(&user)?;
        Ok(AuthResponse {
            user: user.sanitized(),
            tokens: TokenResponse::new(
                access_token,
                refresh_token,
                self.jwt.access_token_expiry_seconds(),
            ),
        })
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, ServiceError> {
        let mut user = self
            .store
            .find_by_email(&req.email)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let stored_hash = user
            .password_hash
            .as_deref()
            .ok_or(ServiceError::PasswordNotSet)?;

        if !verify_password(&Password::new(req.password), stored_hash)? {
            tracing::debug!(user_id = user.id, "Password mismatch");
            return Err(ServiceError::InvalidCredentials);
        }

        let now = Utc::now();
        user.last_login_at = Some(now);
        user.updated_at = now;
        self.store.update(&user).await?;

        tracing::info!(user_id = user.id, "User logged in");

        let (access_token, refresh_token) = self.jwt.issue_token_pair(&user)?;
        Ok(AuthResponse {
            user: user.sanitized(),
            tokens: TokenResponse::new(
                access_token,
                refresh_token,
                self.jwt.access_token_expiry_seconds(),
            ),
        })
    }

    /// Rotate a session: verify the refresh token, re-resolve the
    /// identity, and mint a fresh pair. Claims are rebuilt from the
    /// current record, so a promotion since issuance is reflected and
    /// a deleted account is cut off.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ServiceError> {
        let claims = self
            .jwt
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|e| match e {
                TokenError::WrongKind => ServiceError::WrongTokenKind,
                // Expired and malformed refresh input are one kind to
                // the client: present a fresh login either way.
                TokenError::ExpiredToken | TokenError::InvalidToken => {
                    ServiceError::InvalidRefreshToken
                }
            })?;

        let user = self
            .store
            .find_by_id(claims.user_id)
            .await?
            .ok_or(ServiceError::InvalidRefreshToken)?;

        let (access_token, refresh_token) = self.jwt.issue_token_pair(&user)?;
        Ok(TokenResponse::new(
            access_token,
            refresh_token,
            self.jwt.access_token_expiry_seconds(),
        ))
    }

    /// Sessions are stateless JWTs; nothing is revoked server-side.
    /// The endpoint exists so clients have a uniform sign-out call.
    pub fn logout(&self) {
        tracing::debug!("Logout acknowledged (stateless tokens, nothing revoked)");
    }
}
