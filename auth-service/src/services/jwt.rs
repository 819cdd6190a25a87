use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::JwtConfig;
use crate::models::{User, UserRole};

/// Discriminates the two token flavors minted for a session. The kind
/// is embedded in the claims so an access token can never be replayed
/// against the refresh endpoint or vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the identity's email address.
    pub sub: String,
    pub user_id: i64,
    pub role: UserRole,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token")]
    InvalidToken,
    #[error("expired token")]
    ExpiredToken,
    #[error("wrong token kind")]
    WrongKind,
}

/// Issues and verifies HS256-signed JWTs.
///
/// Verification uses zero leeway: a token is rejected the instant its
/// `exp` passes.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry_hours: i64,
    refresh_token_expiry_days: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        JwtService {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_token_expiry_hours: config.access_token_expiry_hours,
            refresh_token_expiry_days: config.refresh_token_expiry_days,
        }
    }

    pub fn issue_access_token(&self, user: &User) -> Result<String> {
        self.issue(user, TokenKind::Access)
    }

    pub fn issue_refresh_token(&self, user: &User) -> Result<String> {
        self.issue(user, TokenKind::Refresh)
    }

    /// Mint a fresh access/refresh pair from the current user record.
    pub fn issue_token_pair(&self, user: &User) -> Result<(String, String)> {
        Ok((
            self.issue_access_token(user)?,
            self.issue_refresh_token(user)?,
        ))
    }

    fn issue(&self, user: &User, kind: TokenKind) -> Result<String> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => Duration::hours(self.access_token_expiry_hours),
            TokenKind::Refresh => Duration::days(self.refresh_token_expiry_days),
        };

        let claims = Claims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to sign JWT")
    }

    /// Verify signature, expiry, and kind. Kind is checked only after
    /// the signature and expiry pass, so a forged token never reaches
    /// the kind comparison.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::ExpiredToken,
                _ => TokenError::InvalidToken,
            })?;

        if data.claims.kind != expected {
            return Err(TokenError::WrongKind);
        }

        Ok(data.claims)
    }

    /// Claim accessors operate on access tokens only; handing them a
    /// refresh token fails with [`TokenError::WrongKind`].
    pub fn extract_user_id(&self, token: &str) -> Result<i64, TokenError> {
        Ok(self.verify(token, TokenKind::Access)?.user_id)
    }

    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        Ok(self.verify(token, TokenKind::Access)?.sub)
    }

    pub fn extract_role(&self, token: &str) -> Result<UserRole, TokenError> {
        Ok(self.verify(token, TokenKind::Access)?.role)
    }

    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.access_token_expiry_hours * 3600
    }
}
