use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::GoogleOAuthConfig;
use crate::dtos::auth::{AuthResponse, TokenResponse};
use crate::models::{NewUser, User, UserRole};

use super::error::ServiceError;
use super::jwt::JwtService;
use super::store::UserStore;

const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_TOKENINFO_ENDPOINT: &str = "https://oauth2.googleapis.com/tokeninfo";

const PROVIDER_NAME: &str = "google";
const ACCEPTED_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// What the caller wants done with the federated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum OAuthAction {
    /// Find-or-create: sign an existing account in, or mint one.
    #[serde(alias = "signup")]
    Signup,
    /// Attach the provider to an account that must already exist.
    #[serde(alias = "link")]
    Link,
}

/// Round-tripped through the provider as an opaque base64url blob.
/// Decoding is deliberately lenient: a missing or mangled state falls
/// back to the safest interpretation instead of failing the callback.
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuthState {
    pub nonce: String,
    pub role: Option<UserRole>,
    pub action: OAuthAction,
    pub redirect_uri: String,
}

impl Default for OAuthState {
    fn default() -> Self {
        OAuthState {
            nonce: String::new(),
            role: None,
            action: OAuthAction::Signup,
            redirect_uri: String::new(),
        }
    }
}

/// Token endpoint response. Only `id_token` is consumed; the Google
/// access token is never stored or forwarded.
#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    id_token: Option<String>,
}

/// Claims as reported by the tokeninfo endpoint, which stringifies
/// every value.
#[derive(Debug, Deserialize)]
struct GoogleIdClaims {
    aud: String,
    iss: String,
    exp: String,
    email: Option<String>,
    email_verified: Option<String>,
    name: Option<String>,
}

/// Google OAuth2 authorization-code flow.
#[derive(Clone)]
pub struct GoogleOAuthService {
    store: Arc<dyn UserStore>,
    jwt: JwtService,
    client_id: String,
    client_secret: String,
    redirect_uris: Vec<String>,
    http: reqwest::Client,
    token_endpoint: String,
    tokeninfo_endpoint: String,
}

impl GoogleOAuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        jwt: JwtService,
        config: &GoogleOAuthConfig,
    ) -> Result<Self, anyhow::Error> {
        // Timeout is set at construction so every exchange inherits it.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.exchange_timeout_seconds))
            .build()?;

        Ok(GoogleOAuthService {
            store,
            jwt,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uris: config.redirect_uris.clone(),
            http,
            token_endpoint: GOOGLE_TOKEN_ENDPOINT.to_string(),
            tokeninfo_endpoint: GOOGLE_TOKENINFO_ENDPOINT.to_string(),
        })
    }

    /// Point the exchange at a different provider host. Used by tests
    /// and by deployments that front Google with an egress proxy.
    pub fn with_endpoints(
        mut self,
        token_endpoint: impl Into<String>,
        tokeninfo_endpoint: impl Into<String>,
    ) -> Self {
        self.token_endpoint = token_endpoint.into();
        self.tokeninfo_endpoint = tokeninfo_endpoint.into();
        self
    }

    /// Build the provider authorization URL with an embedded state
    /// blob carrying the requested role, action, and redirect target.
    pub fn build_authorization_url(
        &self,
        redirect_uri: &str,
        requested_role: Option<UserRole>,
        action: OAuthAction,
    ) -> Result<String, ServiceError> {
        if !self.redirect_uris.iter().any(|u| u == redirect_uri) {
            tracing::warn!(redirect_uri, "Rejected redirect URI outside the allowlist");
            return Err(ServiceError::RedirectUriNotAllowed);
        }

        let state = OAuthState {
            nonce: Uuid::new_v4().to_string(),
            role: requested_role,
            action,
            redirect_uri: redirect_uri.to_string(),
        };

        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope=openid%20email%20profile&state={}",
            GOOGLE_AUTH_ENDPOINT,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&encode_state(&state)?),
        ))
    }

    /// Complete the flow after the provider redirected back with a
    /// code: exchange it, verify the ID token, resolve the identity,
    /// and mint a session.
    pub async fn handle_callback(
        &self,
        code: &str,
        state: Option<&str>,
        redirect_uri: Option<&str>,
    ) -> Result<AuthResponse, ServiceError> {
        let state = decode_state(state);

        let redirect_uri = match redirect_uri {
            Some(uri) => uri,
            None if !state.redirect_uri.is_empty() => state.redirect_uri.as_str(),
            None => return Err(ServiceError::OAuth2AuthenticationFailed),
        };
        // The state blob is unsigned and therefore forgeable, so its
        // redirect copy gets the same allowlist check as an explicit
        // parameter, before any exchange is attempted.
        if !self.redirect_uris.iter().any(|u| u == redirect_uri) {
            tracing::warn!(redirect_uri, "Rejected callback redirect URI outside the allowlist");
            return Err(ServiceError::RedirectUriNotAllowed);
        }
        let redirect_uri = redirect_uri.to_string();

        let id_token = self.exchange_code(code, &redirect_uri).await?;
        let claims = self.fetch_id_claims(&id_token).await?;
        self.verify_claims(&claims, Utc::now().timestamp())?;

        let user = self.resolve_identity(&claims, &state).await?;

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

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, ServiceError> {
        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(classify_transport_error)?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Code exchange rejected by provider");
            return Err(ServiceError::OAuth2AuthenticationFailed);
        }

        let tokens: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|_| ServiceError::OAuth2AuthenticationFailed)?;

        tokens.id_token.ok_or(ServiceError::InvalidOAuth2Token)
    }

    async fn fetch_id_claims(&self, id_token: &str) -> Result<GoogleIdClaims, ServiceError> {
        let response = self
            .http
            .get(&self.tokeninfo_endpoint)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(classify_transport_error)?;

        if !response.status().is_success() {
            return Err(ServiceError::InvalidOAuth2Token);
        }

        response
            .json()
            .await
            .map_err(|_| ServiceError::InvalidOAuth2Token)
    }

    /// Local checks on top of the tokeninfo verification: the token
    /// must be minted for this client, by Google, and still live.
    fn verify_claims(&self, claims: &GoogleIdClaims, now: i64) -> Result<(), ServiceError> {
        if claims.aud != self.client_id {
            tracing::warn!(aud = %claims.aud, "ID token audience mismatch");
            return Err(ServiceError::InvalidOAuth2Token);
        }

        if !ACCEPTED_ISSUERS.contains(&claims.iss.as_str()) {
            tracing::warn!(iss = %claims.iss, "ID token issuer mismatch");
            return Err(ServiceError::InvalidOAuth2Token);
        }

        let exp: i64 = claims
            .exp
            .parse()
            .map_err(|_| ServiceError::InvalidOAuth2Token)?;
        if exp <= now {
            return Err(ServiceError::ExpiredOAuth2Token);
        }

        Ok(())
    }

    /// Map verified provider claims onto a stored identity according
    /// to the requested action.
    async fn resolve_identity(
        &self,
        claims: &GoogleIdClaims,
        state: &OAuthState,
    ) -> Result<User, ServiceError> {
        let email = claims
            .email
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or(ServiceError::InvalidOAuth2UserInfo)?;
        let email_verified = claims.email_verified.as_deref() == Some("true");

        if let Some(mut user) = self.store.find_by_email(email).await? {
            if user.oauth_provider.is_none() {
                user.oauth_provider = Some(PROVIDER_NAME.to_string());
                tracing::info!(user_id = user.id, "Linked provider to existing account");
            }
            if email_verified {
                user.email_verified = true;
            }
            let now = Utc::now();
            user.last_login_at = Some(now);
            user.updated_at = now;
            self.store.update(&user).await?;
            return Ok(user);
        }

        if state.action == OAuthAction::Link {
            // Linking presumes a local account to link to.
            return Err(ServiceError::UserNotFound);
        }

        let role = match state.role.unwrap_or(UserRole::General) {
            UserRole::Admin => {
                tracing::warn!("ADMIN requested via OAuth state; degraded to GENERAL");
                UserRole::General
            }
            role => role,
        };

        let name = claims
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("Google User");

        let user = self
            .store
            .insert(NewUser {
                email: email.to_string(),
                password_hash: None,
                name: name.to_string(),
                role,
                oauth_provider: Some(PROVIDER_NAME.to_string()),
                email_verified,
            })
            .await?;

        tracing::info!(user_id = user.id, role = %user.role, "User created via OAuth");
        Ok(user)
    }
}

fn classify_transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        tracing::warn!("Provider exchange timed out");
        ServiceError::OAuth2ExchangeTimeout
    } else {
        tracing::warn!(error = %err, "Provider exchange failed");
        ServiceError::OAuth2AuthenticationFailed
    }
}

fn encode_state(state: &OAuthState) -> Result<String, ServiceError> {
    let json = serde_json::to_vec(state).map_err(|e| ServiceError::Internal(e.into()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Lenient state decoding: any missing or undecodable state collapses
/// to the default (no role request, SIGNUP) rather than an error.
pub fn decode_state(raw: Option<&str>) -> OAuthState {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return OAuthState::default();
    };

    URL_SAFE_NO_PAD
        .decode(raw)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_else(|| {
            tracing::debug!("Undecodable OAuth state; using defaults");
            OAuthState::default()
        })
}
