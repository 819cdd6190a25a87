use chrono::Utc;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::dtos::auth::{AuthResponse, TokenResponse};
use crate::models::{User, UserRole};
use crate::utils::password::{verify_password, Password};

use super::error::ServiceError;
use super::jwt::JwtService;
use super::permission::is_admin;
use super::store::UserStore;

/// Privilege escalation and admin session flows. Promotion is gated on
/// a shared secret rather than a caller role, so the very first admin
/// can be minted on a fresh deployment.
#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn UserStore>,
    jwt: JwtService,
    admin_secret: String,
}

impl AdminService {
    pub fn new(store: Arc<dyn UserStore>, jwt: JwtService, admin_secret: String) -> Self {
        AdminService {
            store,
            jwt,
            admin_secret,
        }
    }

    /// Promote an existing account to ADMIN. The secret is checked
    /// before the account lookup so a wrong secret learns nothing
    /// about which emails exist.
    pub async fn promote(&self, email: &str, secret_key: &str) -> Result<User, ServiceError> {
        if !secrets_match(&self.admin_secret, secret_key) {
            tracing::warn!("Promotion attempt with wrong admin secret");
            return Err(ServiceError::Forbidden);
        }

        let mut user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        if user.role == UserRole::Admin {
            return Err(ServiceError::AlreadyAdmin);
        }

        let now = Utc::now();
        user.role = UserRole::Admin;
        user.admin_converted_at = Some(now);
        user.updated_at = now;
        self.store.update(&user).await?;

        tracing::info!(user_id = user.id, "User promoted to admin");
        Ok(user)
    }

    /// Password login that additionally requires the ADMIN role. The
    /// role check runs after the password check, so it never becomes a
    /// cheaper probe than a failed login.
    pub async fn admin_login(&self, email: &str, password: &str) -> Result<AuthResponse, ServiceError> {
        let mut user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let stored_hash = user
            .password_hash
            .as_deref()
            .ok_or(ServiceError::PasswordNotSet)?;

        if !verify_password(&Password::new(password.to_string()), stored_hash)? {
            return Err(ServiceError::InvalidCredentials);
        }

        if !is_admin(user.role) {
            tracing::warn!(user_id = user.id, "Admin login rejected for non-admin");
            return Err(ServiceError::Forbidden);
        }

        let now = Utc::now();
        user.last_login_at = Some(now);
        user.updated_at = now;
        self.store.update(&user).await?;

        tracing::info!(user_id = user.id, "Admin logged in");

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

    /// Re-resolve the caller and confirm they still hold ADMIN. Token
    /// claims alone are not trusted here; a demoted or deleted account
    /// fails even with a live token.
    pub async fn verify(&self, user_id: i64) -> Result<User, ServiceError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        if !is_admin(user.role) {
            return Err(ServiceError::Forbidden);
        }

        Ok(user)
    }
}

/// Constant-time secret comparison. Length is checked separately since
/// `ct_eq` requires equal-length slices; the length itself is not
/// secret.
fn secrets_match(expected: &str, presented: &str) -> bool {
    let expected = expected.as_bytes();
    let presented = presented.as_bytes();
    expected.len() == presented.len() && bool::from(expected.ct_eq(presented))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::models::NewUser;
    use crate::services::store::InMemoryUserStore;
    use crate::utils::password::hash_password;

    const SECRET: &str = "unit-test-admin-secret";

    fn jwt() -> JwtService {
        JwtService::new(&JwtConfig {
            secret: "unit-test-secret-0123456789abcdef".to_string(),
            access_token_expiry_hours: 1,
            refresh_token_expiry_days: 1,
        })
    }

    async fn seeded_service() -> (AdminService, Arc<InMemoryUserStore>) {
        let store = Arc::new(InMemoryUserStore::new());
        store
            .insert(NewUser {
                email: "root@example.com".to_string(),
                password_hash: Some(
                    hash_password(&Password::new("root-password")).unwrap(),
                ),
                name: "Root".to_string(),
                role: UserRole::General,
                oauth_provider: None,
                email_verified: true,
            })
            .await
            .unwrap();
        let service = AdminService::new(store.clone(), jwt(), SECRET.to_string());
        (service, store)
    }

    #[test]
    fn secret_comparison_handles_length_mismatch() {
        assert!(secrets_match("abc", "abc"));
        assert!(!secrets_match("abc", "abd"));
        assert!(!secrets_match("abc", "abcd"));
        assert!(!secrets_match("abc", ""));
    }

    #[tokio::test]
    async fn promote_requires_the_exact_secret() {
        let (service, store) = seeded_service().await;

        let err = service
            .promote("root@example.com", "wrong-secret")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));

        let untouched = store.find_by_email("root@example.com").await.unwrap().unwrap();
        assert_eq!(untouched.role, UserRole::General);
        assert!(untouched.admin_converted_at.is_none());
    }

    #[tokio::test]
    async fn promote_is_recorded_and_not_repeatable() {
        let (service, store) = seeded_service().await;

        let promoted = service.promote("root@example.com", SECRET).await.unwrap();
        assert_eq!(promoted.role, UserRole::Admin);
        assert!(promoted.admin_converted_at.is_some());

        let persisted = store.find_by_email("root@example.com").await.unwrap().unwrap();
        assert_eq!(persisted.role, UserRole::Admin);

        let err = service.promote("root@example.com", SECRET).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyAdmin));
    }

    #[tokio::test]
    async fn promote_unknown_email_fails_even_with_secret() {
        let (service, _) = seeded_service().await;
        let err = service.promote("nobody@example.com", SECRET).await.unwrap_err();
        assert!(matches!(err, ServiceError::UserNotFound));
    }

    #[tokio::test]
    async fn admin_login_is_gated_on_role() {
        let (service, _) = seeded_service().await;

        let err = service
            .admin_login("root@example.com", "root-password")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));

        service.promote("root@example.com", SECRET).await.unwrap();
        let response = service
            .admin_login("root@example.com", "root-password")
            .await
            .unwrap();
        assert_eq!(response.user.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn admin_login_checks_password_before_role() {
        let (service, _) = seeded_service().await;
        let err = service
            .admin_login("root@example.com", "bad-password")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn verify_rechecks_the_stored_role() {
        let (service, store) = seeded_service().await;
        let user = store.find_by_email("root@example.com").await.unwrap().unwrap();

        assert!(matches!(
            service.verify(user.id).await.unwrap_err(),
            ServiceError::Forbidden
        ));

        service.promote("root@example.com", SECRET).await.unwrap();
        assert_eq!(service.verify(user.id).await.unwrap().role, UserRole::Admin);
    }
}
