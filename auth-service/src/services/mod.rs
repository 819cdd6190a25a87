pub mod admin;
pub mod auth;
pub mod error;
pub mod jwt;
pub mod oauth;
pub mod permission;
pub mod store;

pub use admin::AdminService;
pub use auth::AuthService;
pub use error::ServiceError;
pub use jwt::{Claims, JwtService, TokenError, TokenKind};
pub use oauth::{decode_state, GoogleOAuthService, OAuthAction, OAuthState};
pub use store::{InMemoryUserStore, StoreError, UserStore};
