pub mod user;

pub use user::{NewUser, SanitizedUser, User, UserRole};
