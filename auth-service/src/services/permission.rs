//! Pure authorization checks. No I/O: callers resolve the identity
//! first and pass its fields in, so these compose freely and the truth
//! table is trivially testable.

use crate::models::UserRole;

use super::error::ServiceError;

/// Owner-or-admin rule: a caller may modify a resource when they own
/// it or hold the ADMIN role. Ownership wins first so an owner keeps
/// access regardless of role.
pub fn can_modify(caller_id: i64, resource_owner_id: i64, caller_role: UserRole) -> bool {
    if caller_id == resource_owner_id {
        return true;
    }
    match caller_role {
        UserRole::Admin => true,
        UserRole::General | UserRole::Company => false,
    }
}

pub fn is_admin(role: UserRole) -> bool {
    match role {
        UserRole::Admin => true,
        UserRole::General | UserRole::Company => false,
    }
}

pub fn is_company(role: UserRole) -> bool {
    match role {
        UserRole::Company => true,
        UserRole::General | UserRole::Admin => false,
    }
}

/// [`can_modify`] as a guard clause.
pub fn ensure_can_modify(
    caller_id: i64,
    resource_owner_id: i64,
    caller_role: UserRole,
) -> Result<(), ServiceError> {
    if can_modify(caller_id, resource_owner_id, caller_role) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}
