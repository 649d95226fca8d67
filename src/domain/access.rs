//! Centralized capability checks.
//!
//! Every handler authorizes through [`authorize`] instead of repeating role
//! and ownership comparisons inline. The rules:
//!
//! - any write requires ACTIVE employment status, even for admins
//! - admins bypass ownership for reads and writes
//! - employees may only touch resources they own

use thiserror::Error;

use super::{EmploymentStatus, Role};

/// Minimal view of the caller needed for authorization decisions.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: i32,
    pub role: Role,
    pub employment_status: EmploymentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("Insufficient role")]
    InsufficientRole,
    #[error("Read-only access")]
    ReadOnly,
    #[error("Access denied")]
    NotOwner,
}

/// Single authorization gate: `resource_owner` is the owning user id when the
/// resource is ownership-scoped, `None` for admin-only collections.
pub fn authorize(
    actor: &Actor,
    resource_owner: Option<i32>,
    action: Action,
) -> Result<(), AccessError> {
    if action == Action::Write && !actor.employment_status.is_active() {
        return Err(AccessError::ReadOnly);
    }

    match resource_owner {
        Some(owner) if actor.role != Role::Admin && owner != actor.user_id => {
            Err(AccessError::NotOwner)
        }
        Some(_) => Ok(()),
        None if actor.role == Role::Admin => Ok(()),
        None => Err(AccessError::InsufficientRole),
    }
}

/// Ownership check without the admin bypass. Paystub PDFs are strictly
/// owner-scoped; admins reach other users' paystubs through the list filter.
pub fn authorize_owner_only(actor: &Actor, owner: i32) -> Result<(), AccessError> {
    if owner == actor.user_id {
        Ok(())
    } else {
        Err(AccessError::NotOwner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, status: EmploymentStatus) -> Actor {
        Actor {
            user_id: 7,
            role,
            employment_status: status,
        }
    }

    #[test]
    fn former_employee_admin_cannot_write() {
        let a = actor(Role::Admin, EmploymentStatus::FormerEmployee);
        assert_eq!(authorize(&a, None, Action::Write), Err(AccessError::ReadOnly));
        assert_eq!(authorize(&a, Some(7), Action::Write), Err(AccessError::ReadOnly));
    }

    #[test]
    fn former_employee_can_still_read_own() {
        let a = actor(Role::Employee, EmploymentStatus::FormerEmployee);
        assert_eq!(authorize(&a, Some(7), Action::Read), Ok(()));
    }

    #[test]
    fn admin_bypasses_ownership() {
        let a = actor(Role::Admin, EmploymentStatus::Active);
        assert_eq!(authorize(&a, Some(42), Action::Read), Ok(()));
        assert_eq!(authorize(&a, Some(42), Action::Write), Ok(()));
        assert_eq!(authorize(&a, None, Action::Write), Ok(()));
    }

    #[test]
    fn employee_is_ownership_scoped() {
        let a = actor(Role::Employee, EmploymentStatus::Active);
        assert_eq!(authorize(&a, Some(7), Action::Read), Ok(()));
        assert_eq!(authorize(&a, Some(8), Action::Read), Err(AccessError::NotOwner));
        assert_eq!(authorize(&a, None, Action::Read), Err(AccessError::InsufficientRole));
    }

    #[test]
    fn owner_only_denies_admin() {
        let a = actor(Role::Admin, EmploymentStatus::Active);
        assert_eq!(authorize_owner_only(&a, 7), Ok(()));
        assert_eq!(authorize_owner_only(&a, 42), Err(AccessError::NotOwner));
    }
}
