//! User roles, profiles and access policies

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::ParseEnumError;

/// Role held by a user through their profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Ops,
    Supplier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Ops => "OPS",
            Role::Supplier => "SUPPLIER",
        }
    }

    /// Roles an administrator may hand out when creating accounts
    pub fn is_assignable(&self) -> bool {
        match self {
            Role::Admin => false,
            Role::Ops | Role::Supplier => true,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::Ops => write!(f, "Ops Manager"),
            Role::Supplier => write!(f, "Vendor"),
        }
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "OPS" => Ok(Role::Ops),
            "SUPPLIER" => Ok(Role::Supplier),
            other => Err(ParseEnumError::new("role", other)),
        }
    }
}

/// Profile attached to a user account. Accounts without one hold no role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub role: Role,
    pub phone: Option<String>,
}

/// Access rule guarding an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    AdminOnly,
    AdminOrOps,
    AdminOrSupplier,
    /// Any user holding a profile
    AnyRole,
}

impl AccessPolicy {
    /// Decide whether a caller with the given role may proceed
    pub fn allows(&self, role: Option<Role>) -> bool {
        let Some(role) = role else {
            return false;
        };

        match (self, role) {
            (AccessPolicy::AdminOnly, Role::Admin) => true,
            (AccessPolicy::AdminOnly, Role::Ops | Role::Supplier) => false,
            (AccessPolicy::AdminOrOps, Role::Admin | Role::Ops) => true,
            (AccessPolicy::AdminOrOps, Role::Supplier) => false,
            (AccessPolicy::AdminOrSupplier, Role::Admin | Role::Supplier) => true,
            (AccessPolicy::AdminOrSupplier, Role::Ops) => false,
            (AccessPolicy::AnyRole, _) => true,
        }
    }
}

/// Audited user actions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    Login,
    Logout,
    FailedLogin,
    PasswordReset,
    AccountCreated,
    AccountActivated,
    AccountDeactivated,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Login => "LOGIN",
            ActivityAction::Logout => "LOGOUT",
            ActivityAction::FailedLogin => "FAILED_LOGIN",
            ActivityAction::PasswordReset => "PASSWORD_RESET",
            ActivityAction::AccountCreated => "ACCOUNT_CREATED",
            ActivityAction::AccountActivated => "ACCOUNT_ACTIVATED",
            ActivityAction::AccountDeactivated => "ACCOUNT_DEACTIVATED",
        }
    }

    /// Action recorded when an account's active flag flips
    pub fn for_status_change(activated: bool) -> Self {
        if activated {
            ActivityAction::AccountActivated
        } else {
            ActivityAction::AccountDeactivated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: [Option<Role>; 4] = [None, Some(Role::Admin), Some(Role::Ops), Some(Role::Supplier)];

    #[test]
    fn test_admin_only() {
        let allowed: Vec<_> = ROLES
            .iter()
            .filter(|r| AccessPolicy::AdminOnly.allows(**r))
            .collect();
        assert_eq!(allowed, vec![&Some(Role::Admin)]);
    }

    #[test]
    fn test_missing_profile_denied_everywhere() {
        for policy in [
            AccessPolicy::AdminOnly,
            AccessPolicy::AdminOrOps,
            AccessPolicy::AdminOrSupplier,
            AccessPolicy::AnyRole,
        ] {
            assert!(!policy.allows(None));
        }
    }

    #[test]
    fn test_mixed_policies() {
        assert!(AccessPolicy::AdminOrOps.allows(Some(Role::Ops)));
        assert!(!AccessPolicy::AdminOrOps.allows(Some(Role::Supplier)));
        assert!(AccessPolicy::AdminOrSupplier.allows(Some(Role::Supplier)));
        assert!(!AccessPolicy::AdminOrSupplier.allows(Some(Role::Ops)));
    }

    #[test]
    fn test_role_round_trips_through_storage_form() {
        for role in [Role::Admin, Role::Ops, Role::Supplier] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_admin_role_not_assignable() {
        assert!(!Role::Admin.is_assignable());
        assert!(Role::Ops.is_assignable());
        assert!(Role::Supplier.is_assignable());
    }
}
