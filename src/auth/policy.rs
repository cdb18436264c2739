use crate::error::{Error, Result};
use crate::types::{Principal, Role};

/// Checks that the principal's role is one of the allowed set. Call sites
/// enumerate every role they accept; there is no wildcard.
pub fn require_role(principal: &Principal, allowed: &[Role]) -> Result<()> {
    if allowed.contains(&principal.role) {
        Ok(())
    } else {
        Err(Error::PermissionDenied)
    }
}

/// Checks that the principal owns the resource. Applied after a successful
/// role check. A mismatch (including an ownerless resource) yields the same
/// error kind as a role failure so callers cannot probe resource existence
/// through the error code.
pub fn require_ownership(principal: &Principal, owner_id: Option<&str>) -> Result<()> {
    match owner_id {
        Some(owner) if owner == principal.id => Ok(()),
        _ => Err(Error::PermissionDenied),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            id: "u1".to_string(),
            role,
        }
    }

    #[test]
    fn test_role_allowed() {
        assert!(require_role(&principal(Role::Rater), &[Role::Rater]).is_ok());
        assert!(require_role(&principal(Role::Admin), &[Role::Admin, Role::StoreOwner]).is_ok());
    }

    #[test]
    fn test_role_denied() {
        let err = require_role(&principal(Role::Rater), &[Role::Admin]).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied));
    }

    #[test]
    fn test_ownership_match() {
        assert!(require_ownership(&principal(Role::StoreOwner), Some("u1")).is_ok());
    }

    #[test]
    fn test_ownership_mismatch_is_permission_denied() {
        let err = require_ownership(&principal(Role::StoreOwner), Some("u2")).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied));
    }

    #[test]
    fn test_ownerless_resource_is_permission_denied() {
        let err = require_ownership(&principal(Role::StoreOwner), None).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied));
    }
}
