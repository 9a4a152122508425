use thiserror::Error;

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: requires role '{required}'")]
    Forbidden { required: Role },
}

/// Role-based admission for an already-authenticated principal.
///
/// - No IO
/// - No panics
/// - No role hierarchy: the principal's role must equal the requirement exactly
///
/// `None` means the route only needs an authenticated caller.
pub fn authorize(principal: &Principal, required: Option<Role>) -> Result<(), AuthzError> {
    match required {
        None => Ok(()),
        Some(role) if principal.role == role => Ok(()),
        Some(role) => Err(AuthzError::Forbidden { required: role }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccountStatus;
    use keygate_core::AccountId;

    fn principal(role: Role) -> Principal {
        Principal {
            account_id: AccountId::new(),
            role,
            status: AccountStatus::Active,
        }
    }

    #[test]
    fn admin_requirement_admits_only_admins() {
        assert_eq!(authorize(&principal(Role::Admin), Some(Role::Admin)), Ok(()));
        assert_eq!(
            authorize(&principal(Role::User), Some(Role::Admin)),
            Err(AuthzError::Forbidden { required: Role::Admin })
        );
    }

    #[test]
    fn no_requirement_admits_any_principal() {
        assert_eq!(authorize(&principal(Role::User), None), Ok(()));
        assert_eq!(authorize(&principal(Role::Admin), None), Ok(()));
    }

    #[test]
    fn admin_does_not_inherit_user_requirement() {
        assert!(authorize(&principal(Role::Admin), Some(Role::User)).is_err());
    }
}
