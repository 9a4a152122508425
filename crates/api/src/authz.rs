//! API-side authorization guard for routes.
//!
//! Role checks happen here, after authentication and before any handler
//! runs, so handlers and services never see an unauthorized principal.

use keygate_auth::{authorize, AuthzError, Role};

use crate::context::PrincipalContext;

/// Admit the request's principal only if it holds exactly `required`.
pub fn require_role(principal: &PrincipalContext, required: Role) -> Result<(), AuthzError> {
    authorize(principal.principal(), Some(required)).inspect_err(|_| {
        tracing::warn!(
            account_id = %principal.account_id(),
            role = %principal.role(),
            required = %required,
            "authorization denied"
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_auth::{AccountStatus, Principal};
    use keygate_core::AccountId;

    fn ctx(role: Role) -> PrincipalContext {
        PrincipalContext::new(Principal {
            account_id: AccountId::new(),
            role,
            status: AccountStatus::Active,
        })
    }

    #[test]
    fn admin_route_requires_exact_role() {
        assert!(require_role(&ctx(Role::Admin), Role::Admin).is_ok());
        assert_eq!(
            require_role(&ctx(Role::User), Role::Admin),
            Err(AuthzError::Forbidden { required: Role::Admin })
        );
    }
}
