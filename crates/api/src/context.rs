use keygate_auth::{Principal, Role};
use keygate_core::AccountId;

/// Principal context for a request (authenticated, active account).
///
/// Inserted by the authentication middleware only after every gate stage
/// passed; handlers extract it with `Extension<PrincipalContext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn account_id(&self) -> AccountId {
        self.principal.account_id
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }
}
