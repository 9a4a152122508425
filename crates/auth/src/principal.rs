use keygate_core::AccountId;

use crate::{Account, AccountStatus, Role};

/// The authenticated identity attached to a single request.
///
/// Built only by the authentication gate from a *live* account record, never
/// from token claims alone: `role` and `status` come from the directory at the
/// time the request was admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub account_id: AccountId,
    pub role: Role,
    pub status: AccountStatus,
}

impl Principal {
    pub fn from_account(account: &Account) -> Self {
        Self {
            account_id: account.id,
            role: account.role,
            status: account.status,
        }
    }
}
