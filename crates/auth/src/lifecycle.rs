//! Account lifecycle guard: activate / deactivate transitions.
//!
//! Callers must already have admitted the acting principal as `admin`; this
//! module does not re-check roles. Both transitions reject a no-op instead of
//! silently succeeding.

use thiserror::Error;
use tracing::info;

use keygate_core::AccountId;

use crate::{Account, AccountStatus, Principal};

/// A validated status transition, ready to be persisted as one atomic update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub account_id: AccountId,
    pub from: AccountStatus,
    pub to: AccountStatus,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("account is already {0}")]
    AlreadyInState(AccountStatus),

    #[error("an account cannot deactivate itself")]
    SelfActionForbidden,
}

pub fn activate(target: &Account) -> Result<StatusChange, LifecycleError> {
    if target.status == AccountStatus::Active {
        return Err(LifecycleError::AlreadyInState(AccountStatus::Active));
    }

    info!(account_id = %target.id, "account activation approved");
    Ok(StatusChange {
        account_id: target.id,
        from: target.status,
        to: AccountStatus::Active,
    })
}

pub fn deactivate(target: &Account, actor: &Principal) -> Result<StatusChange, LifecycleError> {
    if target.status == AccountStatus::Inactive {
        return Err(LifecycleError::AlreadyInState(AccountStatus::Inactive));
    }

    // Self-deactivation would lock the acting admin out with no way back in.
    if target.id == actor.account_id {
        return Err(LifecycleError::SelfActionForbidden);
    }

    info!(account_id = %target.id, actor = %actor.account_id, "account deactivation approved");
    Ok(StatusChange {
        account_id: target.id,
        from: target.status,
        to: AccountStatus::Inactive,
    })
}
