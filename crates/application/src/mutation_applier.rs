use std::sync::Arc;

use tracing::{info, warn};

use rolesync_domain::{Account, AccountId, NewAccount, RoleId};

use crate::PlatformGateway;

/// Result of one role overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The platform accepted the new role set.
    Applied,
    /// Dry run: the call was logged but not sent.
    DryRun,
    /// The platform refused or the transport gave up.
    Failed(String),
}

/// Result of one account creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationOutcome {
    /// The platform created the account.
    Created(Account),
    /// Dry run: the call was logged but not sent.
    DryRun,
    /// The platform refused or the transport gave up.
    Failed(String),
}

/// Sends role overwrites and account creations, never raising on failure.
///
/// Callers always pass the complete desired role list; the platform replaces
/// the account's roles with exactly that list.
#[derive(Clone)]
pub struct MutationApplier {
    gateway: Arc<dyn PlatformGateway>,
    dry_run: bool,
}

impl MutationApplier {
    /// Creates an applier; with `dry_run` nothing is sent.
    #[must_use]
    pub fn new(gateway: Arc<dyn PlatformGateway>, dry_run: bool) -> Self {
        Self { gateway, dry_run }
    }

    /// Overwrites the account's roles with `role_ids`.
    pub async fn set_roles(
        &self,
        account_id: &AccountId,
        username: &str,
        role_ids: &[RoleId],
    ) -> MutationOutcome {
        let role_list = role_ids
            .iter()
            .map(RoleId::as_str)
            .collect::<Vec<_>>()
            .join(",");

        if self.dry_run {
            info!(
                account_id = %account_id,
                username = username,
                role_ids = %role_list,
                "dry run: would set account roles"
            );
            return MutationOutcome::DryRun;
        }

        match self.gateway.set_account_roles(account_id, role_ids).await {
            Ok(()) => {
                info!(
                    account_id = %account_id,
                    username = username,
                    role_ids = %role_list,
                    "account roles set"
                );
                MutationOutcome::Applied
            }
            Err(error) => {
                warn!(
                    account_id = %account_id,
                    username = username,
                    role_ids = %role_list,
                    error = %error,
                    "failed to set account roles"
                );
                MutationOutcome::Failed(error.to_string())
            }
        }
    }

    /// Creates an account.
    pub async fn create_account(&self, request: &NewAccount) -> CreationOutcome {
        if self.dry_run {
            info!(
                username = %request.username,
                email = request.email.as_deref().unwrap_or(""),
                "dry run: would create account"
            );
            return CreationOutcome::DryRun;
        }

        match self.gateway.create_account(request).await {
            Ok(account) => {
                info!(
                    account_id = %account.id(),
                    username = account.username(),
                    "account created"
                );
                CreationOutcome::Created(account)
            }
            Err(error) => {
                warn!(
                    username = %request.username,
                    error = %error,
                    "failed to create account"
                );
                CreationOutcome::Failed(error.to_string())
            }
        }
    }
}
