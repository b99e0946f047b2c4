use async_trait::async_trait;

use rolesync_core::AppResult;
use rolesync_domain::{Account, AccountId, NewAccount, Role, RoleId};

/// Authenticated caller of the platform API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCaller {
    /// Username behind the access token.
    pub username: String,
    /// Whether the caller is a site administrator.
    pub site_admin: bool,
}

/// Port for reading and mutating accounts and roles on the target platform.
///
/// Implementations retry transport failures internally; any error returned is
/// final for that call.
#[async_trait]
pub trait PlatformGateway: Send + Sync {
    /// Returns the caller behind the configured credentials.
    async fn current_caller(&self) -> AppResult<PlatformCaller>;

    /// Lists every role defined on the platform.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Lists every account with its emails and roles.
    async fn list_accounts(&self) -> AppResult<Vec<Account>>;

    /// Overwrites the account's complete role set with `role_ids`.
    async fn set_account_roles(
        &self,
        account_id: &AccountId,
        role_ids: &[RoleId],
    ) -> AppResult<()>;

    /// Creates an account and returns it without roles.
    async fn create_account(&self, request: &NewAccount) -> AppResult<Account>;
}
