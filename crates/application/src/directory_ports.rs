use async_trait::async_trait;

use rolesync_core::AppResult;
use rolesync_domain::DirectoryMember;

/// Port for a source of identities that should hold the synced role.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Short label used in logs and the run summary.
    fn label(&self) -> &str;

    /// Returns every member with the identity values it contributes.
    ///
    /// An error means the member list may be incomplete.
    async fn list_members(&self) -> AppResult<Vec<DirectoryMember>>;
}
