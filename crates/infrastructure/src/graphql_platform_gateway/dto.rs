use serde::Deserialize;

use rolesync_core::AppResult;
use rolesync_domain::{
    Account, AccountEmail, AccountId, Role, RoleId, RolePermission, RoleRef,
};

#[derive(Debug, Deserialize)]
pub(super) struct GraphqlResponse<T> {
    pub(super) data: Option<T>,
    #[serde(default)]
    pub(super) errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GraphqlError {
    pub(super) message: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct Connection<T> {
    pub(super) nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CurrentUserData {
    pub(super) current_user: Option<CurrentUserNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CurrentUserNode {
    pub(super) username: String,
    pub(super) site_admin: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct RolesData {
    pub(super) roles: Connection<RoleNode>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RoleNode {
    id: String,
    name: String,
    permissions: Connection<PermissionNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PermissionNode {
    id: String,
    display_name: String,
    namespace: String,
    action: String,
}

impl RoleNode {
    pub(super) fn into_domain(self) -> AppResult<Role> {
        let permissions = self
            .permissions
            .nodes
            .into_iter()
            .map(|permission| RolePermission {
                id: permission.id,
                display_name: permission.display_name,
                namespace: permission.namespace,
                action: permission.action,
            })
            .collect();

        Role::new(RoleId::new(self.id)?, self.name, permissions)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct UsersData {
    pub(super) users: Connection<UserNode>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserNode {
    id: String,
    username: String,
    #[serde(default)]
    emails: Vec<EmailNode>,
    roles: Option<Connection<RoleRefNode>>,
}

#[derive(Debug, Deserialize)]
struct EmailNode {
    email: String,
    verified: bool,
}

#[derive(Debug, Deserialize)]
struct RoleRefNode {
    id: String,
    name: String,
}

impl UserNode {
    pub(super) fn into_domain(self) -> AppResult<Account> {
        let emails = self
            .emails
            .into_iter()
            .map(|email| AccountEmail {
                email: email.email,
                verified: email.verified,
            })
            .collect();
        let roles = self
            .roles
            .map(|roles| roles.nodes)
            .unwrap_or_default()
            .into_iter()
            .map(|role| Ok(RoleRef::new(RoleId::new(role.id)?, role.name)))
            .collect::<AppResult<Vec<_>>>()?;

        Account::new(AccountId::new(self.id)?, self.username, emails, roles)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateUserData {
    pub(super) create_user: CreatedUser,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreatedUser {
    pub(super) user: UserNode,
}
