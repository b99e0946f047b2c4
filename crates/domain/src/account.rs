//! Platform account model and the role-list arithmetic used by the sync.
//!
//! Role assignment on the platform is an overwrite: whatever list is sent
//! becomes the account's complete role set. Every helper that produces a role
//! list therefore starts from the account's full current list.

use std::collections::BTreeSet;

use rolesync_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{RoleId, RoleRef};

/// Opaque, stable platform identifier of an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Creates an account identifier, rejecting blank values.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "account id must not be empty".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the identifier as sent over the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Email address attached to an account, with its verification state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEmail {
    /// Email address exactly as stored by the platform.
    pub email: String,
    /// Whether the platform confirmed the address belongs to the account.
    pub verified: bool,
}

impl AccountEmail {
    /// Creates a verified email entry.
    #[must_use]
    pub fn verified(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            verified: true,
        }
    }

    /// Creates an unverified email entry.
    #[must_use]
    pub fn unverified(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            verified: false,
        }
    }
}

/// Platform-side identity with its current role assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    username: String,
    emails: Vec<AccountEmail>,
    roles: Vec<RoleRef>,
}

impl Account {
    /// Creates an account projection.
    pub fn new(
        id: AccountId,
        username: impl Into<String>,
        emails: Vec<AccountEmail>,
        roles: Vec<RoleRef>,
    ) -> AppResult<Self> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "account '{id}' must have a username"
            )));
        }

        Ok(Self {
            id,
            username,
            emails,
            roles,
        })
    }

    /// Returns the stable account identifier.
    #[must_use]
    pub fn id(&self) -> &AccountId {
        &self.id
    }

    /// Returns the unique username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns every email, verified or not.
    #[must_use]
    pub fn emails(&self) -> &[AccountEmail] {
        &self.emails
    }

    /// Returns the roles currently assigned.
    #[must_use]
    pub fn roles(&self) -> &[RoleRef] {
        &self.roles
    }

    /// Iterates verified email addresses only.
    pub fn verified_emails(&self) -> impl Iterator<Item = &str> {
        self.emails
            .iter()
            .filter(|email| email.verified)
            .map(|email| email.email.as_str())
    }

    /// Returns `{username} ∪ {verified emails}`.
    #[must_use]
    pub fn identity_surface(&self) -> BTreeSet<&str> {
        std::iter::once(self.username.as_str())
            .chain(self.verified_emails())
            .collect()
    }

    /// Returns whether the account currently holds the role.
    #[must_use]
    pub fn holds_role(&self, role_id: &RoleId) -> bool {
        self.roles.iter().any(|role| &role.id == role_id)
    }

    /// Returns the full current role id list.
    #[must_use]
    pub fn role_ids(&self) -> Vec<RoleId> {
        self.roles.iter().map(|role| role.id.clone()).collect()
    }

    /// Returns the full role id list with `role_id` excluded.
    #[must_use]
    pub fn role_ids_without(&self, role_id: &RoleId) -> Vec<RoleId> {
        self.roles
            .iter()
            .filter(|role| &role.id != role_id)
            .map(|role| role.id.clone())
            .collect()
    }

    /// Returns the full role id list with `role_id` appended when absent.
    #[must_use]
    pub fn role_ids_with(&self, role_id: &RoleId) -> Vec<RoleId> {
        let mut role_ids = self.role_ids();
        if !role_ids.contains(role_id) {
            role_ids.push(role_id.clone());
        }

        role_ids
    }
}
