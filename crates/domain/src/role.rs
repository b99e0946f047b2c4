use rolesync_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Opaque, stable platform identifier of an RBAC role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

impl RoleId {
    /// Creates a role identifier, rejecting blank values.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "role id must not be empty".to_owned(),
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

impl std::fmt::Display for RoleId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// A permission attached to a role. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    /// Stable permission identifier.
    pub id: String,
    /// Human readable permission name.
    pub display_name: String,
    /// Permission namespace, for example `CODY`.
    pub namespace: String,
    /// Action granted inside the namespace, for example `ACCESS`.
    pub action: String,
}

/// Named RBAC role resolved from the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: String,
    permissions: Vec<RolePermission>,
}

impl Role {
    /// Creates a role definition.
    pub fn new(
        id: RoleId,
        name: impl Into<String>,
        permissions: Vec<RolePermission>,
    ) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "role '{id}' must have a display name"
            )));
        }

        Ok(Self {
            id,
            name,
            permissions,
        })
    }

    /// Returns the stable role identifier.
    #[must_use]
    pub fn id(&self) -> &RoleId {
        &self.id
    }

    /// Returns the display name, unique per platform instance.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the attached permissions.
    #[must_use]
    pub fn permissions(&self) -> &[RolePermission] {
        &self.permissions
    }
}

/// Role reference as seen on an account: id plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    /// Stable role identifier.
    pub id: RoleId,
    /// Role display name at capture time.
    pub name: String,
}

impl RoleRef {
    /// Creates a role reference.
    #[must_use]
    pub fn new(id: RoleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl From<&Role> for RoleRef {
    fn from(role: &Role) -> Self {
        Self::new(role.id().clone(), role.name())
    }
}
