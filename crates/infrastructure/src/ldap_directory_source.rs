use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tracing::{debug, info, warn};

use rolesync_application::DirectorySource;
use rolesync_core::{AppError, AppResult};
use rolesync_domain::DirectoryMember;

/// Settings for reading one LDAP group.
#[derive(Debug, Clone)]
pub struct LdapDirectoryConfig {
    /// Server URL, `ldap://` or `ldaps://` with port.
    pub url: String,
    /// Bind DN; anonymous when unset.
    pub bind_dn: Option<String>,
    /// Bind password.
    pub bind_password: Option<String>,
    /// DN of the group whose members should hold the role.
    pub group_dn: String,
    /// Group attribute listing member DNs.
    pub member_attribute: String,
    /// Member attribute holding the platform identity.
    pub user_id_attribute: String,
    /// Connect timeout.
    pub connect_timeout: Duration,
}

/// Directory source backed by an LDAP group.
///
/// The group entry is read once, then every member DN is read for its
/// identity attribute. Any connection or search failure fails the whole
/// source so the engine can treat the member list as incomplete.
#[derive(Debug, Clone)]
pub struct LdapDirectorySource {
    config: LdapDirectoryConfig,
}

impl LdapDirectorySource {
    /// Creates a source for the configured group.
    #[must_use]
    pub fn new(config: LdapDirectoryConfig) -> Self {
        Self { config }
    }

    async fn connect(&self) -> AppResult<Ldap> {
        let settings = LdapConnSettings::new().set_conn_timeout(self.config.connect_timeout);
        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.config.url)
            .await
            .map_err(|error| {
                AppError::Unavailable(format!(
                    "failed to connect to LDAP server {}: {error}",
                    self.config.url
                ))
            })?;

        tokio::spawn(async move {
            if let Err(error) = conn.drive().await {
                warn!(error = %error, "LDAP connection driver error");
            }
        });

        if let Some(bind_dn) = &self.config.bind_dn {
            let password = self.config.bind_password.as_deref().unwrap_or_default();
            ldap.simple_bind(bind_dn, password)
                .await
                .and_then(ldap3::LdapResult::success)
                .map_err(|error| {
                    AppError::Unavailable(format!("LDAP bind as '{bind_dn}' failed: {error}"))
                })?;
            debug!(bind_dn = %bind_dn, "LDAP bind succeeded");
        }

        Ok(ldap)
    }

    async fn read_attribute(
        &self,
        ldap: &mut Ldap,
        dn: &str,
        attribute: &str,
    ) -> AppResult<Vec<Vec<String>>> {
        let (entries, _) = ldap
            .search(dn, Scope::Base, "(objectClass=*)", vec![attribute])
            .await
            .and_then(ldap3::SearchResult::success)
            .map_err(|error| {
                AppError::Unavailable(format!("LDAP search for '{dn}' failed: {error}"))
            })?;

        Ok(entries
            .into_iter()
            .map(|entry| attribute_values(&SearchEntry::construct(entry).attrs, attribute))
            .collect())
    }

    async fn read_members(&self, ldap: &mut Ldap) -> AppResult<Vec<DirectoryMember>> {
        let groups = self
            .read_attribute(ldap, &self.config.group_dn, &self.config.member_attribute)
            .await?;
        let [member_dns] = groups.as_slice() else {
            return Err(AppError::Unavailable(format!(
                "LDAP group search for '{}' returned {} entries, expected 1",
                self.config.group_dn,
                groups.len()
            )));
        };
        info!(
            group_dn = %self.config.group_dn,
            member_count = member_dns.len(),
            "read LDAP group members"
        );

        let mut members = Vec::with_capacity(member_dns.len());
        for member_dn in member_dns {
            let identities = self
                .read_attribute(ldap, member_dn, &self.config.user_id_attribute)
                .await?
                .into_iter()
                .flatten()
                .collect::<Vec<_>>();

            if identities.is_empty() {
                warn!(
                    member_dn = %member_dn,
                    attribute = %self.config.user_id_attribute,
                    "LDAP group member has no identity attribute"
                );
            } else {
                debug!(member_dn = %member_dn, identities = ?identities, "LDAP member identities");
            }

            members.push(DirectoryMember::new(member_dn.as_str(), identities));
        }

        Ok(members)
    }
}

/// Returns an attribute's values, matching the name case-insensitively.
fn attribute_values(attributes: &HashMap<String, Vec<String>>, name: &str) -> Vec<String> {
    attributes
        .iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case(name))
        .flat_map(|(_, values)| values.iter().cloned())
        .collect()
}

#[async_trait]
impl DirectorySource for LdapDirectorySource {
    fn label(&self) -> &str {
        "ldap"
    }

    async fn list_members(&self) -> AppResult<Vec<DirectoryMember>> {
        let mut ldap = self.connect().await?;
        let members = self.read_members(&mut ldap).await;

        if let Err(error) = ldap.unbind().await {
            debug!(error = %error, "LDAP unbind failed");
        }

        members
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use rolesync_application::DirectorySource;
    use rolesync_core::AppError;

    use super::{LdapDirectoryConfig, LdapDirectorySource, attribute_values};

    #[test]
    fn attribute_lookup_ignores_case() {
        let attributes = HashMap::from([(
            "Mail".to_owned(),
            vec!["alice@co.com".to_owned(), "a.smith@co.com".to_owned()],
        )]);

        assert_eq!(
            attribute_values(&attributes, "mail"),
            vec!["alice@co.com".to_owned(), "a.smith@co.com".to_owned()]
        );
        assert!(attribute_values(&attributes, "uid").is_empty());
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        let source = LdapDirectorySource::new(LdapDirectoryConfig {
            url: "ldap://127.0.0.1:1".to_owned(),
            bind_dn: None,
            bind_password: None,
            group_dn: "cn=cody-users,ou=groups,dc=example,dc=org".to_owned(),
            member_attribute: "member".to_owned(),
            user_id_attribute: "mail".to_owned(),
            connect_timeout: Duration::from_secs(2),
        });

        let result = source.list_members().await;

        assert!(matches!(result, Err(AppError::Unavailable(_))));
    }
}
