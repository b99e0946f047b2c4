use async_trait::async_trait;

use rolesync_application::DirectorySource;
use rolesync_core::AppResult;
use rolesync_domain::DirectoryMember;

/// Directory source for an operator-maintained list of usernames and emails.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectorySource {
    identities: Vec<String>,
}

impl StaticDirectorySource {
    /// Parses a comma-separated list; blank entries are dropped.
    #[must_use]
    pub fn from_list(raw: &str) -> Self {
        Self {
            identities: raw
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    /// Returns whether the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[async_trait]
impl DirectorySource for StaticDirectorySource {
    fn label(&self) -> &str {
        "static"
    }

    async fn list_members(&self) -> AppResult<Vec<DirectoryMember>> {
        Ok(self
            .identities
            .iter()
            .map(|identity| DirectoryMember::new("static", vec![identity.clone()]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use rolesync_application::DirectorySource;

    use super::StaticDirectorySource;

    #[tokio::test]
    async fn list_is_split_on_commas_and_trimmed() {
        let source = StaticDirectorySource::from_list(" alice, bob@co.com ,,carol ");
        let members = source.list_members().await.unwrap_or_default();

        let identities: Vec<&str> = members
            .iter()
            .flat_map(|member| member.identities.iter().map(String::as_str))
            .collect();
        assert_eq!(identities, vec!["alice", "bob@co.com", "carol"]);
    }

    #[test]
    fn blank_list_is_empty() {
        assert!(StaticDirectorySource::from_list(" , ").is_empty());
        assert!(StaticDirectorySource::from_list("").is_empty());
    }
}
