//! Directory-supplied identities and the set of identities that should hold a role.

use std::collections::BTreeMap;

use rolesync_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// A single directory-supplied identity.
///
/// The variant is decided once, at the directory boundary: anything containing
/// `@` is an email, everything else a username.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IdentityToken {
    /// Username-shaped identity.
    Username(String),
    /// Email-shaped identity.
    Email(String),
}

impl IdentityToken {
    /// Parses a raw directory value, trimming surrounding whitespace.
    ///
    /// Returns `None` for empty or whitespace-only input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }

        if value.contains('@') {
            Some(Self::Email(value.to_owned()))
        } else {
            Some(Self::Username(value.to_owned()))
        }
    }

    /// Returns the normalized string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Username(value) | Self::Email(value) => value.as_str(),
        }
    }

    /// Returns whether the token is email-shaped.
    #[must_use]
    pub fn is_email(&self) -> bool {
        matches!(self, Self::Email(_))
    }

    /// Derives the create-account request for an identity with no platform account.
    ///
    /// Emails use their local part as username and keep the full address as
    /// email; usernames are used as-is with no email.
    pub fn new_account(&self) -> AppResult<NewAccount> {
        match self {
            Self::Username(username) => Ok(NewAccount {
                username: username.clone(),
                email: None,
            }),
            Self::Email(email) => {
                let local_part = email.split('@').next().unwrap_or_default().trim();
                if local_part.is_empty() {
                    return Err(AppError::Validation(format!(
                        "cannot derive a username from email '{email}'"
                    )));
                }

                Ok(NewAccount {
                    username: local_part.to_owned(),
                    email: Some(email.clone()),
                })
            }
        }
    }
}

impl std::fmt::Display for IdentityToken {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Account creation request derived from an unresolved identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    /// Username for the new account.
    pub username: String,
    /// Optional email for the new account.
    pub email: Option<String>,
}

/// One directory entry and every identity value it contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryMember {
    /// Where the member came from, for example an LDAP DN or `static`.
    pub source_ref: String,
    /// Raw identity values, before normalization.
    pub identities: Vec<String>,
}

impl DirectoryMember {
    /// Creates a directory member.
    #[must_use]
    pub fn new(source_ref: impl Into<String>, identities: Vec<String>) -> Self {
        Self {
            source_ref: source_ref.into(),
            identities,
        }
    }

    /// Returns the member's identities as parsed tokens, blanks dropped.
    #[must_use]
    pub fn tokens(&self) -> Vec<IdentityToken> {
        let mut tokens: Vec<IdentityToken> = self
            .identities
            .iter()
            .filter_map(|raw| IdentityToken::parse(raw))
            .collect();
        tokens.sort_by(|left, right| left.as_str().cmp(right.as_str()));
        tokens.dedup_by(|left, right| left.as_str() == right.as_str());
        tokens
    }
}

/// Deduplicated, sorted set of identities that should hold the role this run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSet {
    tokens: BTreeMap<String, IdentityToken>,
}

impl SyncSet {
    /// Builds a set from raw values, trimming and dropping blanks.
    pub fn from_raw<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = values
            .into_iter()
            .filter_map(|raw| IdentityToken::parse(raw.as_ref()))
            .map(|token| (token.as_str().to_owned(), token))
            .collect();

        Self { tokens }
    }

    /// Builds the union of every member's identities.
    #[must_use]
    pub fn from_members(members: &[DirectoryMember]) -> Self {
        Self::from_raw(
            members
                .iter()
                .flat_map(|member| member.identities.iter()),
        )
    }

    /// Returns whether no identity should hold the role.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns the number of distinct identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns whether the exact, trimmed value is in the set.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.tokens.contains_key(value)
    }

    /// Iterates tokens in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &IdentityToken> {
        self.tokens.values()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{DirectoryMember, IdentityToken, SyncSet};

    #[test]
    fn parse_tags_by_at_sign() {
        assert_eq!(
            IdentityToken::parse(" bob@co.com "),
            Some(IdentityToken::Email("bob@co.com".to_owned()))
        );
        assert_eq!(
            IdentityToken::parse("bob"),
            Some(IdentityToken::Username("bob".to_owned()))
        );
        assert_eq!(IdentityToken::parse("   "), None);
    }

    #[test]
    fn email_token_derives_username_from_local_part() {
        let token = IdentityToken::Email("carol.smith@co.com".to_owned());
        let request = token.new_account().unwrap_or_else(|_| unreachable!());

        assert_eq!(request.username, "carol.smith");
        assert_eq!(request.email.as_deref(), Some("carol.smith@co.com"));
    }

    #[test]
    fn email_token_without_local_part_cannot_create_account() {
        let token = IdentityToken::Email("@co.com".to_owned());
        assert!(token.new_account().is_err());
    }

    #[test]
    fn sync_set_trims_dedupes_and_drops_blanks() {
        let set = SyncSet::from_raw(["bob", " bob ", "", "alice@co.com", ",", "  "]);
        let values: Vec<&str> = set.iter().map(IdentityToken::as_str).collect();

        assert_eq!(values, vec![",", "alice@co.com", "bob"]);
    }

    #[test]
    fn sync_set_matching_is_case_sensitive() {
        let set = SyncSet::from_raw(["Bob@Co.com"]);
        assert!(set.contains("Bob@Co.com"));
        assert!(!set.contains("bob@co.com"));
    }

    #[test]
    fn member_tokens_are_deduplicated() {
        let member = DirectoryMember::new(
            "cn=bob,ou=users,dc=example,dc=org",
            vec!["bob@co.com".to_owned(), " bob@co.com".to_owned()],
        );
        assert_eq!(member.tokens().len(), 1);
    }

    proptest! {
        #[test]
        fn sync_set_never_holds_blank_or_untrimmed_tokens(
            raw in proptest::collection::vec("[ a-z@.]{0,8}", 0..16),
        ) {
            let set = SyncSet::from_raw(raw.iter());
            let values: Vec<&str> = set.iter().map(IdentityToken::as_str).collect();

            for value in &values {
                prop_assert!(!value.is_empty());
                prop_assert_eq!(*value, value.trim());
            }
            let mut sorted = values.clone();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(sorted, values);
        }
    }
}
