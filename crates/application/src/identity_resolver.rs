//! Maps directory identities to platform accounts.

use std::collections::HashMap;

use rolesync_domain::{Account, AccountId, Snapshot};

/// Outcome of resolving one identity against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// Exactly one account matches.
    Found(&'a Account),
    /// No username or verified email matches.
    NotFound,
    /// Several accounts match, in snapshot order.
    Ambiguous(Vec<&'a Account>),
}

impl<'a> Resolution<'a> {
    /// Returns the snapshot-order first match, if any.
    #[must_use]
    pub fn first(&self) -> Option<&'a Account> {
        match self {
            Self::Found(account) => Some(*account),
            Self::NotFound => None,
            Self::Ambiguous(candidates) => candidates.first().copied(),
        }
    }

    /// Returns the ids of every matching account.
    #[must_use]
    pub fn account_ids(&self) -> Vec<AccountId> {
        match self {
            Self::Found(account) => vec![account.id().clone()],
            Self::NotFound => Vec::new(),
            Self::Ambiguous(candidates) => candidates
                .iter()
                .map(|account| account.id().clone())
                .collect(),
        }
    }
}

/// Index from every username and verified email to the accounts owning it.
///
/// Unverified emails are never indexed, so they can not be used to obtain a
/// role grant.
#[derive(Debug)]
pub struct IdentityIndex<'a> {
    entries: HashMap<&'a str, Vec<&'a Account>>,
}

impl<'a> IdentityIndex<'a> {
    /// Builds the index once for a snapshot.
    #[must_use]
    pub fn build(snapshot: &'a Snapshot) -> Self {
        let mut entries: HashMap<&'a str, Vec<&'a Account>> = HashMap::new();
        for account in snapshot.accounts() {
            for value in account.identity_surface() {
                entries.entry(value).or_default().push(account);
            }
        }

        Self { entries }
    }

    /// Resolves an exact, case-sensitive identity; surrounding whitespace is ignored.
    #[must_use]
    pub fn resolve(&self, value: &str) -> Resolution<'a> {
        match self.entries.get(value.trim()).map(Vec::as_slice) {
            None | Some([]) => Resolution::NotFound,
            Some([account]) => Resolution::Found(*account),
            Some(candidates) => Resolution::Ambiguous(candidates.to_vec()),
        }
    }
}
