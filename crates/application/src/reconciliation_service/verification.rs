use std::collections::{BTreeSet, HashSet};

use rolesync_domain::{Account, AccountId, RoleId, Snapshot};

/// Differences between the intended and the observed end state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    /// Holders in the end snapshot.
    pub holders_at_end: usize,
    /// Accounts that should hold the role but do not.
    pub missing_grants: Vec<String>,
    /// Accounts that hold the role but should not.
    pub lingering_holders: Vec<String>,
    /// Accounts whose other roles differ from the start snapshot.
    pub unrelated_role_changes: Vec<String>,
}

impl VerificationReport {
    /// Returns whether the end state matches the intent.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.missing_grants.is_empty()
            && self.lingering_holders.is_empty()
            && self.unrelated_role_changes.is_empty()
    }
}

/// Compares the end snapshot with the start snapshot plus the sent mutations.
///
/// A mutation the platform rejected therefore shows up as drift.
#[must_use]
pub fn verify_end_state(
    start: &Snapshot,
    end: &Snapshot,
    role_id: &RoleId,
    removed: &[AccountId],
    granted: &[AccountId],
) -> VerificationReport {
    let removed: HashSet<&AccountId> = removed.iter().collect();
    let mut expected: BTreeSet<&AccountId> = start
        .role_holders(role_id)
        .into_iter()
        .map(Account::id)
        .filter(|account_id| !removed.contains(account_id))
        .collect();
    expected.extend(granted.iter());

    let actual: BTreeSet<&AccountId> = end
        .role_holders(role_id)
        .into_iter()
        .map(Account::id)
        .collect();

    let display_name = |account_id: &AccountId| {
        end.find(account_id)
            .or_else(|| start.find(account_id))
            .map_or_else(|| account_id.to_string(), |account| account.username().to_owned())
    };

    let unrelated_role_changes = end
        .accounts()
        .iter()
        .filter_map(|after| {
            let before = start.find(after.id())?;
            let before_roles: BTreeSet<RoleId> = before.role_ids_without(role_id).into_iter().collect();
            let after_roles: BTreeSet<RoleId> = after.role_ids_without(role_id).into_iter().collect();
            (before_roles != after_roles).then(|| after.username().to_owned())
        })
        .collect();

    VerificationReport {
        holders_at_end: actual.len(),
        missing_grants: expected
            .difference(&actual)
            .map(|account_id| display_name(account_id))
            .collect(),
        lingering_holders: actual
            .difference(&expected)
            .map(|account_id| display_name(account_id))
            .collect(),
        unrelated_role_changes,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use rolesync_domain::{Account, AccountId, RoleId, RoleRef, Snapshot};

    use super::verify_end_state;

    fn role(id: &str) -> RoleRef {
        RoleRef::new(RoleId::new(id).unwrap_or_else(|_| unreachable!()), id)
    }

    fn account(id: &str, username: &str, roles: &[&str]) -> Account {
        Account::new(
            AccountId::new(id).unwrap_or_else(|_| unreachable!()),
            username,
            Vec::new(),
            roles.iter().map(|id| role(id)).collect(),
        )
        .unwrap_or_else(|_| unreachable!())
    }

    fn id(value: &str) -> AccountId {
        AccountId::new(value).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn applied_changes_verify_clean() {
        let cody = role("cody").id;
        let start = Snapshot::new(
            vec![account("1", "alice", &["cody"]), account("2", "bob", &["user"])],
            Utc::now(),
        );
        let end = Snapshot::new(
            vec![account("1", "alice", &[]), account("2", "bob", &["user", "cody"])],
            Utc::now(),
        );

        let report = verify_end_state(&start, &end, &cody, &[id("1")], &[id("2")]);
        assert!(report.is_clean());
        assert_eq!(report.holders_at_end, 1);
    }

    #[test]
    fn drift_is_reported_per_category() {
        let cody = role("cody").id;
        let start = Snapshot::new(
            vec![
                account("1", "alice", &["cody"]),
                account("2", "bob", &["user"]),
                account("3", "carol", &["user"]),
            ],
            Utc::now(),
        );
        let end = Snapshot::new(
            vec![
                account("1", "alice", &["cody"]),
                account("2", "bob", &[]),
                account("3", "carol", &["user"]),
            ],
            Utc::now(),
        );

        let report = verify_end_state(&start, &end, &cody, &[id("1")], &[id("2")]);
        assert_eq!(report.lingering_holders, vec!["alice".to_owned()]);
        assert_eq!(report.missing_grants, vec!["bob".to_owned()]);
        assert_eq!(report.unrelated_role_changes, vec!["bob".to_owned()]);
    }
}
