//! Pure delta computation between the SyncSet and the start snapshot.

use std::collections::{BTreeSet, HashSet};

use rolesync_domain::{
    Account, AccountId, DirectoryMember, IdentityToken, RoleId, Snapshot, SyncSet,
};

use crate::{IdentityIndex, Resolution};

/// Role holder that must lose the role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRemoval {
    /// Account losing the role.
    pub account_id: AccountId,
    /// Username, for logs.
    pub username: String,
    /// Complete role list to send: every held role except the synced one.
    pub role_ids: Vec<RoleId>,
}

/// Existing account that must gain the role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedGrant {
    /// Identity that resolved to the account.
    pub token: IdentityToken,
    /// Account gaining the role.
    pub account_id: AccountId,
    /// Username, for logs.
    pub username: String,
    /// Complete role list to send: every held role plus the synced one.
    pub role_ids: Vec<RoleId>,
}

/// Identity that can not be attributed to a single account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConflict {
    /// Directory member, or `platform` when a single value matches several accounts.
    pub source_ref: String,
    /// Identity values involved.
    pub identities: Vec<String>,
    /// Every account the identities resolve to, in snapshot order.
    pub account_ids: Vec<AccountId>,
}

/// Addition-phase work derived from the start snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdditionPlan {
    /// Role grants for existing accounts, one per account.
    pub grants: Vec<PlannedGrant>,
    /// Identities whose account already holds the role or is granted by an earlier identity.
    pub already_compliant: Vec<IdentityToken>,
    /// Identities matching no account.
    pub unresolved: Vec<IdentityToken>,
    /// Identities excluded because they map to several accounts.
    pub conflicts: Vec<IdentityConflict>,
}

/// Holders whose identity surface has no intersection with the SyncSet.
#[must_use]
pub fn compute_removals(
    holders: &[&Account],
    sync_set: &SyncSet,
    role_id: &RoleId,
) -> Vec<PlannedRemoval> {
    holders
        .iter()
        .filter(|account| {
            !account
                .identity_surface()
                .into_iter()
                .any(|value| sync_set.contains(value))
        })
        .map(|account| PlannedRemoval {
            account_id: account.id().clone(),
            username: account.username().to_owned(),
            role_ids: account.role_ids_without(role_id),
        })
        .collect()
}

/// Identities not yet covered by a role holder, resolved against the snapshot.
#[must_use]
pub fn compute_additions(
    snapshot: &Snapshot,
    role_id: &RoleId,
    sync_set: &SyncSet,
    members: &[DirectoryMember],
) -> AdditionPlan {
    let covered: HashSet<&str> = snapshot
        .role_holders(role_id)
        .into_iter()
        .flat_map(Account::identity_surface)
        .collect();
    let index = IdentityIndex::build(snapshot);

    let mut plan = AdditionPlan {
        conflicts: member_conflicts(&index, members),
        ..AdditionPlan::default()
    };
    let conflicted: HashSet<String> = plan
        .conflicts
        .iter()
        .flat_map(|conflict| conflict.identities.iter().cloned())
        .collect();
    let mut planned_accounts: HashSet<AccountId> = HashSet::new();

    for token in sync_set.iter() {
        if covered.contains(token.as_str()) {
            plan.already_compliant.push(token.clone());
            continue;
        }

        if conflicted.contains(token.as_str()) {
            continue;
        }

        match index.resolve(token.as_str()) {
            Resolution::Found(account) => {
                if planned_accounts.insert(account.id().clone()) {
                    plan.grants.push(PlannedGrant {
                        token: token.clone(),
                        account_id: account.id().clone(),
                        username: account.username().to_owned(),
                        role_ids: account.role_ids_with(role_id),
                    });
                } else {
                    plan.already_compliant.push(token.clone());
                }
            }
            Resolution::NotFound => plan.unresolved.push(token.clone()),
            ambiguous @ Resolution::Ambiguous(_) => plan.conflicts.push(IdentityConflict {
                source_ref: "platform".to_owned(),
                identities: vec![token.as_str().to_owned()],
                account_ids: ambiguous.account_ids(),
            }),
        }
    }

    plan
}

/// Directory members whose identities resolve to more than one distinct account.
fn member_conflicts(
    index: &IdentityIndex<'_>,
    members: &[DirectoryMember],
) -> Vec<IdentityConflict> {
    let mut conflicts = Vec::new();

    for member in members {
        let tokens = member.tokens();
        if tokens.len() < 2 {
            continue;
        }

        let mut seen = BTreeSet::new();
        let mut account_ids = Vec::new();
        for token in &tokens {
            for account_id in index.resolve(token.as_str()).account_ids() {
                if seen.insert(account_id.clone()) {
                    account_ids.push(account_id);
                }
            }
        }

        if account_ids.len() > 1 {
            conflicts.push(IdentityConflict {
                source_ref: member.source_ref.clone(),
                identities: tokens
                    .iter()
                    .map(|token| token.as_str().to_owned())
                    .collect(),
                account_ids,
            });
        }
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use proptest::prelude::*;

    use rolesync_domain::{
        Account, AccountEmail, AccountId, DirectoryMember, RoleId, RoleRef, Snapshot, SyncSet,
    };

    use super::{compute_additions, compute_removals};

    fn role_id(id: &str) -> RoleId {
        RoleId::new(id).unwrap_or_else(|_| unreachable!())
    }

    fn account(id: &str, username: &str, emails: &[(&str, bool)], roles: &[&str]) -> Account {
        Account::new(
            AccountId::new(id).unwrap_or_else(|_| unreachable!()),
            username,
            emails
                .iter()
                .map(|(email, verified)| AccountEmail {
                    email: (*email).to_owned(),
                    verified: *verified,
                })
                .collect(),
            roles
                .iter()
                .map(|role| RoleRef::new(role_id(role), *role))
                .collect(),
        )
        .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn holder_matched_by_any_verified_email_is_kept() {
        let alice = account(
            "1",
            "alice",
            &[("alice@co.com", true), ("a@co.com", true)],
            &["user", "cody"],
        );
        let holders = vec![&alice];

        let kept = compute_removals(&holders, &SyncSet::from_raw(["a@co.com"]), &role_id("cody"));
        assert!(kept.is_empty());

        let removed = compute_removals(&holders, &SyncSet::from_raw(["bob"]), &role_id("cody"));
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].role_ids, vec![role_id("user")]);
    }

    #[test]
    fn holder_matched_only_by_unverified_email_is_removed() {
        let alice = account("1", "alice", &[("alice@co.com", false)], &["cody"]);
        let holders = vec![&alice];

        let removed = compute_removals(
            &holders,
            &SyncSet::from_raw(["alice@co.com"]),
            &role_id("cody"),
        );
        assert_eq!(removed.len(), 1);
        assert!(removed[0].role_ids.is_empty());
    }

    #[test]
    fn two_identities_for_one_account_produce_one_grant() {
        let snapshot = Snapshot::new(
            vec![account("2", "bob", &[("bob@co.com", true)], &["user"])],
            Utc::now(),
        );
        let sync_set = SyncSet::from_raw(["bob", "bob@co.com"]);

        let plan = compute_additions(&snapshot, &role_id("cody"), &sync_set, &[]);
        assert_eq!(plan.grants.len(), 1);
        assert_eq!(plan.grants[0].role_ids, vec![role_id("user"), role_id("cody")]);
        assert_eq!(plan.already_compliant.len(), 1);
    }

    #[test]
    fn member_spanning_two_accounts_is_a_conflict_and_not_granted() {
        let snapshot = Snapshot::new(
            vec![
                account("1", "erin", &[("erin@co.com", true)], &[]),
                account("2", "erin2", &[("erin.alt@co.com", true)], &[]),
            ],
            Utc::now(),
        );
        let members = vec![DirectoryMember::new(
            "cn=erin,ou=users,dc=example,dc=org",
            vec!["erin@co.com".to_owned(), "erin.alt@co.com".to_owned()],
        )];
        let sync_set = SyncSet::from_members(&members);

        let plan = compute_additions(&snapshot, &role_id("cody"), &sync_set, &members);
        assert!(plan.grants.is_empty());
        assert_eq!(plan.conflicts.len(), 1);
        assert_eq!(plan.conflicts[0].account_ids.len(), 2);
    }

    #[test]
    fn unresolved_identity_is_reported() {
        let snapshot = Snapshot::new(vec![account("1", "alice", &[], &[])], Utc::now());
        let plan = compute_additions(
            &snapshot,
            &role_id("cody"),
            &SyncSet::from_raw(["carol@co.com"]),
            &[],
        );

        assert_eq!(plan.unresolved.len(), 1);
        assert!(plan.grants.is_empty());
    }

    proptest! {
        #[test]
        fn holder_is_removed_iff_surface_misses_sync_set(
            usernames in proptest::collection::btree_set("[a-d]{1,2}", 1..6),
            wanted in proptest::collection::vec("[a-d]{1,2}(@co\\.com)?", 0..8),
        ) {
            let accounts: Vec<Account> = usernames
                .iter()
                .enumerate()
                .map(|(position, username)| {
                    let email = format!("{username}@co.com");
                    account(
                        &position.to_string(),
                        username,
                        &[(email.as_str(), position % 2 == 0)],
                        &["cody"],
                    )
                })
                .collect();
            let holders: Vec<&Account> = accounts.iter().collect();
            let sync_set = SyncSet::from_raw(wanted.iter());

            let removed = compute_removals(&holders, &sync_set, &role_id("cody"));
            for holder in &holders {
                let in_sync_set = holder
                    .identity_surface()
                    .into_iter()
                    .any(|value| sync_set.contains(value));
                let is_removed = removed.iter().any(|removal| &removal.account_id == holder.id());
                prop_assert_eq!(is_removed, !in_sync_set);
            }
        }
    }
}
