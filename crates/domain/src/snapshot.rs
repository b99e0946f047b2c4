use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Account, AccountId, RoleId};

/// Point-in-time capture of every platform account and its roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    captured_at: DateTime<Utc>,
    accounts: Vec<Account>,
}

impl Snapshot {
    /// Creates a snapshot captured at the given instant.
    #[must_use]
    pub fn new(accounts: Vec<Account>, captured_at: DateTime<Utc>) -> Self {
        Self {
            captured_at,
            accounts,
        }
    }

    /// Returns the capture time.
    #[must_use]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Returns every account in platform order.
    #[must_use]
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Consumes the snapshot, returning its accounts.
    #[must_use]
    pub fn into_accounts(self) -> Vec<Account> {
        self.accounts
    }

    /// Returns accounts currently holding the role, in snapshot order.
    #[must_use]
    pub fn role_holders(&self, role_id: &RoleId) -> Vec<&Account> {
        self.accounts
            .iter()
            .filter(|account| account.holds_role(role_id))
            .collect()
    }

    /// Finds an account by its stable identifier.
    #[must_use]
    pub fn find(&self, account_id: &AccountId) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|account| account.id() == account_id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::Snapshot;
    use crate::{Account, AccountId, RoleId, RoleRef};

    #[test]
    fn role_holders_keep_snapshot_order() {
        let cody = RoleId::new("cody").unwrap_or_else(|_| unreachable!());
        let holder = |id: &str, name: &str| {
            Account::new(
                AccountId::new(id).unwrap_or_else(|_| unreachable!()),
                name,
                Vec::new(),
                vec![RoleRef::new(cody.clone(), "Cody Users")],
            )
            .unwrap_or_else(|_| unreachable!())
        };
        let outsider = Account::new(
            AccountId::new("3").unwrap_or_else(|_| unreachable!()),
            "mallory",
            Vec::new(),
            Vec::new(),
        )
        .unwrap_or_else(|_| unreachable!());
        let snapshot = Snapshot::new(
            vec![holder("2", "zed"), outsider, holder("1", "amy")],
            Utc::now(),
        );

        let names: Vec<&str> = snapshot
            .role_holders(&cody)
            .into_iter()
            .map(Account::username)
            .collect();
        assert_eq!(names, vec!["zed", "amy"]);
    }
}
