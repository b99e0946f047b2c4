use tracing::{info, warn};
use uuid::Uuid;

use super::VerificationReport;

/// Counters and flags describing one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Correlation id shared with the backup record and run logs.
    pub run_id: Uuid,
    /// Name of the synchronized role.
    pub role_name: String,
    /// Mutations were logged, not sent.
    pub dry_run: bool,
    /// Accounts holding the role in the start snapshot.
    pub holders_at_start: usize,
    /// Distinct identities in the SyncSet.
    pub sync_set_size: usize,
    /// Holders that lost the role.
    pub removed: usize,
    /// Removals the platform did not accept.
    pub removal_failures: usize,
    /// Accounts that gained the role, created accounts included.
    pub added: usize,
    /// Grants the platform did not accept.
    pub addition_failures: usize,
    /// Identities whose account already held the role.
    pub already_compliant: usize,
    /// Accounts created for unresolved identities.
    pub created: usize,
    /// Account creations the platform did not accept.
    pub creation_failures: usize,
    /// Unresolved identities left alone because creation is disabled.
    pub skipped_unresolved: usize,
    /// Identities excluded because they map to several accounts.
    pub identity_conflicts: usize,
    /// Holders after the run; `None` when verification did not run.
    pub holders_at_end: Option<usize>,
    /// Failed directory sources, when the SyncSet is incomplete.
    pub degradation: Option<String>,
    /// Why the removal phase did not run.
    pub removals_skipped: Option<String>,
    /// End-state comparison, when verification ran.
    pub verification: Option<VerificationReport>,
}

impl RunSummary {
    /// Number of mutations and creations that did not go through.
    #[must_use]
    pub fn mutation_failures(&self) -> usize {
        self.removal_failures + self.addition_failures + self.creation_failures
    }

    /// Returns whether anything in the run needs operator attention.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.mutation_failures() > 0
            || self.identity_conflicts > 0
            || self.degradation.is_some()
            || self
                .verification
                .as_ref()
                .is_some_and(|report| !report.is_clean())
    }

    /// Writes the summary to the log.
    pub fn emit(&self) {
        info!(
            run_id = %self.run_id,
            role = %self.role_name,
            dry_run = self.dry_run,
            holders_at_start = self.holders_at_start,
            sync_set_size = self.sync_set_size,
            removed = self.removed,
            removal_failures = self.removal_failures,
            added = self.added,
            addition_failures = self.addition_failures,
            already_compliant = self.already_compliant,
            created = self.created,
            creation_failures = self.creation_failures,
            skipped_unresolved = self.skipped_unresolved,
            identity_conflicts = self.identity_conflicts,
            holders_at_end = ?self.holders_at_end,
            "reconciliation run summary"
        );

        if let Some(reason) = &self.degradation {
            warn!(
                run_id = %self.run_id,
                reason = %reason,
                "directory was incomplete this run; role removals were not applied"
            );
        } else if let Some(reason) = &self.removals_skipped {
            info!(run_id = %self.run_id, reason = %reason, "role removals skipped");
        }

        if self.mutation_failures() > 0 {
            warn!(
                run_id = %self.run_id,
                failures = self.mutation_failures(),
                "some mutations failed; the next run will retry them"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RunSummary;
    use crate::reconciliation_service::VerificationReport;

    #[test]
    fn clean_summary_has_no_failures() {
        let summary = RunSummary {
            removed: 1,
            added: 2,
            ..RunSummary::default()
        };

        assert!(!summary.has_failures());
    }

    #[test]
    fn degradation_and_drift_count_as_failures() {
        let degraded = RunSummary {
            degradation: Some("ldap: unavailable".to_owned()),
            ..RunSummary::default()
        };
        assert!(degraded.has_failures());

        let drifted = RunSummary {
            verification: Some(VerificationReport {
                holders_at_end: 1,
                missing_grants: vec!["bob".to_owned()],
                ..VerificationReport::default()
            }),
            ..RunSummary::default()
        };
        assert!(drifted.has_failures());
    }
}
