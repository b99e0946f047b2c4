use super::*;

impl ReconciliationService {
    /// Removes the role from every start holder the SyncSet does not cover.
    pub(super) async fn apply_removals(
        &self,
        context: &mut RunContext,
        role_id: &RoleId,
        start: &Snapshot,
        collected: &CollectedSyncSet,
    ) {
        let holders = start.role_holders(role_id);
        let removals = compute_removals(&holders, &collected.sync_set, role_id);
        info!(
            run_id = %context.run_id(),
            holders = holders.len(),
            removals = removals.len(),
            "computed role removals"
        );

        for removal in removals {
            info!(
                run_id = %context.run_id(),
                username = %removal.username,
                "account holds the role but is not in the identity list; removing"
            );

            let outcome = self
                .applier
                .set_roles(&removal.account_id, &removal.username, &removal.role_ids)
                .await;
            match outcome {
                MutationOutcome::Applied => context.summary_mut().removed += 1,
                MutationOutcome::DryRun => {
                    context.summary_mut().removed += 1;
                    continue;
                }
                MutationOutcome::Failed(_) => context.summary_mut().removal_failures += 1,
            }
            context.record_removal(removal.account_id);
        }
    }
}
