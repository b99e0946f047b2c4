use super::*;

impl ReconciliationService {
    /// Grants the role to every SyncSet identity not yet covered by a holder.
    pub(super) async fn apply_additions(
        &self,
        context: &mut RunContext,
        role_id: &RoleId,
        start: &Snapshot,
        collected: &CollectedSyncSet,
    ) {
        let plan = compute_additions(start, role_id, &collected.sync_set, &collected.members);
        info!(
            run_id = %context.run_id(),
            grants = plan.grants.len(),
            already_compliant = plan.already_compliant.len(),
            unresolved = plan.unresolved.len(),
            conflicts = plan.conflicts.len(),
            "computed role additions"
        );

        for token in &plan.already_compliant {
            debug!(run_id = %context.run_id(), identity = %token, "already holds the role");
        }
        context.summary_mut().already_compliant += plan.already_compliant.len();

        for conflict in &plan.conflicts {
            warn!(
                run_id = %context.run_id(),
                source_ref = %conflict.source_ref,
                identities = ?conflict.identities,
                account_ids = ?conflict
                    .account_ids
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>(),
                "identity maps to more than one account; not granting the role"
            );
        }
        context.summary_mut().identity_conflicts += plan.conflicts.len();

        for grant in plan.grants {
            let outcome = self
                .applier
                .set_roles(&grant.account_id, &grant.username, &grant.role_ids)
                .await;
            record_grant(context, grant.account_id, &outcome);
        }

        for token in plan.unresolved {
            if self.options.create_missing_accounts {
                self.create_and_grant(context, role_id, &token).await;
            } else {
                warn!(
                    run_id = %context.run_id(),
                    identity = %token,
                    "identity matches no account; skipping"
                );
                context.summary_mut().skipped_unresolved += 1;
            }
        }
    }

    async fn create_and_grant(
        &self,
        context: &mut RunContext,
        role_id: &RoleId,
        token: &IdentityToken,
    ) {
        let request = match token.new_account() {
            Ok(request) => request,
            Err(error) => {
                warn!(
                    run_id = %context.run_id(),
                    identity = %token,
                    error = %error,
                    "can not derive an account from identity"
                );
                context.summary_mut().creation_failures += 1;
                return;
            }
        };

        match self.applier.create_account(&request).await {
            CreationOutcome::Created(account) => {
                context.summary_mut().created += 1;
                let outcome = self
                    .applier
                    .set_roles(account.id(), account.username(), &account.role_ids_with(role_id))
                    .await;
                record_grant(context, account.id().clone(), &outcome);
            }
            CreationOutcome::DryRun => {
                context.summary_mut().created += 1;
                context.summary_mut().added += 1;
            }
            CreationOutcome::Failed(_) => {
                context.summary_mut().creation_failures += 1;
            }
        }
    }
}

fn record_grant(context: &mut RunContext, account_id: AccountId, outcome: &MutationOutcome) {
    match outcome {
        MutationOutcome::Applied => context.summary_mut().added += 1,
        MutationOutcome::DryRun => {
            context.summary_mut().added += 1;
            return;
        }
        MutationOutcome::Failed(_) => context.summary_mut().addition_failures += 1,
    }
    context.record_grant(account_id);
}
