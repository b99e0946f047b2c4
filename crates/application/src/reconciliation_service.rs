use std::sync::Arc;

use chrono::Utc;
use rolesync_core::{AppError, AppResult, NonEmptyString};
use rolesync_domain::{AccountId, IdentityToken, Role, RoleId, Snapshot};
use tracing::{debug, error, info, warn};

use crate::backup_ports::{SnapshotBackup, SnapshotBackupSink};
use crate::mutation_applier::{CreationOutcome, MutationApplier, MutationOutcome};
use crate::sync_set_service::{CollectedSyncSet, SyncSetService};
use crate::PlatformGateway;

mod additions;
mod plan;
mod removals;
mod run_context;
mod summary;
mod verification;

pub use plan::{
    AdditionPlan, IdentityConflict, PlannedGrant, PlannedRemoval, compute_additions,
    compute_removals,
};
pub use run_context::{RunContext, RunPhase};
pub use summary::RunSummary;
pub use verification::{VerificationReport, verify_end_state};

/// Behaviour switches for a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationOptions {
    /// Allows an empty SyncSet to strip the role from every holder.
    pub confirm_remove_all: bool,
    /// Never removes the role from anyone.
    pub additions_only: bool,
    /// Creates accounts for identities that match no account.
    pub create_missing_accounts: bool,
    /// Logs every mutation without sending it.
    pub dry_run: bool,
    /// Re-reads accounts after the run and reports drift.
    pub verify: bool,
}

impl Default for ReconciliationOptions {
    fn default() -> Self {
        Self {
            confirm_remove_all: false,
            additions_only: false,
            create_missing_accounts: false,
            dry_run: false,
            verify: true,
        }
    }
}

/// Whether the removal phase may run.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RemovalGate {
    Proceed,
    Skip(String),
}

/// Makes the role's holder set on the platform match the SyncSet.
#[derive(Clone)]
pub struct ReconciliationService {
    gateway: Arc<dyn PlatformGateway>,
    sync_set_service: SyncSetService,
    backup_sink: Option<Arc<dyn SnapshotBackupSink>>,
    applier: MutationApplier,
    role_name: NonEmptyString,
    options: ReconciliationOptions,
}

impl ReconciliationService {
    /// Creates a reconciliation service for one role.
    ///
    /// Without a backup sink the start snapshot is not persisted.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn PlatformGateway>,
        sync_set_service: SyncSetService,
        backup_sink: Option<Arc<dyn SnapshotBackupSink>>,
        role_name: NonEmptyString,
        options: ReconciliationOptions,
    ) -> Self {
        Self {
            applier: MutationApplier::new(gateway.clone(), options.dry_run),
            gateway,
            sync_set_service,
            backup_sink,
            role_name,
            options,
        }
    }

    /// Runs one full reconciliation.
    ///
    /// Errors are fatal preconditions (caller not admin, role missing, empty
    /// SyncSet without confirmation, snapshot or backup failure). Individual
    /// mutation failures are counted in the returned summary instead.
    pub async fn run(&self) -> AppResult<RunSummary> {
        let mut context = RunContext::new(self.role_name.as_str(), self.options.dry_run);
        info!(
            run_id = %context.run_id(),
            role = %self.role_name,
            dry_run = self.options.dry_run,
            additions_only = self.options.additions_only,
            "reconciliation run started"
        );

        self.require_site_admin().await?;
        let role = self.resolve_role().await?;

        let collected = self.sync_set_service.collect().await;
        context.summary_mut().sync_set_size = collected.sync_set.len();
        context.summary_mut().degradation = collected.degradation_reason();
        let gate = self.evaluate_removal_gate(&collected)?;

        let start = self.capture_snapshot().await?;
        context.summary_mut().holders_at_start = start.role_holders(role.id()).len();
        info!(
            run_id = %context.run_id(),
            account_count = start.accounts().len(),
            holders = context.summary().holders_at_start,
            "start snapshot captured"
        );
        context.advance(RunPhase::SnapshotLoaded)?;

        self.back_up(&context, &role, &start).await?;
        context.advance(RunPhase::BackedUp)?;

        match gate {
            RemovalGate::Proceed => {
                self.apply_removals(&mut context, role.id(), &start, &collected)
                    .await;
            }
            RemovalGate::Skip(reason) => {
                info!(run_id = %context.run_id(), reason = %reason, "skipping role removals");
                context.summary_mut().removals_skipped = Some(reason);
            }
        }
        context.advance(RunPhase::RemovalsApplied)?;

        self.apply_additions(&mut context, role.id(), &start, &collected)
            .await;
        context.advance(RunPhase::AdditionsApplied)?;

        if self.options.verify {
            self.verify(&mut context, role.id(), &start).await;
        } else {
            debug!(run_id = %context.run_id(), "end-state verification disabled");
        }
        context.advance(RunPhase::Verified)?;

        context.summary().emit();
        context.advance(RunPhase::Done)?;

        Ok(context.into_summary())
    }

    async fn require_site_admin(&self) -> AppResult<()> {
        let caller = self.gateway.current_caller().await?;
        if !caller.site_admin {
            return Err(AppError::Forbidden(format!(
                "platform user '{}' is not a site admin; use an access token of a site admin",
                caller.username
            )));
        }

        info!(username = %caller.username, "authenticated as site admin");
        Ok(())
    }

    async fn resolve_role(&self) -> AppResult<Role> {
        let roles = self.gateway.list_roles().await?;
        let mut matches = roles
            .iter()
            .filter(|role| role.name() == self.role_name.as_str());

        let Some(role) = matches.next() else {
            let available = roles
                .iter()
                .map(Role::name)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(AppError::NotFound(format!(
                "role '{}' does not exist on the platform; available roles: {available}",
                self.role_name
            )));
        };

        if matches.next().is_some() {
            return Err(AppError::Conflict(format!(
                "role name '{}' matches more than one platform role",
                self.role_name
            )));
        }

        info!(
            role = %role.name(),
            role_id = %role.id(),
            permissions = ?role
                .permissions()
                .iter()
                .map(|permission| permission.display_name.as_str())
                .collect::<Vec<_>>(),
            "resolved role"
        );
        Ok(role.clone())
    }

    fn evaluate_removal_gate(&self, collected: &CollectedSyncSet) -> AppResult<RemovalGate> {
        if collected.sync_set.is_empty() {
            if !self.options.confirm_remove_all {
                return Err(AppError::Validation(format!(
                    "no identities to sync for role '{}' and removing the role from every \
                     holder was not confirmed",
                    self.role_name
                )));
            }

            if !collected.is_degraded() && !self.options.additions_only {
                warn!(
                    role = %self.role_name,
                    "no identities to sync; removing the role from every holder as confirmed"
                );
            }
        }

        if let Some(reason) = collected.degradation_reason() {
            error!(
                role = %self.role_name,
                reason = %reason,
                "directory source unavailable; the identity list is incomplete"
            );
            return Ok(RemovalGate::Skip(format!("directory incomplete: {reason}")));
        }

        if self.options.additions_only {
            return Ok(RemovalGate::Skip("additions-only mode".to_owned()));
        }

        Ok(RemovalGate::Proceed)
    }

    async fn capture_snapshot(&self) -> AppResult<Snapshot> {
        let accounts = self.gateway.list_accounts().await?;
        if accounts.is_empty() {
            return Err(AppError::NotFound(
                "platform returned no accounts".to_owned(),
            ));
        }

        Ok(Snapshot::new(accounts, Utc::now()))
    }

    async fn back_up(&self, context: &RunContext, role: &Role, start: &Snapshot) -> AppResult<()> {
        let Some(sink) = &self.backup_sink else {
            info!(run_id = %context.run_id(), "snapshot backup disabled");
            return Ok(());
        };

        let backup = SnapshotBackup {
            run_id: context.run_id(),
            captured_at: start.captured_at(),
            backup_time: Utc::now(),
            role: role.clone(),
            accounts: start.accounts().to_vec(),
        };

        sink.persist(&backup).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to back up account snapshot to {}: {error}",
                sink.destination()
            ))
        })?;

        info!(
            run_id = %context.run_id(),
            destination = %sink.destination(),
            account_count = backup.accounts.len(),
            "account snapshot backed up"
        );
        Ok(())
    }

    async fn verify(&self, context: &mut RunContext, role_id: &RoleId, start: &Snapshot) {
        let end = match self.capture_snapshot().await {
            Ok(end) => end,
            Err(error) => {
                warn!(
                    run_id = %context.run_id(),
                    error = %error,
                    "could not read accounts for end-state verification"
                );
                return;
            }
        };

        let report = verify_end_state(start, &end, role_id, context.removed(), context.granted());
        for username in &report.missing_grants {
            warn!(run_id = %context.run_id(), username = %username, "expected role holder does not hold the role");
        }
        for username in &report.lingering_holders {
            warn!(run_id = %context.run_id(), username = %username, "account still holds the role unexpectedly");
        }
        for username in &report.unrelated_role_changes {
            warn!(run_id = %context.run_id(), username = %username, "account's other roles changed during the run");
        }

        context.summary_mut().holders_at_end = Some(report.holders_at_end);
        context.summary_mut().verification = Some(report);
    }
}
