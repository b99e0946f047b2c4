use rolesync_core::{AppError, AppResult};
use rolesync_domain::AccountId;
use uuid::Uuid;

use super::RunSummary;

/// Ordered phases of one run. A phase is only entered after the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    /// Preconditions checked, SyncSet collected.
    Init,
    /// Start snapshot captured.
    SnapshotLoaded,
    /// Start snapshot persisted, or backup disabled.
    BackedUp,
    /// Removal phase finished or skipped.
    RemovalsApplied,
    /// Addition phase finished.
    AdditionsApplied,
    /// End state compared, or verification disabled.
    Verified,
    /// Summary emitted.
    Done,
}

impl RunPhase {
    /// Returns the phase that follows this one.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::SnapshotLoaded),
            Self::SnapshotLoaded => Some(Self::BackedUp),
            Self::BackedUp => Some(Self::RemovalsApplied),
            Self::RemovalsApplied => Some(Self::AdditionsApplied),
            Self::AdditionsApplied => Some(Self::Verified),
            Self::Verified => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Stable lowercase name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::SnapshotLoaded => "snapshot_loaded",
            Self::BackedUp => "backed_up",
            Self::RemovalsApplied => "removals_applied",
            Self::AdditionsApplied => "additions_applied",
            Self::Verified => "verified",
            Self::Done => "done",
        }
    }
}

/// Mutable state threaded through the phases of one run.
#[derive(Debug)]
pub struct RunContext {
    phase: RunPhase,
    summary: RunSummary,
    removed: Vec<AccountId>,
    granted: Vec<AccountId>,
}

impl RunContext {
    /// Starts a run in [`RunPhase::Init`] with a fresh run id.
    #[must_use]
    pub fn new(role_name: impl Into<String>, dry_run: bool) -> Self {
        Self {
            phase: RunPhase::Init,
            summary: RunSummary {
                run_id: Uuid::new_v4(),
                role_name: role_name.into(),
                dry_run,
                ..RunSummary::default()
            },
            removed: Vec::new(),
            granted: Vec::new(),
        }
    }

    /// Returns the run id.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.summary.run_id
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Moves to `next`, which must directly follow the current phase.
    pub fn advance(&mut self, next: RunPhase) -> AppResult<()> {
        if self.phase.next() != Some(next) {
            return Err(AppError::Internal(format!(
                "reconciliation run can not move from phase '{}' to '{}'",
                self.phase.as_str(),
                next.as_str()
            )));
        }

        self.phase = next;
        Ok(())
    }

    /// Returns the summary for reading.
    #[must_use]
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Returns the summary for updating counters.
    pub fn summary_mut(&mut self) -> &mut RunSummary {
        &mut self.summary
    }

    /// Records a removal that was sent, whatever the platform answered.
    pub fn record_removal(&mut self, account_id: AccountId) {
        self.removed.push(account_id);
    }

    /// Records a grant that was sent, whatever the platform answered.
    pub fn record_grant(&mut self, account_id: AccountId) {
        self.granted.push(account_id);
    }

    /// Accounts the run intended to remove from the role.
    #[must_use]
    pub fn removed(&self) -> &[AccountId] {
        &self.removed
    }

    /// Accounts the run intended to grant the role.
    #[must_use]
    pub fn granted(&self) -> &[AccountId] {
        &self.granted
    }

    /// Consumes the context and returns the summary.
    #[must_use]
    pub fn into_summary(self) -> RunSummary {
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use rolesync_core::AppError;

    use super::{RunContext, RunPhase};

    #[test]
    fn phases_advance_in_order() {
        let mut context = RunContext::new("cody", false);
        let mut phase = RunPhase::Init;
        while let Some(next) = phase.next() {
            assert!(context.advance(next).is_ok());
            phase = next;
        }

        assert_eq!(context.phase(), RunPhase::Done);
    }

    #[test]
    fn skipping_a_phase_is_rejected() {
        let mut context = RunContext::new("cody", false);
        let result = context.advance(RunPhase::RemovalsApplied);

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(context.phase(), RunPhase::Init);
    }
}
