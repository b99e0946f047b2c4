//! Application services and ports for role reconciliation.

#![forbid(unsafe_code)]

mod backup_ports;
mod directory_ports;
mod identity_resolver;
mod mutation_applier;
mod platform_ports;
mod reconciliation_service;
mod sync_set_service;

pub use backup_ports::{SnapshotBackup, SnapshotBackupSink};
pub use directory_ports::DirectorySource;
pub use identity_resolver::{IdentityIndex, Resolution};
pub use mutation_applier::{CreationOutcome, MutationApplier, MutationOutcome};
pub use platform_ports::{PlatformCaller, PlatformGateway};
pub use reconciliation_service::{
    AdditionPlan, IdentityConflict, PlannedGrant, PlannedRemoval, ReconciliationOptions,
    ReconciliationService, RunContext, RunPhase, RunSummary, VerificationReport,
    compute_additions, compute_removals, verify_end_state,
};
pub use sync_set_service::{CollectedSyncSet, SourceFailure, SyncSetService};
