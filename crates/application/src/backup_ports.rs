use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use rolesync_core::AppResult;
use rolesync_domain::{Account, Role};

/// Pre-change capture persisted before any mutation is sent.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotBackup {
    /// Identifier of the run that produced the backup.
    pub run_id: Uuid,
    /// When the snapshot was captured.
    pub captured_at: DateTime<Utc>,
    /// When the backup was written.
    pub backup_time: DateTime<Utc>,
    /// Role being synced.
    pub role: Role,
    /// Every platform account with its roles at capture time.
    pub accounts: Vec<Account>,
}

/// Port for persisting pre-change snapshots.
///
/// Targets are append-only: each run adds a document and never replaces
/// earlier ones.
#[async_trait]
pub trait SnapshotBackupSink: Send + Sync {
    /// Human readable destination, for logs.
    fn destination(&self) -> String;

    /// Appends the backup. Any error aborts the run.
    async fn persist(&self, backup: &SnapshotBackup) -> AppResult<()>;
}
