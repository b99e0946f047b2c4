use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use rolesync_application::{SnapshotBackup, SnapshotBackupSink};
use rolesync_core::{AppError, AppResult};

/// Appends one JSON document per run to a local file.
#[derive(Debug, Clone)]
pub struct JsonLinesBackupSink {
    path: PathBuf,
}

impl JsonLinesBackupSink {
    /// Creates a sink writing to `path`. Parent directories are created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotBackupSink for JsonLinesBackupSink {
    fn destination(&self) -> String {
        self.path.display().to_string()
    }

    async fn persist(&self, backup: &SnapshotBackup) -> AppResult<()> {
        let mut line = serde_json::to_vec(backup).map_err(|error| {
            AppError::Internal(format!("failed to serialize snapshot backup: {error}"))
        })?;
        line.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                AppError::Internal(format!(
                    "failed to create backup directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to open backup file '{}': {error}",
                    self.path.display()
                ))
            })?;

        file.write_all(&line).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to write backup file '{}': {error}",
                self.path.display()
            ))
        })?;
        file.sync_all().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to flush backup file '{}': {error}",
                self.path.display()
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::Value;
    use uuid::Uuid;

    use rolesync_application::{SnapshotBackup, SnapshotBackupSink};
    use rolesync_domain::{Account, AccountEmail, AccountId, Role, RoleId, RoleRef};

    use super::JsonLinesBackupSink;

    fn backup() -> SnapshotBackup {
        let role = Role::new(
            RoleId::new("Um9sZToy").unwrap_or_else(|_| unreachable!()),
            "Cody",
            Vec::new(),
        )
        .unwrap_or_else(|_| unreachable!());
        let account = Account::new(
            AccountId::new("VXNlcjox").unwrap_or_else(|_| unreachable!()),
            "alice",
            vec![AccountEmail::verified("alice@co.com")],
            vec![RoleRef::from(&role)],
        )
        .unwrap_or_else(|_| unreachable!());

        SnapshotBackup {
            run_id: Uuid::new_v4(),
            captured_at: Utc::now(),
            backup_time: Utc::now(),
            role,
            accounts: vec![account],
        }
    }

    #[tokio::test]
    async fn each_run_appends_one_line() {
        let directory = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        let path = directory.path().join("nested").join("backup.json");
        let sink = JsonLinesBackupSink::new(&path);

        let first = backup();
        let second = backup();
        assert!(sink.persist(&first).await.is_ok());
        assert!(sink.persist(&second).await.is_ok());

        let contents = std::fs::read_to_string(&path).unwrap_or_default();
        let lines: Vec<Value> = contents
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["run_id"], first.run_id.to_string());
        assert_eq!(lines[1]["run_id"], second.run_id.to_string());
        assert_eq!(lines[0]["accounts"][0]["username"], "alice");
        assert_eq!(lines[0]["role"]["name"], "Cody");
    }

    #[tokio::test]
    async fn unwritable_destination_is_an_error() {
        let directory = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        let blocker = directory.path().join("file");
        std::fs::write(&blocker, b"").unwrap_or_else(|_| unreachable!());
        let sink = JsonLinesBackupSink::new(blocker.join("backup.json"));

        assert!(sink.persist(&backup()).await.is_err());
    }
}
