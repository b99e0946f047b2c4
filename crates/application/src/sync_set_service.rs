use std::sync::Arc;

use tracing::{debug, info, warn};

use rolesync_domain::{DirectoryMember, IdentityToken, SyncSet};

use crate::DirectorySource;

/// A directory source that could not deliver its member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    /// Source label.
    pub source: String,
    /// Error reported by the source.
    pub reason: String,
}

/// Identities gathered from every configured source for one run.
#[derive(Debug, Clone, Default)]
pub struct CollectedSyncSet {
    /// Union of every source's identities.
    pub sync_set: SyncSet,
    /// Members as delivered, kept for per-member conflict detection.
    pub members: Vec<DirectoryMember>,
    /// Sources that failed. Any failure makes the set incomplete.
    pub failures: Vec<SourceFailure>,
}

impl CollectedSyncSet {
    /// Returns whether at least one source failed.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Returns a one-line description of every failed source.
    #[must_use]
    pub fn degradation_reason(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }

        Some(
            self.failures
                .iter()
                .map(|failure| format!("{}: {}", failure.source, failure.reason))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Builds the run's SyncSet from every configured directory source.
#[derive(Clone)]
pub struct SyncSetService {
    sources: Vec<Arc<dyn DirectorySource>>,
}

impl SyncSetService {
    /// Creates a collector over the given sources.
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn DirectorySource>>) -> Self {
        Self { sources }
    }

    /// Queries every source in order and returns the deduplicated union.
    ///
    /// Source errors are recorded, never propagated.
    pub async fn collect(&self) -> CollectedSyncSet {
        let mut collected = CollectedSyncSet::default();

        for source in &self.sources {
            match source.list_members().await {
                Ok(members) => {
                    info!(
                        source = source.label(),
                        member_count = members.len(),
                        "collected directory members"
                    );
                    collected.members.extend(members);
                }
                Err(error) => {
                    warn!(
                        source = source.label(),
                        error = %error,
                        "directory source failed; role removals will be skipped this run"
                    );
                    collected.failures.push(SourceFailure {
                        source: source.label().to_owned(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        collected.sync_set = SyncSet::from_members(&collected.members);
        info!(
            identity_count = collected.sync_set.len(),
            "identities to sync (sorted and deduplicated)"
        );
        debug!(
            identities = ?collected
                .sync_set
                .iter()
                .map(IdentityToken::as_str)
                .collect::<Vec<_>>(),
            "sync set"
        );

        collected
    }
}
