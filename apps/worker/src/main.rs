//! Rolesync worker: reconciles one platform role with directory membership.

#![forbid(unsafe_code)]

mod config;

use std::env;
use std::sync::Arc;

use rolesync_application::{
    DirectorySource, PlatformGateway, ReconciliationService, SnapshotBackupSink, SyncSetService,
};
use rolesync_core::AppError;
use rolesync_infrastructure::{
    GraphqlPlatformGateway, JsonLinesBackupSink, LdapDirectorySource, StaticDirectorySource,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::SyncConfig;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let dot_env = load_dot_env();
    init_tracing();
    match dot_env {
        Ok(path) => info!(path = %path, "loaded settings from dotenv file"),
        Err(reason) => debug!(reason = %reason, "no dotenv file loaded"),
    }

    let config = SyncConfig::from_env().inspect_err(|error| {
        error!(error = %error, "invalid configuration");
    })?;
    let service = build_reconciliation_service(&config)?;

    info!(
        role = %config.role_name,
        endpoint = %config.platform.endpoint,
        ldap = config.ldap.is_some(),
        static_list = config.static_identities.is_some(),
        dry_run = config.options.dry_run,
        interval_seconds = config.interval.map(|interval| interval.as_secs()),
        "rolesync-worker started"
    );

    let Some(interval) = config.interval else {
        return service.run().await.map(|_| ()).inspect_err(|error| {
            error!(error = %error, "reconciliation run failed");
        });
    };

    loop {
        if let Err(error) = service.run().await {
            error!(error = %error, "reconciliation run failed; retrying at the next interval");
        }

        tokio::time::sleep(interval).await;
    }
}

fn build_reconciliation_service(config: &SyncConfig) -> Result<ReconciliationService, AppError> {
    let gateway: Arc<dyn PlatformGateway> =
        Arc::new(GraphqlPlatformGateway::new(config.platform.clone())?);

    let mut sources: Vec<Arc<dyn DirectorySource>> = Vec::new();
    if let Some(ldap) = &config.ldap {
        sources.push(Arc::new(LdapDirectorySource::new(ldap.clone())));
    }
    if let Some(list) = &config.static_identities {
        let source = StaticDirectorySource::from_list(list);
        if source.is_empty() {
            warn!("LIST_OF_USERS is set but contains no identities");
        }
        sources.push(Arc::new(source));
    }
    if sources.is_empty() {
        warn!("neither LDAP_URL nor LIST_OF_USERS is set; the identity list will be empty");
    }

    let backup_sink = match &config.backup_path {
        Some(path) => Some(Arc::new(JsonLinesBackupSink::new(path)) as Arc<dyn SnapshotBackupSink>),
        None => {
            warn!("SRC_USERS_BACKUP_FILE is empty; account snapshots will not be backed up");
            None
        }
    };

    Ok(ReconciliationService::new(
        gateway,
        SyncSetService::new(sources),
        backup_sink,
        config.role_name.clone(),
        config.options,
    ))
}

/// Loads `.env` (or `SRC_DOT_ENV_PATH`), letting its values override the environment.
fn load_dot_env() -> Result<String, String> {
    let path = env::var("SRC_DOT_ENV_PATH").unwrap_or_else(|_| ".env".to_owned());
    dotenvy::from_path_override(&path)
        .map(|()| path.clone())
        .map_err(|error| format!("{path}: {error}"))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
