//! Auto-sync for CLI commands.
//!
//! Runs a reconcile before read commands and after write commands when
//! `sync.auto_sync` is enabled. Failures are reported on stderr and never
//! fail the command; the CLI keeps working offline.

use std::sync::Arc;

use super::client::RemoteClient;
use super::reconciler::Reconciler;
use crate::config::Config;
use crate::db::LocalStore;

/// Performs a reconcile if auto-sync is enabled and the remote is reachable.
pub fn try_auto_sync(config: &Config) {
    if !config.sync.auto_sync || !config.remote.is_configured() {
        return;
    }

    let client = match RemoteClient::from_config(&config.remote) {
        Ok(client) => client,
        Err(_) => return,
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(_) => return,
    };

    rt.block_on(async {
        // Fast fail before touching every collection
        if let Err(e) = client.check_connection().await {
            tracing::debug!("Auto-sync connection check failed: {}", e);
            eprintln!("Auto-sync: remote unreachable, skipping");
            return;
        }

        let store = Arc::new(LocalStore::new(config.data_dir.value.clone()));
        let reconciler = Reconciler::new(store, client, config.sync.settings());
        let report = reconciler.reconcile(None).await;

        if report.has_errors() {
            for collection in &report.collections {
                eprintln!("Auto-sync: {}", collection);
            }
        }
    });
}
