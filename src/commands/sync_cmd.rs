//! Sync CLI commands for reconciling with the remote store.

use clap::{Args, Subcommand};
use std::sync::Arc;

use cuidapadres::config::Config;
use cuidapadres::db::LocalStore;
use cuidapadres::models::{Collection, MedicineRecord, NurseReport, VitalRecord};
use cuidapadres::sync::{PullOutcome, Reconciler, RemoteClient, RemoteError};

/// Sync with the remote store
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,

    /// Print progress while syncing
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Show sync configuration, pending records and remote status
    Status,
}

impl SyncCommand {
    pub fn run(&self, config: &Config) -> Result<(), SyncCommandError> {
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| SyncCommandError::RuntimeError(e.to_string()))?;

        match &self.command {
            None => rt.block_on(self.sync(config)),
            Some(SyncSubcommand::Status) => rt.block_on(self.status(config)),
        }
    }

    async fn sync(&self, config: &Config) -> Result<(), SyncCommandError> {
        let client = RemoteClient::from_config(&config.remote)?;
        let store = Arc::new(LocalStore::new(config.data_dir.value.clone()));
        let reconciler = Reconciler::new(store, client, config.sync.settings());

        println!("Syncing with {}...", reconciler.remote().base_url());
        println!();

        let print_progress = |message: &str| println!("  ... {}", message);
        let progress: Option<&(dyn Fn(&str) + Sync)> = if self.verbose {
            Some(&print_progress)
        } else {
            None
        };
        let report = reconciler.reconcile(progress).await;

        if report.skipped {
            println!("Another sync is already running.");
            return Ok(());
        }

        for collection in &report.collections {
            let failed =
                collection.push_failed > 0 || matches!(collection.pull, PullOutcome::Failed(_));
            let status = if failed { "✗" } else { "✓" };
            println!("  {} {}", status, collection);
        }

        println!();
        if report.has_errors() {
            println!("Sync finished with errors. Unsynced records will be retried next time.");
        } else {
            println!("Sync complete.");
        }

        Ok(())
    }

    async fn status(&self, config: &Config) -> Result<(), SyncCommandError> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        let store = LocalStore::new(config.data_dir.value.clone());
        let pending = [
            (Collection::Vitals, store.pending::<VitalRecord>().len()),
            (Collection::Medicines, store.pending::<MedicineRecord>().len()),
            (Collection::Reports, store.pending::<NurseReport>().len()),
        ];
        println!("Local data: {}", store.data_dir().display());
        println!();

        if !config.remote.is_configured() {
            println!("Status: Not configured (records are kept locally)");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  remote:");
            println!("    base_url: \"https://<project>.supabase.co\"");
            println!("    api_key: \"<anon key>\"");
            println!();
            println!("Or set environment variables:");
            println!("  CUIDA_REMOTE_URL, CUIDA_REMOTE_API_KEY");
            println!();
            print_pending(&pending);
            return Ok(());
        }

        let client = RemoteClient::from_config(&config.remote)?;

        println!("Remote:    {}", client.base_url());
        println!(
            "Auto-sync: {}",
            if config.sync.auto_sync {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!(
            "Lookback:  {} days, keeping {} records per collection",
            config.sync.lookback_days, config.sync.retention
        );
        println!();
        print_pending(&pending);
        println!();

        print!("Remote status: ");
        match client.check_connection().await {
            Ok(()) => println!("✓ connected"),
            Err(RemoteError::Http(e)) => println!("✗ unreachable ({})", e),
            Err(e) => println!("✗ error: {}", e),
        }

        Ok(())
    }
}

fn print_pending(pending: &[(Collection, usize)]) {
    println!("Pending records:");
    for (collection, count) in pending {
        println!("  {:<10} {}", collection.label(), count);
    }
}

/// Errors from sync commands
#[derive(Debug)]
pub enum SyncCommandError {
    RemoteError(RemoteError),
    RuntimeError(String),
}

impl std::fmt::Display for SyncCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncCommandError::RemoteError(e) => write!(f, "{}", e),
            SyncCommandError::RuntimeError(e) => write!(f, "Runtime error: {}", e),
        }
    }
}

impl std::error::Error for SyncCommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncCommandError::RemoteError(e) => Some(e),
            SyncCommandError::RuntimeError(_) => None,
        }
    }
}

impl From<RemoteError> for SyncCommandError {
    fn from(e: RemoteError) -> Self {
        SyncCommandError::RemoteError(e)
    }
}
