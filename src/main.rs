use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{
    ChecklistCommand, ConfigCommand, HistoryCommand, MedicineCommand, MedicineSubcommand,
    ReportCommand, ReportSubcommand, SyncCommand, VitalsCommand, VitalsSubcommand,
};
use cuidapadres::config::Config;
use cuidapadres::sync::try_auto_sync;

#[derive(Parser)]
#[command(name = "cuida")]
#[command(version)]
#[command(about = "Caregiving log for vitals, medicines and shift reports", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record and list vital signs
    Vitals(VitalsCommand),

    /// Record and list medicines given
    Medicine(MedicineCommand),

    /// Write and list shift reports
    Report(ReportCommand),

    /// Today's medication checklist
    Checklist(ChecklistCommand),

    /// Patient history, averages and markdown export
    History(HistoryCommand),

    /// Manage configuration
    Config(ConfigCommand),

    /// Sync with the remote store
    Sync(SyncCommand),
}

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cuidapadres=warn,cuida=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let cli_config_path = cli.config.clone();
    let config = Config::load(cli.config)?;

    // Auto-sync BEFORE read commands
    if is_read_command(&cli.command) {
        try_auto_sync(&config);
    }

    let result = execute_command(&cli.command, &config, cli_config_path);

    // Auto-sync AFTER write commands (only if command succeeded)
    if result.is_ok() && is_write_command(&cli.command) {
        try_auto_sync(&config);
    }

    result
}

fn execute_command(
    command: &Option<Commands>,
    config: &Config,
    cli_config_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Some(Commands::Vitals(cmd)) => cmd.run(config)?,
        Some(Commands::Medicine(cmd)) => cmd.run(config)?,
        Some(Commands::Report(cmd)) => cmd.run(config)?,
        Some(Commands::Checklist(cmd)) => cmd.run(config)?,
        Some(Commands::History(cmd)) => cmd.run(config)?,
        Some(Commands::Config(cmd)) => cmd.run(config, cli_config_path)?,
        Some(Commands::Sync(cmd)) => cmd.run(config)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

/// Returns true if the command is a read operation that should sync before execution.
fn is_read_command(cmd: &Option<Commands>) -> bool {
    matches!(
        cmd,
        Some(Commands::Vitals(v)) if matches!(v.command, VitalsSubcommand::List { .. })
    ) || matches!(
        cmd,
        Some(Commands::Medicine(m)) if matches!(m.command, MedicineSubcommand::List { .. })
    ) || matches!(
        cmd,
        Some(Commands::Report(r)) if matches!(r.command, ReportSubcommand::List { .. })
    ) || matches!(cmd, Some(Commands::Checklist(c)) if c.command.is_none())
        || matches!(cmd, Some(Commands::History(_)))
}

/// Returns true if the command is a write operation that should sync after execution.
fn is_write_command(cmd: &Option<Commands>) -> bool {
    matches!(
        cmd,
        Some(Commands::Vitals(v)) if matches!(v.command, VitalsSubcommand::Log { .. })
    ) || matches!(
        cmd,
        Some(Commands::Medicine(m)) if matches!(m.command, MedicineSubcommand::Log { .. })
    ) || matches!(
        cmd,
        Some(Commands::Report(r)) if matches!(r.command, ReportSubcommand::Log { .. })
    ) || matches!(cmd, Some(Commands::Checklist(c)) if c.command.is_some())
}
