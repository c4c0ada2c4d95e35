use clap::{Args, Subcommand};

use cuidapadres::config::Config;
use cuidapadres::models::{MedicineRecord, Nurse, Patient};

use super::{format_timestamp, open_store, resolve_nurse, save, sync_state, OutputFormat};

#[derive(Args)]
pub struct MedicineCommand {
    #[command(subcommand)]
    pub command: MedicineSubcommand,
}

#[derive(Subcommand)]
pub enum MedicineSubcommand {
    /// Record a medicine given outside the checklist
    Log {
        /// Patient (jorge, teresa)
        #[arg(long, short)]
        patient: Patient,

        /// Nurse on shift (defaults to config `nurse`)
        #[arg(long, short)]
        nurse: Option<Nurse>,

        /// Medicine name
        #[arg(long)]
        name: String,

        /// Dose given (e.g. "1 tab")
        #[arg(long, short)]
        dose: String,
    },

    /// List recently given medicines
    List {
        /// Only this patient
        #[arg(long, short)]
        patient: Option<Patient>,

        /// Maximum number of records
        #[arg(long, short, default_value = "10")]
        limit: usize,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl MedicineCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            MedicineSubcommand::Log {
                patient,
                nurse,
                name,
                dose,
            } => {
                let name = name.trim();
                if name.is_empty() {
                    return Err("Medicine name cannot be empty".into());
                }
                let nurse = resolve_nurse(*nurse, config)?;
                let saved = save(config, MedicineRecord::new(*patient, nurse, name, dose.trim()))?;

                println!("Recorded: {} ({})", saved, sync_state(&saved));
                Ok(())
            }
            MedicineSubcommand::List {
                patient,
                limit,
                format,
            } => {
                let store = open_store(config);
                let records: Vec<MedicineRecord> = match patient {
                    Some(p) => store.get_by_patient(*p),
                    None => store.get_all(),
                };
                let records: Vec<MedicineRecord> = records.into_iter().take(*limit).collect();

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&records)?);
                    }
                    OutputFormat::Text => {
                        if records.is_empty() {
                            println!("No medicines recorded.");
                            return Ok(());
                        }
                        for r in &records {
                            println!(
                                "{}  {}{}",
                                format_timestamp(r.timestamp),
                                r,
                                if r.synced { "" } else { " *" }
                            );
                        }
                        println!();
                        println!("* pending sync");
                    }
                }
                Ok(())
            }
        }
    }
}
