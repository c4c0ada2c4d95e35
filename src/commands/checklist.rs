use chrono::Local;
use clap::{Args, Subcommand};

use cuidapadres::checklist::{
    build_checklist, given_for_slot, take_scheduled, ChecklistGroup, ChecklistStatus,
};
use cuidapadres::config::Config;
use cuidapadres::models::{MedicineRecord, Nurse, Patient};
use cuidapadres::schedule::{self, MEDICATION_SCHEDULE};

use super::{format_timestamp, open_store, resolve_nurse, save, sync_state, OutputFormat};

#[derive(Args)]
pub struct ChecklistCommand {
    #[command(subcommand)]
    pub command: Option<ChecklistSubcommand>,

    /// Only this patient (default: both)
    #[arg(long, short)]
    patient: Option<Patient>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Subcommand)]
pub enum ChecklistSubcommand {
    /// Mark a scheduled dose as given now
    Take {
        /// Schedule entry id (shown in the checklist)
        schedule_id: String,

        /// Nurse on shift (defaults to config `nurse`)
        #[arg(long, short)]
        nurse: Option<Nurse>,

        /// Record the dose even if it was already given today
        #[arg(long)]
        force: bool,
    },
}

impl ChecklistCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            None => self.show(config),
            Some(ChecklistSubcommand::Take {
                schedule_id,
                nurse,
                force,
            }) => self.take(config, schedule_id, *nurse, *force),
        }
    }

    fn show(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let store = open_store(config);
        let records: Vec<MedicineRecord> = store.get_all();
        let now = Local::now();

        let patients: Vec<Patient> = match self.patient {
            Some(p) => vec![p],
            None => Patient::ALL.to_vec(),
        };

        let checklists: Vec<(Patient, Vec<ChecklistGroup>)> = patients
            .into_iter()
            .map(|p| (p, build_checklist(MEDICATION_SCHEDULE, p, &records, &now)))
            .collect();

        match self.format {
            OutputFormat::Json => {
                let json: Vec<_> = checklists
                    .iter()
                    .map(|(patient, groups)| {
                        serde_json::json!({ "patient": patient, "groups": groups })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Text => {
                println!("Medication checklist for {}", now.format("%A %Y-%m-%d %H:%M"));
                for (patient, groups) in &checklists {
                    println!();
                    println!("{}", patient);
                    println!("{}", "=".repeat(60));
                    if groups.is_empty() {
                        println!("  Nothing scheduled today.");
                    }
                    for group in groups {
                        print_group(group);
                    }
                }
            }
        }
        Ok(())
    }

    fn take(
        &self,
        config: &Config,
        schedule_id: &str,
        nurse: Option<Nurse>,
        force: bool,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let entry = schedule::find(schedule_id)
            .ok_or_else(|| format!("Schedule entry not found: {}", schedule_id))?;
        let nurse = resolve_nurse(nurse, config)?;
        let now = Local::now();

        if !force {
            let records: Vec<MedicineRecord> = open_store(config).get_by_patient(entry.patient);
            if let Some(record) = given_for_slot(MEDICATION_SCHEDULE, entry, &records, &now) {
                return Err(format!(
                    "{} ({}) was already given to {} at {} by {}. Use --force to record it again.",
                    entry.name,
                    entry.time,
                    entry.patient,
                    format_timestamp(record.timestamp),
                    record.nurse_name
                )
                .into());
            }
        }

        let saved = save(config, take_scheduled(entry, nurse, now.timestamp_millis()))?;
        println!("Recorded: {} ({})", saved, sync_state(&saved));
        Ok(())
    }
}

fn print_group(group: &ChecklistGroup) {
    let marker = match group.status {
        ChecklistStatus::Completado => "✓",
        ChecklistStatus::Atrasado => "!",
        ChecklistStatus::EnHora => "•",
        ChecklistStatus::Pendiente => " ",
    };
    println!("{} {}  {}", marker, group.time, group.status);
    for item in &group.items {
        let entry = &item.entry;
        println!(
            "    [{}] {:<28} {:<10} {}",
            if item.taken { "x" } else { " " },
            entry.name,
            entry.dose,
            entry.id
        );
        if let Some(notes) = entry.notes {
            println!("        {}", notes);
        }
    }
}
