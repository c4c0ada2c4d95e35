use clap::{Args, Subcommand};

use cuidapadres::config::Config;
use cuidapadres::models::{
    Appetite, Mood, Nurse, NurseReport, Observations, Patient, SleepQuality,
};

use super::{format_timestamp, open_store, resolve_nurse, save, sync_state, OutputFormat};

#[derive(Args)]
pub struct ReportCommand {
    #[command(subcommand)]
    pub command: ReportSubcommand,
}

#[derive(Subcommand)]
pub enum ReportSubcommand {
    /// Write an end-of-shift report
    Log {
        /// Patient (jorge, teresa)
        #[arg(long, short)]
        patient: Patient,

        /// Nurse on shift (defaults to config `nurse`)
        #[arg(long, short)]
        nurse: Option<Nurse>,

        /// Free-text report
        #[arg(long)]
        content: String,

        /// Patient had a bowel movement
        #[arg(long)]
        bowel: bool,

        /// Sleep quality (bien, regular, mal)
        #[arg(long)]
        sleep: Option<SleepQuality>,

        /// Mood (estable, inquieto, deprimido)
        #[arg(long)]
        mood: Option<Mood>,

        /// Appetite (normal, poco, nada)
        #[arg(long)]
        appetite: Option<Appetite>,
    },

    /// List recent shift reports
    List {
        /// Only this patient
        #[arg(long, short)]
        patient: Option<Patient>,

        /// Maximum number of records
        #[arg(long, short, default_value = "5")]
        limit: usize,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ReportCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ReportSubcommand::Log {
                patient,
                nurse,
                content,
                bowel,
                sleep,
                mood,
                appetite,
            } => {
                let content = content.trim();
                if content.is_empty() {
                    return Err("Report content cannot be empty".into());
                }
                let nurse = resolve_nurse(*nurse, config)?;

                let mut report = NurseReport::new(*patient, nurse, content);
                if *bowel || sleep.is_some() || mood.is_some() || appetite.is_some() {
                    report = report.with_observations(Observations {
                        bowel_movement: *bowel,
                        sleep_quality: sleep.unwrap_or_default(),
                        mood: mood.unwrap_or_default(),
                        appetite: appetite.unwrap_or_default(),
                    });
                }

                let saved = save(config, report)?;
                println!("Recorded report for {} ({}):", saved.patient, sync_state(&saved));
                println!();
                print_report(&saved);
                Ok(())
            }
            ReportSubcommand::List {
                patient,
                limit,
                format,
            } => {
                let store = open_store(config);
                let reports: Vec<NurseReport> = match patient {
                    Some(p) => store.get_by_patient(*p),
                    None => store.get_all(),
                };
                let reports: Vec<NurseReport> = reports.into_iter().take(*limit).collect();

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&reports)?);
                    }
                    OutputFormat::Text => {
                        if reports.is_empty() {
                            println!("No shift reports recorded.");
                            return Ok(());
                        }
                        for (i, report) in reports.iter().enumerate() {
                            if i > 0 {
                                println!();
                            }
                            print_report(report);
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

fn print_report(report: &NurseReport) {
    println!(
        "{} - {} for {}",
        format_timestamp(report.timestamp),
        report.nurse_name,
        report.patient
    );
    println!("{}", "-".repeat(40));
    if let Some(obs) = &report.observations {
        println!(
            "Bowel: {} | Sleep: {} | Mood: {} | Appetite: {}",
            if obs.bowel_movement { "yes" } else { "no" },
            obs.sleep_quality,
            obs.mood,
            obs.appetite
        );
    }
    println!("{}", report.content);
}
