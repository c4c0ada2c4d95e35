use clap::{Args, Subcommand};

use cuidapadres::config::Config;
use cuidapadres::models::{Nurse, Patient, RangeStatus, VitalKind, VitalRecord};

use super::{format_timestamp, open_store, resolve_nurse, save, sync_state, OutputFormat};

#[derive(Args)]
pub struct VitalsCommand {
    #[command(subcommand)]
    pub command: VitalsSubcommand,
}

#[derive(Subcommand)]
pub enum VitalsSubcommand {
    /// Record a set of vital signs
    Log {
        /// Patient (jorge, teresa)
        #[arg(long, short)]
        patient: Patient,

        /// Nurse on shift (defaults to config `nurse`)
        #[arg(long, short)]
        nurse: Option<Nurse>,

        /// Systolic pressure (mmHg)
        #[arg(long, requires = "dia")]
        sys: Option<u16>,

        /// Diastolic pressure (mmHg)
        #[arg(long, requires = "sys")]
        dia: Option<u16>,

        /// Heart rate (bpm)
        #[arg(long)]
        fc: u16,

        /// Respiratory rate (breaths/min)
        #[arg(long)]
        fr: u16,

        /// Oxygen saturation (%)
        #[arg(long)]
        spo2: u16,

        /// Blood glucose (mg/dL)
        #[arg(long)]
        glucose: Option<u16>,
    },

    /// List recent vital signs
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

impl VitalsCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            VitalsSubcommand::Log {
                patient,
                nurse,
                sys,
                dia,
                fc,
                fr,
                spo2,
                glucose,
            } => {
                let nurse = resolve_nurse(*nurse, config)?;
                let mut record = VitalRecord::new(*patient, nurse, *fc, *fr, *spo2);
                if let (Some(sys), Some(dia)) = (sys, dia) {
                    record = record.with_pressure(*sys, *dia);
                }
                if let Some(glucose) = glucose {
                    record = record.with_glucose(*glucose);
                }
                record.validate()?;

                let saved = save(config, record)?;

                println!("Recorded vitals for {} ({}):", saved.patient, sync_state(&saved));
                println!();
                print_vital_details(&saved);
                Ok(())
            }
            VitalsSubcommand::List {
                patient,
                limit,
                format,
            } => {
                let store = open_store(config);
                let records: Vec<VitalRecord> = match patient {
                    Some(p) => store.get_by_patient(*p),
                    None => store.get_all(),
                };
                let records: Vec<VitalRecord> = records.into_iter().take(*limit).collect();

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&records)?);
                    }
                    OutputFormat::Text => {
                        if records.is_empty() {
                            println!("No vital signs recorded.");
                            return Ok(());
                        }
                        println!(
                            "{:<17} {:<8} {:<9} {:>7} {:>4} {:>4} {:>5} {:>6}",
                            "WHEN", "PATIENT", "NURSE", "TA", "FC", "FR", "SPO2", "GLUCO"
                        );
                        println!("{}", "-".repeat(68));
                        for r in &records {
                            let glucose = r
                                .glucose
                                .map(|g| g.to_string())
                                .unwrap_or_else(|| "-".to_string());
                            println!(
                                "{:<17} {:<8} {:<9} {:>7} {:>4} {:>4} {:>4}% {:>6}{}",
                                format_timestamp(r.timestamp),
                                r.patient.to_string(),
                                r.nurse_name.to_string(),
                                r.pressure_label(),
                                r.fc,
                                r.fr,
                                r.spo2,
                                glucose,
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

fn print_vital_details(record: &VitalRecord) {
    println!("  When:  {}", format_timestamp(record.timestamp));
    println!("  Nurse: {}", record.nurse_name);
    if let (Some(sys), Some(dia)) = (record.ta_sys, record.ta_dia) {
        println!(
            "  TA:    {}/{} mmHg [{} / {}]",
            sys,
            dia,
            VitalKind::Systolic.classify(sys),
            VitalKind::Diastolic.classify(dia)
        );
    }
    print_reading("FC", VitalKind::HeartRate, record.fc);
    print_reading("FR", VitalKind::RespiratoryRate, record.fr);
    print_reading("SpO2", VitalKind::Spo2, record.spo2);
    if let Some(glucose) = record.glucose {
        print_reading("Gluco", VitalKind::Glucose, glucose);
    }
}

fn print_reading(label: &str, kind: VitalKind, value: u16) {
    let status = kind.classify(value);
    let hint = match status {
        RangeStatus::Normal => String::new(),
        _ => format!(" (normal {})", kind.normal_label()),
    };
    println!(
        "  {:<6} {} {} [{}]{}",
        format!("{}:", label),
        value,
        kind.unit(),
        status,
        hint
    );
}
