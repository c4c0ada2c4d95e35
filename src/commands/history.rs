use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use std::fs;
use std::path::PathBuf;

use cuidapadres::config::Config;
use cuidapadres::dashboard::{build_history, render_markdown, History, HistoryQuery, RangeKind};
use cuidapadres::models::{MedicineRecord, NurseReport, Patient, VitalRecord};

use super::{format_timestamp, open_store};

#[derive(Clone, ValueEnum, Default)]
pub enum HistoryFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

/// View a patient's history and period averages
#[derive(Args)]
pub struct HistoryCommand {
    /// Patient (jorge, teresa)
    #[arg(long, short)]
    patient: Patient,

    /// Period: day, 7d or 30d
    #[arg(long, short, default_value = "7d")]
    range: RangeKind,

    /// Date for `--range day` (YYYY-MM-DD), defaults to today
    #[arg(long, short)]
    date: Option<String>,

    /// Only vitals taken at night (20:00-08:00)
    #[arg(long)]
    night: bool,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: HistoryFormat,

    /// Write the output to a file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl HistoryCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let now = Local::now();
        let date = match &self.date {
            Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", d))?,
            None => now.date_naive(),
        };
        let query = HistoryQuery {
            patient: self.patient,
            range: self.range.with_date(date),
            night_only: self.night,
        };

        let store = open_store(config);
        let vitals: Vec<VitalRecord> = store.get_by_patient(self.patient);
        let medicines: Vec<MedicineRecord> = store.get_by_patient(self.patient);
        let reports: Vec<NurseReport> = store.get_by_patient(self.patient);
        let history = build_history(query, &vitals, &medicines, &reports, &now);

        let rendered = match self.format {
            HistoryFormat::Json => serde_json::to_string_pretty(&history)?,
            HistoryFormat::Markdown => render_markdown(&history, &now),
            HistoryFormat::Text => render_text(&history),
        };

        match &self.output {
            Some(path) => {
                fs::write(path, rendered)?;
                println!("Wrote {}", path.display());
            }
            None => print!("{}", rendered),
        }
        Ok(())
    }
}

fn render_text(history: &History) -> String {
    let query = &history.query;
    let mut out = String::new();

    out.push_str(&format!(
        "{} - {}{}\n",
        query.patient,
        query.range,
        if query.night_only { " (night only)" } else { "" }
    ));
    out.push_str(&format!("{}\n", "=".repeat(60)));

    match &history.stats {
        Some(stats) => {
            out.push_str(&format!(
                "Averages over {} reading(s): TA {}/{}  FC {} lpm  SpO2 {}%\n",
                stats.count, stats.ta_sys, stats.ta_dia, stats.fc, stats.spo2
            ));
        }
        None => out.push_str("No vital signs in this period.\n"),
    }

    if !history.vitals.is_empty() {
        out.push_str("\nVitals\n------\n");
        for r in &history.vitals {
            let glucose = r
                .glucose
                .map(|g| format!("  Gluco {}", g))
                .unwrap_or_default();
            out.push_str(&format!(
                "{}  TA {:<7} FC {:<3} FR {:<3} SpO2 {}%{}  ({})\n",
                format_timestamp(r.timestamp),
                r.pressure_label(),
                r.fc,
                r.fr,
                r.spo2,
                glucose,
                r.nurse_name
            ));
        }
    }

    if !history.medicines.is_empty() {
        out.push_str("\nMedicines\n---------\n");
        for m in &history.medicines {
            out.push_str(&format!(
                "{}  {} ({})  ({})\n",
                format_timestamp(m.timestamp),
                m.medicine_name,
                m.dose,
                m.nurse_name
            ));
        }
    }

    if !history.reports.is_empty() {
        out.push_str("\nShift reports\n-------------\n");
        for r in &history.reports {
            out.push_str(&format!(
                "{}  {}: {}\n",
                format_timestamp(r.timestamp),
                r.nurse_name,
                r.content
            ));
        }
    }

    out
}
