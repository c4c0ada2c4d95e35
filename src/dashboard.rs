//! Per-patient history: filtering, period averages and the markdown report.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Timelike};
use serde::Serialize;

use crate::models::{MedicineRecord, NurseReport, Patient, Record, VitalRecord};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Night window used for apnea monitoring: 20:00 to 07:59 local.
const NIGHT_STARTS: u32 = 20;
const NIGHT_ENDS: u32 = 8;

/// Period covered by a history view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "date", rename_all = "lowercase")]
pub enum TimeRange {
    /// One local calendar day.
    Day(NaiveDate),
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRange::Day(date) => write!(f, "Día {}", date),
            TimeRange::Last7Days => write!(f, "7d"),
            TimeRange::Last30Days => write!(f, "30d"),
        }
    }
}

/// Range names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    Day,
    Week,
    Month,
}

impl FromStr for RangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(RangeKind::Day),
            "7d" => Ok(RangeKind::Week),
            "30d" => Ok(RangeKind::Month),
            _ => Err(format!("Invalid range '{}'. Valid options: day, 7d, 30d", s)),
        }
    }
}

impl RangeKind {
    pub fn with_date(self, date: NaiveDate) -> TimeRange {
        match self {
            RangeKind::Day => TimeRange::Day(date),
            RangeKind::Week => TimeRange::Last7Days,
            RangeKind::Month => TimeRange::Last30Days,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryQuery {
    pub patient: Patient,
    pub range: TimeRange,
    /// Restrict vitals to night readings.
    pub night_only: bool,
}

/// Rounded period averages over the filtered vitals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalStats {
    pub ta_sys: u16,
    pub ta_dia: u16,
    pub fc: u16,
    pub spo2: u16,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct History {
    pub query: HistoryQuery,
    pub stats: Option<VitalStats>,
    pub vitals: Vec<VitalRecord>,
    pub medicines: Vec<MedicineRecord>,
    pub reports: Vec<NurseReport>,
}

/// Filters one patient's records down to the query period.
///
/// Input order is kept (newest first as stored).
pub fn build_history<Tz: TimeZone>(
    query: HistoryQuery,
    vitals: &[VitalRecord],
    medicines: &[MedicineRecord],
    reports: &[NurseReport],
    now: &DateTime<Tz>,
) -> History {
    let tz = now.timezone();
    let now_ms = now.timestamp_millis();
    let in_range = |timestamp: i64| match query.range {
        TimeRange::Day(date) => tz
            .timestamp_millis_opt(timestamp)
            .single()
            .is_some_and(|at| at.date_naive() == date),
        TimeRange::Last7Days => timestamp >= now_ms - 7 * MS_PER_DAY,
        TimeRange::Last30Days => timestamp >= now_ms - 30 * MS_PER_DAY,
    };

    let vitals: Vec<VitalRecord> = vitals
        .iter()
        .filter(|r| r.patient == query.patient && in_range(r.timestamp))
        .filter(|r| !query.night_only || is_night(&tz, r.timestamp))
        .cloned()
        .collect();

    History {
        query,
        stats: vital_stats(&vitals),
        medicines: filter_records(medicines, query.patient, &in_range),
        reports: filter_records(reports, query.patient, &in_range),
        vitals,
    }
}

fn filter_records<T: Record>(records: &[T], patient: Patient, in_range: &dyn Fn(i64) -> bool) -> Vec<T> {
    records
        .iter()
        .filter(|r| r.patient() == patient && in_range(r.timestamp()))
        .cloned()
        .collect()
}

fn is_night<Tz: TimeZone>(tz: &Tz, timestamp: i64) -> bool {
    tz.timestamp_millis_opt(timestamp)
        .single()
        .is_some_and(|at| at.hour() >= NIGHT_STARTS || at.hour() < NIGHT_ENDS)
}

/// Averages pressure, heart rate and SpO2, skipping absent or zero values.
///
/// Returns `None` when there are no readings at all.
pub fn vital_stats(records: &[VitalRecord]) -> Option<VitalStats> {
    if records.is_empty() {
        return None;
    }

    Some(VitalStats {
        ta_sys: rounded_mean(records.iter().filter_map(|r| r.ta_sys)),
        ta_dia: rounded_mean(records.iter().filter_map(|r| r.ta_dia)),
        fc: rounded_mean(records.iter().map(|r| r.fc)),
        spo2: rounded_mean(records.iter().map(|r| r.spo2)),
        count: records.len(),
    })
}

fn rounded_mean(values: impl Iterator<Item = u16>) -> u16 {
    let (sum, count) = values
        .filter(|v| *v > 0)
        .fold((0u64, 0u64), |(sum, count), v| (sum + u64::from(v), count + 1));
    if count == 0 {
        0
    } else {
        (sum as f64 / count as f64).round() as u16
    }
}

/// Renders the period as a markdown medical report.
pub fn render_markdown<Tz>(history: &History, generated_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let tz = generated_at.timezone();
    let stamp = |timestamp: i64| tz.timestamp_millis_opt(timestamp).single();
    let date = |timestamp: i64| {
        stamp(timestamp)
            .map(|at| at.format("%a %d %b").to_string())
            .unwrap_or_default()
    };
    let time = |timestamp: i64| {
        stamp(timestamp)
            .map(|at| at.format("%H:%M").to_string())
            .unwrap_or_default()
    };
    let full = |timestamp: i64| format!("{}, {}", date(timestamp), time(timestamp));

    let query = &history.query;
    let mut md = String::new();
    md.push_str(&format!("# REPORTE MÉDICO: {}\n", query.patient));
    md.push_str(&format!("Generado: {}\n", full(generated_at.timestamp_millis())));
    md.push_str(&format!(
        "Filtro: {} | {}\n",
        query.range,
        if query.night_only {
            "SOLO NOCHE (Apnea Monitor)"
        } else {
            "Todo el día"
        }
    ));

    md.push_str("\n## Promedios del Periodo\n");
    match &history.stats {
        Some(stats) => {
            md.push_str(&format!("- Presión: {}/{}\n", stats.ta_sys, stats.ta_dia));
            md.push_str(&format!("- Pulso: {} lpm\n", stats.fc));
            md.push_str(&format!("- Saturación O2: {}%\n", stats.spo2));
            md.push_str(&format!("- Registros: {}\n", stats.count));
        }
        None => md.push_str("- Sin registros en el periodo\n"),
    }

    md.push_str("\n## Bitácora de Salud (Informes de Turno)\n");
    let entries: Vec<String> = history
        .reports
        .iter()
        .map(|report| {
            let mut entry = format!("### {} - Enfermera: {}\n", full(report.timestamp), report.nurse_name);
            if let Some(obs) = &report.observations {
                entry.push_str(&format!(
                    "**Estado**: Evacuación: {} | Sueño: {} | Humor: {} | Apetito: {}\n\n",
                    if obs.bowel_movement { "SÍ" } else { "NO" },
                    obs.sleep_quality,
                    obs.mood,
                    obs.appetite
                ));
            }
            entry.push_str(&format!("**Detalle**: {}\n", report.content));
            entry
        })
        .collect();
    md.push_str(&entries.join("\n---\n"));

    md.push_str("\n\n## Historial de Signos Vitales\n");
    md.push_str("| Fecha | Hora | TA | FC | SPO2 | Gluco | Enfermera |\n");
    md.push_str("|---|---|---|---|---|---|---|\n");
    for r in &history.vitals {
        let glucose = r.glucose.map(|g| g.to_string()).unwrap_or_else(|| "-".to_string());
        md.push_str(&format!(
            "| {} | {} | {} | {} | {}% | {} | {} |\n",
            date(r.timestamp),
            time(r.timestamp),
            r.pressure_label(),
            r.fc,
            r.spo2,
            glucose,
            r.nurse_name
        ));
    }

    md.push_str("\n## Historial de Medicinas\n");
    md.push_str("| Fecha | Hora | Medicina | Dosis | Enfermera |\n");
    md.push_str("|---|---|---|---|---|\n");
    for m in &history.medicines {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            date(m.timestamp),
            time(m.timestamp),
            m.medicine_name,
            m.dose,
            m.nurse_name
        ));
    }

    md
}
