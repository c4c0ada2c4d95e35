//! Today's medication checklist.
//!
//! Projects the fixed schedule against the medicine records given on the
//! current local day. Doses are grouped by scheduled time and every group
//! gets one status.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use serde::Serialize;

use crate::models::{MedicineRecord, Nurse, Patient, ScheduledMedicine};

/// How long after its scheduled time an untaken dose becomes overdue.
pub const OVERDUE_AFTER_HOURS: i64 = 2;

/// Status of one time slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChecklistStatus {
    #[serde(rename = "COMPLETADO")]
    Completado,
    #[serde(rename = "ATRASADO")]
    Atrasado,
    #[serde(rename = "EN HORA")]
    EnHora,
    #[serde(rename = "PENDIENTE")]
    Pendiente,
}

impl fmt::Display for ChecklistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecklistStatus::Completado => write!(f, "COMPLETADO"),
            ChecklistStatus::Atrasado => write!(f, "ATRASADO"),
            ChecklistStatus::EnHora => write!(f, "EN HORA"),
            ChecklistStatus::Pendiente => write!(f, "PENDIENTE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistItem {
    pub entry: ScheduledMedicine,
    pub taken: bool,
}

/// Doses scheduled at the same time of day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistGroup {
    pub time: &'static str,
    pub status: ChecklistStatus,
    pub items: Vec<ChecklistItem>,
}

impl ChecklistGroup {
    pub fn pending(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.items.iter().filter(|item| !item.taken)
    }
}

/// Schedule entries for `patient` that are due on `weekday` (0 = Sunday).
pub fn due_on(
    schedule: &[ScheduledMedicine],
    patient: Patient,
    weekday: u8,
) -> impl Iterator<Item = &ScheduledMedicine> {
    schedule
        .iter()
        .filter(move |entry| entry.patient == patient && entry.frequency.applies_on(weekday))
}

/// Builds the checklist for `patient` as of `now`.
///
/// Groups are ordered by time; entries keep schedule order inside a group.
/// A dose counts as taken when a record for the same patient and medicine
/// name falls on the same local calendar day as `now`.
pub fn build_checklist<Tz: TimeZone>(
    schedule: &[ScheduledMedicine],
    patient: Patient,
    records: &[MedicineRecord],
    now: &DateTime<Tz>,
) -> Vec<ChecklistGroup> {
    let tz = now.timezone();
    let today = now.date_naive();
    let weekday = now.weekday().num_days_from_sunday() as u8;

    let taken_today: HashSet<&str> = records
        .iter()
        .filter(|r| r.patient == patient)
        .filter(|r| {
            tz.timestamp_millis_opt(r.timestamp)
                .single()
                .is_some_and(|at| at.date_naive() == today)
        })
        .map(|r| r.medicine_name.as_str())
        .collect();

    let mut slots: BTreeMap<&'static str, Vec<ChecklistItem>> = BTreeMap::new();
    for entry in due_on(schedule, patient, weekday) {
        slots.entry(entry.time).or_default().push(ChecklistItem {
            entry: *entry,
            taken: taken_today.contains(entry.name),
        });
    }

    let local_now = now.naive_local();
    slots
        .into_iter()
        .map(|(time, items)| {
            let all_taken = items.iter().all(|item| item.taken);
            ChecklistGroup {
                time,
                status: slot_status(time, all_taken, local_now),
                items,
            }
        })
        .collect()
}

/// Status of a slot scheduled at `time` ("HH:MM") as of `now`.
pub fn slot_status(time: &str, all_taken: bool, now: NaiveDateTime) -> ChecklistStatus {
    if all_taken {
        return ChecklistStatus::Completado;
    }
    let Ok(at) = NaiveTime::parse_from_str(time, "%H:%M") else {
        return ChecklistStatus::Pendiente;
    };

    let scheduled = now.date().and_time(at);
    if now < scheduled {
        ChecklistStatus::Pendiente
    } else if now - scheduled > Duration::hours(OVERDUE_AFTER_HOURS) {
        ChecklistStatus::Atrasado
    } else {
        ChecklistStatus::EnHora
    }
}

/// Today's record that already covers the dose scheduled in `entry`.
///
/// A medicine may be scheduled more than once a day, so each record of the
/// same name is attributed to the same-name slot nearest its local time of
/// day (earlier slot on ties). Only a record attributed to `entry` counts.
pub fn given_for_slot<'r, Tz: TimeZone>(
    schedule: &[ScheduledMedicine],
    entry: &ScheduledMedicine,
    records: &'r [MedicineRecord],
    now: &DateTime<Tz>,
) -> Option<&'r MedicineRecord> {
    let tz = now.timezone();
    let today = now.date_naive();
    let weekday = now.weekday().num_days_from_sunday() as u8;

    let mut slots: Vec<(&str, i64)> = due_on(schedule, entry.patient, weekday)
        .filter(|other| other.name == entry.name)
        .map(|other| (other.id, slot_minutes(other.time)))
        .collect();
    if !slots.iter().any(|(id, _)| *id == entry.id) {
        slots.push((entry.id, slot_minutes(entry.time)));
    }
    slots.sort_by_key(|(_, minutes)| *minutes);

    records
        .iter()
        .filter(|r| r.patient == entry.patient && r.medicine_name == entry.name)
        .find(|r| {
            let Some(at) = tz.timestamp_millis_opt(r.timestamp).single() else {
                return false;
            };
            if at.date_naive() != today {
                return false;
            }
            let minutes = i64::from(at.hour() * 60 + at.minute());
            slots
                .iter()
                .min_by_key(|(_, slot)| (slot - minutes).abs())
                .is_some_and(|(id, _)| *id == entry.id)
        })
}

fn slot_minutes(time: &str) -> i64 {
    NaiveTime::parse_from_str(time, "%H:%M")
        .map(|at| i64::from(at.num_seconds_from_midnight() / 60))
        .unwrap_or(0)
}

/// Record for marking a scheduled dose as given at `timestamp` (ms).
pub fn take_scheduled(entry: &ScheduledMedicine, nurse: Nurse, timestamp: i64) -> MedicineRecord {
    MedicineRecord::new(entry.patient, nurse, entry.name, entry.dose).with_timestamp(timestamp)
}
