use serde::Serialize;

use super::Patient;

/// How often a scheduled dose repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Frequency {
    Daily,
    /// Only on the listed weekdays (0 = Sunday .. 6 = Saturday).
    Days { days: &'static [u8] },
    /// Every `hours` hours, anchored at the scheduled time.
    Interval { hours: u8 },
}

impl Frequency {
    /// Whether a dose with this frequency is due on `weekday` (0 = Sunday).
    pub fn applies_on(&self, weekday: u8) -> bool {
        match self {
            Frequency::Daily | Frequency::Interval { .. } => true,
            Frequency::Days { days } => days.contains(&weekday),
        }
    }
}

/// An expected dose from the fixed medication plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduledMedicine {
    pub id: &'static str,
    pub patient: Patient,
    /// Zero-padded `HH:MM`.
    pub time: &'static str,
    pub name: &'static str,
    pub dose: &'static str,
    pub frequency: Frequency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<&'static str>,
}
