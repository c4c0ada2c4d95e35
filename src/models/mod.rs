mod medicine_record;
mod nurse;
mod nurse_report;
mod patient;
mod record;
mod scheduled_medicine;
mod vital_record;

pub use medicine_record::MedicineRecord;
pub use nurse::Nurse;
pub use nurse_report::{Appetite, Mood, NurseReport, Observations, SleepQuality};
pub use patient::Patient;
pub use record::{new_record_id, now_millis, Collection, Record};
pub use scheduled_medicine::{Frequency, ScheduledMedicine};
pub use vital_record::{RangeStatus, ValidationError, VitalKind, VitalRecord};

/// Lowercases and strips Spanish accents so CLI input like `monica` matches `Mónica`.
pub(crate) fn fold_name(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}
