use serde::{Deserialize, Serialize};
use std::fmt;

use super::record::{new_record_id, now_millis, Collection, Record};
use super::{Nurse, Patient};

/// A medicine actually given to a patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineRecord {
    pub id: String,
    pub patient: Patient,
    pub nurse_name: Nurse,
    pub medicine_name: String,
    pub dose: String,
    pub timestamp: i64,
    #[serde(default)]
    pub synced: bool,
}

impl MedicineRecord {
    pub fn new(
        patient: Patient,
        nurse: Nurse,
        medicine_name: impl Into<String>,
        dose: impl Into<String>,
    ) -> Self {
        Self {
            id: new_record_id(),
            patient,
            nurse_name: nurse,
            medicine_name: medicine_name.into(),
            dose: dose.into(),
            timestamp: now_millis(),
            synced: false,
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

impl Record for MedicineRecord {
    const COLLECTION: Collection = Collection::Medicines;

    fn id(&self) -> &str {
        &self.id
    }

    fn patient(&self) -> Patient {
        self.patient
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn is_synced(&self) -> bool {
        self.synced
    }

    fn mark_synced(&mut self) {
        self.synced = true;
    }
}

impl fmt::Display for MedicineRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) - {} for {}",
            self.medicine_name, self.dose, self.nurse_name, self.patient
        )
    }
}
