use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::record::{new_record_id, now_millis, Collection, Record};
use super::{Nurse, Patient};

/// One set of vital signs taken by a nurse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalRecord {
    pub id: String,
    pub patient: Patient,
    pub nurse_name: Nurse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ta_sys: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ta_dia: Option<u16>,
    /// Heart rate (beats per minute).
    pub fc: u16,
    /// Respiratory rate (breaths per minute).
    pub fr: u16,
    /// Oxygen saturation (%).
    pub spo2: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glucose: Option<u16>,
    pub timestamp: i64,
    #[serde(default)]
    pub synced: bool,
}

impl VitalRecord {
    pub fn new(patient: Patient, nurse: Nurse, fc: u16, fr: u16, spo2: u16) -> Self {
        Self {
            id: new_record_id(),
            patient,
            nurse_name: nurse,
            ta_sys: None,
            ta_dia: None,
            fc,
            fr,
            spo2,
            glucose: None,
            timestamp: now_millis(),
            synced: false,
        }
    }

    pub fn with_pressure(mut self, systolic: u16, diastolic: u16) -> Self {
        self.ta_sys = Some(systolic);
        self.ta_dia = Some(diastolic);
        self
    }

    pub fn with_glucose(mut self, glucose: u16) -> Self {
        self.glucose = Some(glucose);
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Rejects readings that cannot be real before they are saved.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.spo2 > 100 {
            return Err(ValidationError::OxygenAboveMax(self.spo2));
        }
        if let Some(sys) = self.ta_sys {
            if !(40..=250).contains(&sys) {
                return Err(ValidationError::SystolicOutOfRange(sys));
            }
        }
        if !(30..=220).contains(&self.fc) {
            return Err(ValidationError::HeartRateOutOfRange(self.fc));
        }
        Ok(())
    }

    /// Blood pressure as `sys/dia`, with `-` for a missing side.
    pub fn pressure_label(&self) -> String {
        let side = |v: Option<u16>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        format!("{}/{}", side(self.ta_sys), side(self.ta_dia))
    }
}

impl Record for VitalRecord {
    const COLLECTION: Collection = Collection::Vitals;

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

/// A vital sign reading that fails the basic safety checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Oxygen saturation cannot exceed 100% (got {0})")]
    OxygenAboveMax(u16),
    #[error("Systolic pressure {0} is outside the 40-250 range")]
    SystolicOutOfRange(u16),
    #[error("Heart rate {0} is outside the 30-220 range")]
    HeartRateOutOfRange(u16),
}

/// Which vital sign a value belongs to, for range classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitalKind {
    Systolic,
    Diastolic,
    HeartRate,
    RespiratoryRate,
    Spo2,
    Glucose,
}

/// How a single reading compares with its reference ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeStatus {
    Normal,
    Warning,
    Critical,
}

impl VitalKind {
    /// Absolute bounds; outside them a reading is critical.
    fn bounds(&self) -> (u16, u16) {
        match self {
            VitalKind::Systolic => (90, 180),
            VitalKind::Diastolic => (50, 110),
            VitalKind::HeartRate => (40, 140),
            VitalKind::RespiratoryRate => (8, 30),
            VitalKind::Spo2 => (85, 100),
            VitalKind::Glucose => (60, 300),
        }
    }

    /// Optimal band inside the bounds; outside it a reading is a warning.
    fn optimal(&self) -> (u16, u16) {
        match self {
            VitalKind::Systolic => (100, 140),
            VitalKind::Diastolic => (60, 90),
            VitalKind::HeartRate => (60, 100),
            VitalKind::RespiratoryRate => (12, 20),
            VitalKind::Spo2 => (94, 100),
            VitalKind::Glucose => (70, 140),
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            VitalKind::Systolic | VitalKind::Diastolic => "mmHg",
            VitalKind::HeartRate => "lpm",
            VitalKind::RespiratoryRate => "rpm",
            VitalKind::Spo2 => "%",
            VitalKind::Glucose => "mg/dL",
        }
    }

    pub fn classify(&self, value: u16) -> RangeStatus {
        let (min, max) = self.bounds();
        let (opt_min, opt_max) = self.optimal();
        if value < min || value > max {
            RangeStatus::Critical
        } else if value < opt_min || value > opt_max {
            RangeStatus::Warning
        } else {
            RangeStatus::Normal
        }
    }

    /// Human-readable normal band, e.g. `60-100lpm`.
    pub fn normal_label(&self) -> String {
        let (min, max) = self.optimal();
        format!("{}-{}{}", min, max, self.unit())
    }
}

impl fmt::Display for RangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeStatus::Normal => write!(f, "normal"),
            RangeStatus::Warning => write!(f, "warning"),
            RangeStatus::Critical => write!(f, "critical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VitalRecord {
        VitalRecord::new(Patient::Jorge, Nurse::Monica, 72, 16, 97).with_pressure(120, 80)
    }

    #[test]
    fn test_vital_record_new() {
        let record = VitalRecord::new(Patient::Teresa, Nurse::Yesse, 80, 18, 95);

        assert_eq!(record.patient, Patient::Teresa);
        assert_eq!(record.nurse_name, Nurse::Yesse);
        assert!(record.ta_sys.is_none());
        assert!(record.glucose.is_none());
        assert!(!record.synced);
        assert!(record.timestamp > 0);
    }

    #[test]
    fn test_validate_accepts_normal_reading() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_impossible_values() {
        let mut record = sample();
        record.spo2 = 101;
        assert_eq!(record.validate(), Err(ValidationError::OxygenAboveMax(101)));

        let record = sample().with_pressure(260, 90);
        assert_eq!(
            record.validate(),
            Err(ValidationError::SystolicOutOfRange(260))
        );

        let mut record = sample();
        record.fc = 25;
        assert_eq!(
            record.validate(),
            Err(ValidationError::HeartRateOutOfRange(25))
        );
    }

    #[test]
    fn test_validate_skips_missing_pressure() {
        let record = VitalRecord::new(Patient::Jorge, Nurse::Monica, 72, 16, 97);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_json_shape_omits_absent_optionals() {
        let record = VitalRecord::new(Patient::Jorge, Nurse::Monica, 72, 16, 97);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["nurseName"], "Mónica");
        assert!(value.get("taSys").is_none());
        assert!(value.get("glucose").is_none());
        assert_eq!(value["synced"], false);
    }

    #[test]
    fn test_missing_synced_reads_as_false() {
        let json = r#"{"id":"abc123xyz","patient":"Jorge","nurseName":"Yesse",
            "taSys":130,"taDia":85,"fc":70,"fr":16,"spo2":96,"timestamp":1700000000000}"#;
        let record: VitalRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.id, "abc123xyz");
        assert_eq!(record.ta_sys, Some(130));
        assert!(!record.synced);
    }

    #[test]
    fn test_classify_ranges() {
        assert_eq!(VitalKind::HeartRate.classify(72), RangeStatus::Normal);
        assert_eq!(VitalKind::HeartRate.classify(110), RangeStatus::Warning);
        assert_eq!(VitalKind::HeartRate.classify(150), RangeStatus::Critical);
        assert_eq!(VitalKind::Spo2.classify(92), RangeStatus::Warning);
        assert_eq!(VitalKind::Spo2.classify(80), RangeStatus::Critical);
    }

    #[test]
    fn test_pressure_label() {
        assert_eq!(sample().pressure_label(), "120/80");
        let record = VitalRecord::new(Patient::Jorge, Nurse::Monica, 72, 16, 97);
        assert_eq!(record.pressure_label(), "-/-");
    }
}
