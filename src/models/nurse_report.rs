use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::fold_name;
use super::record::{new_record_id, now_millis, Collection, Record};
use super::{Nurse, Patient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SleepQuality {
    #[default]
    Bien,
    Regular,
    Mal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mood {
    #[default]
    Estable,
    Inquieto,
    Deprimido,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Appetite {
    #[default]
    Normal,
    Poco,
    Nada,
}

/// Structured part of a shift report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observations {
    pub bowel_movement: bool,
    pub sleep_quality: SleepQuality,
    pub mood: Mood,
    pub appetite: Appetite,
}

/// A free-text report written at the end of a shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NurseReport {
    pub id: String,
    pub patient: Patient,
    pub nurse_name: Nurse,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<Observations>,
    pub timestamp: i64,
    #[serde(default)]
    pub synced: bool,
}

impl NurseReport {
    pub fn new(patient: Patient, nurse: Nurse, content: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            patient,
            nurse_name: nurse,
            content: content.into(),
            observations: None,
            timestamp: now_millis(),
            synced: false,
        }
    }

    pub fn with_observations(mut self, observations: Observations) -> Self {
        self.observations = Some(observations);
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

impl Record for NurseReport {
    const COLLECTION: Collection = Collection::Reports;

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

macro_rules! label_enum {
    ($ty:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($ty::$variant => write!(f, $label),)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(if fold_name(s) == fold_name($label) {
                    return Ok($ty::$variant);
                })+
                Err(format!(
                    "Invalid value '{}'. Valid options: {}",
                    s,
                    [$($label),+].join(", ")
                ))
            }
        }
    };
}

label_enum!(SleepQuality { Bien => "Bien", Regular => "Regular", Mal => "Mal" });
label_enum!(Mood { Estable => "Estable", Inquieto => "Inquieto", Deprimido => "Deprimido" });
label_enum!(Appetite { Normal => "Normal", Poco => "Poco", Nada => "Nada" });
