use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::fold_name;

/// One of the two people receiving care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Patient {
    Jorge,
    Teresa,
}

impl Patient {
    pub const ALL: [Patient; 2] = [Patient::Jorge, Patient::Teresa];
}

impl fmt::Display for Patient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Patient::Jorge => write!(f, "Jorge"),
            Patient::Teresa => write!(f, "Teresa"),
        }
    }
}

impl FromStr for Patient {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold_name(s).as_str() {
            "jorge" => Ok(Patient::Jorge),
            "teresa" | "teresita" => Ok(Patient::Teresa),
            _ => Err(format!(
                "Invalid patient '{}'. Valid options: jorge, teresa",
                s
            )),
        }
    }
}
