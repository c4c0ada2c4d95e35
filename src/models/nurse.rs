use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::fold_name;

/// Caregiver on shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nurse {
    #[serde(rename = "Mónica")]
    Monica,
    Yesse,
    #[serde(rename = "Génesis")]
    Genesis,
    Maricela,
}

impl Nurse {
    pub const ALL: [Nurse; 4] = [Nurse::Monica, Nurse::Yesse, Nurse::Genesis, Nurse::Maricela];
}

impl fmt::Display for Nurse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nurse::Monica => write!(f, "Mónica"),
            Nurse::Yesse => write!(f, "Yesse"),
            Nurse::Genesis => write!(f, "Génesis"),
            Nurse::Maricela => write!(f, "Maricela"),
        }
    }
}

impl FromStr for Nurse {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold_name(s).as_str() {
            "monica" => Ok(Nurse::Monica),
            "yesse" => Ok(Nurse::Yesse),
            "genesis" => Ok(Nurse::Genesis),
            "maricela" => Ok(Nurse::Maricela),
            _ => Err(format!(
                "Invalid nurse '{}'. Valid options: monica, yesse, genesis, maricela",
                s
            )),
        }
    }
}
