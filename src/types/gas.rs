//! Trace gases available from the TEMPO level-3 satellite products.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GasType {
    #[serde(rename = "NO2")]
    No2,
    #[serde(rename = "HCHO")]
    Hcho,
    #[serde(rename = "O3PROF")]
    O3Prof,
    #[serde(rename = "O3TOT")]
    O3Tot,
}

impl GasType {
    pub const ALL: [GasType; 4] = [GasType::No2, GasType::Hcho, GasType::O3Prof, GasType::O3Tot];

    /// Product code as used in granule short names.
    pub fn code(self) -> &'static str {
        match self {
            GasType::No2 => "NO2",
            GasType::Hcho => "HCHO",
            GasType::O3Prof => "O3PROF",
            GasType::O3Tot => "O3TOT",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GasType::No2 => "Nitrogen Dioxide",
            GasType::Hcho => "Formaldehyde",
            GasType::O3Prof => "Ozone Profile",
            GasType::O3Tot => "Total Ozone",
        }
    }

    /// Catalog short name of the level-3 collection, e.g. `TEMPO_NO2_L3`.
    pub fn short_name(self) -> String {
        format!("TEMPO_{}_L3", self.code())
    }
}

impl fmt::Display for GasType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for GasType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        GasType::ALL
            .into_iter()
            .find(|gas| gas.code() == wanted)
            .ok_or_else(|| {
                format!("Unsupported gas '{s}', expected one of NO2, HCHO, O3PROF, O3TOT")
            })
    }
}
