// Fuel type module - target renewable fuels and label normalization
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::constants::{OFFSHORE_WIND_LABEL, ONSHORE_WIND_LABEL, SOLAR_LABEL, WIND_LABEL};
use crate::error::EmissionError;

/// Renewable fuels whose installed capacity is scaled to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetFuel {
    Solar,
    OnshoreWind,
    OffshoreWind,
}

impl TargetFuel {
    pub const ALL: [TargetFuel; 3] = [TargetFuel::Solar, TargetFuel::OffshoreWind, TargetFuel::OnshoreWind];

    /// Label used in the capacity table.
    pub fn capacity_label(&self) -> &'static str {
        match self {
            TargetFuel::Solar => SOLAR_LABEL,
            TargetFuel::OnshoreWind => ONSHORE_WIND_LABEL,
            TargetFuel::OffshoreWind => OFFSHORE_WIND_LABEL,
        }
    }

    /// Label used in measured generation and the station table. Measured
    /// data does not separate onshore from offshore wind.
    pub fn generation_label(&self) -> &'static str {
        normalize_fuel_label(self.capacity_label())
    }

    /// Fuel whose capacity table drives the projection for this fuel.
    /// Offshore wind is projected from onshore wind capacity.
    pub fn projection_proxy(&self) -> TargetFuel {
        match self {
            TargetFuel::OffshoreWind => TargetFuel::OnshoreWind,
            other => *other,
        }
    }

    /// Whether the Eastern region has no usable measurement for this fuel,
    /// in which case its capacity factor is substituted.
    pub fn has_eastern_data_gap(&self) -> bool {
        matches!(self, TargetFuel::Solar)
    }

    pub fn english_name(&self) -> &'static str {
        match self {
            TargetFuel::Solar => "solar power",
            TargetFuel::OnshoreWind => "onshore wind power",
            TargetFuel::OffshoreWind => "offshore wind power",
        }
    }
}

/// Collapse wind sub-types into the combined measured wind label.
pub fn normalize_fuel_label(label: &str) -> &str {
    match label {
        ONSHORE_WIND_LABEL | OFFSHORE_WIND_LABEL => WIND_LABEL,
        other => other,
    }
}

impl FromStr for TargetFuel {
    type Err = EmissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            SOLAR_LABEL | "solar" | "Solar" => Ok(TargetFuel::Solar),
            ONSHORE_WIND_LABEL | "onshore_wind" | "OnshoreWind" => Ok(TargetFuel::OnshoreWind),
            OFFSHORE_WIND_LABEL | "offshore_wind" | "OffshoreWind" => Ok(TargetFuel::OffshoreWind),
            other => Err(EmissionError::UnknownFuel(other.to_string())),
        }
    }
}

impl TryFrom<String> for TargetFuel {
    type Error = EmissionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetFuel> for String {
    fn from(fuel: TargetFuel) -> Self {
        fuel.capacity_label().to_string()
    }
}

impl fmt::Display for TargetFuel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.capacity_label())
    }
}
