use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::constants::{KW_PER_GW, KW_PER_MW};
use crate::config::fuel_type::TargetFuel;
use crate::core::capacity_percentage::CapacityShare;
use crate::error::{EmissionError, Result};
use crate::models::table::RegionalTable;
use crate::utils::logging::{self, CapacityCalcType, OperationCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CapacityUnit {
    KW,
    MW,
    GW,
}

impl CapacityUnit {
    pub fn kw_multiplier(&self) -> f64 {
        match self {
            CapacityUnit::KW => 1.0,
            CapacityUnit::MW => KW_PER_MW,
            CapacityUnit::GW => KW_PER_GW,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityUnit::KW => "kW",
            CapacityUnit::MW => "MW",
            CapacityUnit::GW => "GW",
        }
    }
}

impl FromStr for CapacityUnit {
    type Err = EmissionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "kw" => Ok(CapacityUnit::KW),
            "mw" => Ok(CapacityUnit::MW),
            "gw" => Ok(CapacityUnit::GW),
            _ => Err(EmissionError::UnknownCapacityUnit(s.to_string())),
        }
    }
}

impl TryFrom<String> for CapacityUnit {
    type Error = EmissionError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CapacityUnit> for String {
    fn from(unit: CapacityUnit) -> Self {
        unit.as_str().to_string()
    }
}

impl fmt::Display for CapacityUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target national installed capacity for one fuel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetCapacity {
    pub fuel: TargetFuel,
    pub capacity: f64,
    pub unit: CapacityUnit,
}

impl TargetCapacity {
    pub fn new(fuel: TargetFuel, capacity: f64, unit: CapacityUnit) -> Self {
        Self { fuel, capacity, unit }
    }

    pub fn kw(&self) -> f64 {
        self.capacity * self.unit.kw_multiplier()
    }
}

/// Projected hourly generation per region:
/// capacity factor x target capacity (kW) x regional capacity share.
pub fn project_target_generation(
    capacity_factor: &RegionalTable,
    target: &TargetCapacity,
    shares: &CapacityShare,
) -> RegionalTable {
    let _timing = logging::start_timing("project_target_generation",
        OperationCategory::Capacity { subcategory: CapacityCalcType::Projection });

    let target_kw = target.kw();
    let mut projected = RegionalTable::new(capacity_factor.hours());
    for (region, factors) in capacity_factor.iter() {
        let scale = target_kw * shares.share(region);
        *projected.column_mut(region) = factors.iter().map(|cf| cf * scale).collect();
        debug!(fuel = %target.fuel, region = %region, scale_kw = scale, "Projected target generation");
    }
    projected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capacity_percentage::allocate_capacity_shares;
    use crate::models::reference::{CapacityInfo, StationInfo};
    use crate::models::region::Region;

    #[test]
    fn units_normalize_to_kw() {
        assert_eq!(TargetCapacity::new(TargetFuel::Solar, 13.2, CapacityUnit::GW).kw(), 13_200_000.0);
        assert_eq!(TargetCapacity::new(TargetFuel::Solar, 5.0, CapacityUnit::MW).kw(), 5_000.0);
        assert_eq!("gw".parse::<CapacityUnit>().unwrap(), CapacityUnit::GW);
    }

    #[test]
    fn unknown_unit_is_rejected() {
        assert!(matches!(
            "TW".parse::<CapacityUnit>(),
            Err(EmissionError::UnknownCapacityUnit(_))
        ));
        let json = r#"{"fuel": "太陽能", "capacity": 1.0, "unit": "kWh"}"#;
        assert!(serde_json::from_str::<TargetCapacity>(json).is_err());
    }

    #[test]
    fn projection_scales_by_target_and_share() {
        let stations: StationInfo = [
            ("N".to_string(), Region::North, "太陽能".to_string()),
            ("S".to_string(), Region::South, "太陽能".to_string()),
        ]
        .into_iter()
        .collect();
        let mut capacity = CapacityInfo::new("太陽能");
        capacity.insert("N", 250.0);
        capacity.insert("S", 750.0);
        let shares = allocate_capacity_shares(&capacity, &stations);

        let cf = RegionalTable::from_columns(
            2,
            [
                (Region::North, vec![0.5, 0.0]),
                (Region::South, vec![0.2, 0.4]),
                (Region::East, vec![1.0, 1.0]),
            ],
        )
        .unwrap();
        let target = TargetCapacity::new(TargetFuel::Solar, 2.0, CapacityUnit::MW);
        let projected = project_target_generation(&cf, &target, &shares);

        assert_eq!(projected.get(Region::North), Some(&[250.0, 0.0][..]));
        assert_eq!(projected.get(Region::South), Some(&[300.0, 600.0][..]));
        // no share recorded for the East, so nothing is projected there
        assert_eq!(projected.get(Region::East), Some(&[0.0, 0.0][..]));
    }
}
