use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::fuel_type::TargetFuel;
use crate::core::target_generation::{CapacityUnit, TargetCapacity};
use crate::error::{EmissionError, Result};
use crate::models::table::{HourIndex, Scale};

/// One batch period: its generation export, flow export and hourly range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodConfig {
    pub label: String,
    pub generation_file: String,
    pub flow_file: String,
    pub start: String,         // YYYY-MM-DD HH:MM:SS
    pub end: String,           // inclusive
}

impl PeriodConfig {
    pub fn new(label: &str, generation_file: &str, flow_file: &str, start: &str, end: &str) -> Self {
        Self {
            label: label.to_string(),
            generation_file: generation_file.to_string(),
            flow_file: flow_file.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    pub fn hour_index(&self) -> Result<HourIndex> {
        HourIndex::parse(&self.start, &self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub result_dir: PathBuf,
    pub station_file: String,
    pub capacity_file: String,
    pub plant_generation_file: String,
    pub pollutant_file: String,
    pub generation_info_file: Option<String>,
    pub legacy_fuel_taxonomy: bool,
    pub periods: Vec<PeriodConfig>,
    pub targets: Vec<TargetCapacity>,
    pub scale: Scale,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/2024"),
            result_dir: PathBuf::from("results/2024"),
            station_file: "powerplants_info.csv".to_string(),
            capacity_file: "capacity.csv".to_string(),
            plant_generation_file: "pg.csv".to_string(),
            pollutant_file: "AirpollutantEmission.csv".to_string(),
            generation_info_file: None,
            legacy_fuel_taxonomy: false,
            periods: vec![
                PeriodConfig::new(
                    "5~7",
                    "各機組過去發電量20240501-20240731.json",
                    "pg_flow_5_7.json",
                    "2024-05-01 00:00:00",
                    "2024-07-31 23:00:00",
                ),
                PeriodConfig::new(
                    "8~10",
                    "各機組過去發電量20240801-20241031.json",
                    "pg_flow_8_10.json",
                    "2024-08-01 00:00:00",
                    "2024-10-31 23:00:00",
                ),
            ],
            targets: vec![
                TargetCapacity::new(TargetFuel::Solar, 13.2, CapacityUnit::GW),
                TargetCapacity::new(TargetFuel::OffshoreWind, 2.348, CapacityUnit::GW),
                TargetCapacity::new(TargetFuel::OnshoreWind, 0.915, CapacityUnit::GW),
            ],
            scale: Scale::Regional,
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(contents.trim_start_matches('\u{feff}'))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut labels = BTreeSet::new();
        for period in &self.periods {
            if !labels.insert(period.label.as_str()) {
                return Err(EmissionError::Duplicate(format!("period {}", period.label)));
            }
            period.hour_index()?;
        }
        let mut fuels = BTreeSet::new();
        for target in &self.targets {
            if !fuels.insert(target.fuel) {
                return Err(EmissionError::Duplicate(format!("target fuel {}", target.fuel)));
            }
            if !target.capacity.is_finite() || target.capacity < 0.0 {
                return Err(EmissionError::InvalidValue {
                    field: format!("target capacity for {}", target.fuel),
                    value: target.capacity.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn data_path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    /// Fuels whose capacity tables are needed: every target plus the fuel
    /// each one is projected from.
    pub fn capacity_fuels(&self) -> BTreeSet<TargetFuel> {
        self.targets
            .iter()
            .flat_map(|t| [t.fuel, t.fuel.projection_proxy()])
            .collect()
    }
}
