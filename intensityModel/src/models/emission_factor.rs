use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EmissionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pollutant {
    CO2e,
    SOx,
    NOx,
    PM,
}

impl Pollutant {
    pub const ALL: [Pollutant; 4] = [Pollutant::CO2e, Pollutant::SOx, Pollutant::NOx, Pollutant::PM];

    pub fn name(&self) -> &'static str {
        match self {
            Pollutant::CO2e => "CO2e",
            Pollutant::SOx => "SOx",
            Pollutant::NOx => "NOx",
            Pollutant::PM => "PM",
        }
    }
}

impl FromStr for Pollutant {
    type Err = EmissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "CO2e" | "co2e" => Ok(Pollutant::CO2e),
            "SOx" | "sox" => Ok(Pollutant::SOx),
            "NOx" | "nox" => Ok(Pollutant::NOx),
            "PM" | "pm" => Ok(Pollutant::PM),
            other => Err(EmissionError::UnknownPollutant(other.to_string())),
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fuel categories with stationary-combustion emission factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelCategory {
    Coal,
    Gas,
    Diesel,
    Oil,
}

impl FromStr for FuelCategory {
    type Err = EmissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coal" | "燃煤" => Ok(FuelCategory::Coal),
            "gas" | "lng" | "燃氣" => Ok(FuelCategory::Gas),
            "diesel" | "輕油" => Ok(FuelCategory::Diesel),
            "oil" | "燃油" => Ok(FuelCategory::Oil),
            _ => Err(EmissionError::UnknownFuel(s.to_string())),
        }
    }
}

/// Per-plant factors in g/kWh of net generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantEmissionFactor {
    pub plant: String,
    pub fuel: String,
    pub net_generation_kwh: f64,
    pub sox: f64,
    pub nox: f64,
    pub pm: f64,
    pub co2e: f64,
}

impl PlantEmissionFactor {
    pub fn factor(&self, pollutant: Pollutant) -> f64 {
        match pollutant {
            Pollutant::CO2e => self.co2e,
            Pollutant::SOx => self.sox,
            Pollutant::NOx => self.nox,
            Pollutant::PM => self.pm,
        }
    }
}

/// Plant-level emission factors keyed by plant name.
#[derive(Debug, Clone, Default)]
pub struct EmissionFactorTable {
    plants: BTreeMap<String, PlantEmissionFactor>,
    zero_generation: Vec<String>,
}

impl EmissionFactorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the plant already has a row; the first row wins.
    pub fn insert(&mut self, factor: PlantEmissionFactor) -> bool {
        if self.plants.contains_key(&factor.plant) {
            return false;
        }
        self.plants.insert(factor.plant.clone(), factor);
        true
    }

    /// Record a plant whose mass factors were zeroed because it reported no
    /// net generation.
    pub fn mark_zero_generation(&mut self, plant: impl Into<String>) {
        self.zero_generation.push(plant.into());
    }

    pub fn zero_generation_plants(&self) -> &[String] {
        &self.zero_generation
    }

    pub fn get(&self, plant: &str) -> Option<&PlantEmissionFactor> {
        self.plants.get(plant)
    }

    pub fn factor(&self, plant: &str, pollutant: Pollutant) -> Option<f64> {
        self.plants.get(plant).map(|p| p.factor(pollutant))
    }

    /// Distinct fuel labels present in the table.
    pub fn fuels(&self) -> BTreeSet<&str> {
        self.plants.values().map(|p| p.fuel.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlantEmissionFactor> {
        self.plants.values()
    }

    pub fn len(&self) -> usize {
        self.plants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }
}
