use std::collections::HashMap;

use crate::models::region::Region;

/// Where a station sits and what it burns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationEntry {
    pub region: Region,
    pub fuel: String,
}

/// Station name -> (region, fuel). Loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct StationInfo {
    stations: HashMap<String, StationEntry>,
}

impl StationInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, region: Region, fuel: impl Into<String>) {
        self.stations.insert(name.into(), StationEntry { region, fuel: fuel.into() });
    }

    pub fn get(&self, name: &str) -> Option<&StationEntry> {
        self.stations.get(name)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

impl FromIterator<(String, Region, String)> for StationInfo {
    fn from_iter<I: IntoIterator<Item = (String, Region, String)>>(iter: I) -> Self {
        let mut info = StationInfo::new();
        for (name, region, fuel) in iter {
            info.insert(name, region, fuel);
        }
        info
    }
}

/// Station name -> installed capacity (kW) for one requested fuel.
#[derive(Debug, Clone, Default)]
pub struct CapacityInfo {
    fuel: String,
    capacities: HashMap<String, f64>,
}

impl CapacityInfo {
    pub fn new(fuel: impl Into<String>) -> Self {
        Self {
            fuel: fuel.into(),
            capacities: HashMap::new(),
        }
    }

    pub fn fuel(&self) -> &str {
        &self.fuel
    }

    pub fn insert(&mut self, station: impl Into<String>, capacity_kw: f64) {
        self.capacities.insert(station.into(), capacity_kw);
    }

    pub fn get(&self, station: &str) -> Option<f64> {
        self.capacities.get(station).copied()
    }

    pub fn contains(&self, station: &str) -> bool {
        self.capacities.contains_key(station)
    }

    /// Stations in name order, for deterministic accumulation.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        let mut entries: Vec<_> = self.capacities.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }

    pub fn len(&self) -> usize {
        self.capacities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capacities.is_empty()
    }
}
