use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{EmissionError, Result};
use crate::models::region::Region;

/// Composite key of one generating unit's hourly series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    pub region: Region,
    pub fuel: String,
    pub unit: String,
}

impl SeriesKey {
    pub fn new(region: Region, fuel: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            region,
            fuel: fuel.into(),
            unit: unit.into(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.region.label(), self.fuel, self.unit)
    }
}

/// Hourly net generation (kWh) per (region, fuel, unit).
///
/// Every series shares the same length and hourly alignment. Units without
/// data are absent keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlyGenerationSeries {
    hours: usize,
    series: BTreeMap<SeriesKey, Vec<f64>>,
}

impl HourlyGenerationSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: SeriesKey, values: Vec<f64>) -> Result<()> {
        if self.series.is_empty() {
            self.hours = values.len();
        } else if values.len() != self.hours {
            return Err(EmissionError::SeriesLengthMismatch {
                key: key.to_string(),
                expected: self.hours,
                found: values.len(),
            });
        }
        if self.series.contains_key(&key) {
            return Err(EmissionError::Duplicate(key.to_string()));
        }
        self.series.insert(key, values);
        Ok(())
    }

    /// Number of hourly values in every series.
    pub fn hours(&self) -> usize {
        self.hours
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn get(&self, region: Region, fuel: &str, unit: &str) -> Option<&[f64]> {
        self.series
            .get(&SeriesKey::new(region, fuel, unit))
            .map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SeriesKey, &[f64])> {
        self.series.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn regions(&self) -> BTreeSet<Region> {
        self.series.keys().map(|k| k.region).collect()
    }

    pub fn fuels(&self) -> BTreeSet<&str> {
        self.series.keys().map(|k| k.fuel.as_str()).collect()
    }

    pub fn in_region(&self, region: Region) -> impl Iterator<Item = (&SeriesKey, &[f64])> {
        self.iter().filter(move |(k, _)| k.region == region)
    }

    /// Units of one fuel in one region, as (unit name, series).
    pub fn units<'a>(&'a self, region: Region, fuel: &'a str) -> impl Iterator<Item = (&'a str, &'a [f64])> {
        self.in_region(region)
            .filter(move |(k, _)| k.fuel == fuel)
            .map(|(k, v)| (k.unit.as_str(), v))
    }

    /// Per-region sum of every unit whose fuel is not in `excluded`. Regions
    /// where nothing remains get a zero series.
    pub fn region_totals_excluding(&self, excluded: &BTreeSet<&str>) -> BTreeMap<Region, Vec<f64>> {
        let mut totals: BTreeMap<Region, Vec<f64>> = self
            .regions()
            .into_iter()
            .map(|region| (region, vec![0.0; self.hours]))
            .collect();

        for (key, values) in self.iter() {
            if excluded.contains(key.fuel.as_str()) {
                continue;
            }
            if let Some(total) = totals.get_mut(&key.region) {
                for (acc, v) in total.iter_mut().zip(values) {
                    *acc += v;
                }
            }
        }
        totals
    }
}
