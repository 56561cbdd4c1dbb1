use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::const_funcs::{mw_to_kw, window_means};
use crate::config::constants::SAMPLES_PER_HOUR;
use crate::error::{EmissionError, Result};
use crate::models::generation::{HourlyGenerationSeries, SeriesKey};
use crate::models::reference::StationInfo;
use crate::utils::logging::{self, FileIOType, OperationCategory};

/// A numeric field that some exports write as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    pub(crate) fn to_f64(&self, unit: &str) -> Result<f64> {
        match self {
            NumberOrString::Number(n) => Ok(*n),
            NumberOrString::Text(s) => s.trim().replace(',', "").parse().map_err(|_| {
                EmissionError::InvalidReading {
                    unit: unit.to_string(),
                    value: s.clone(),
                }
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawGenerationFile {
    records: RawGenerationRecords,
}

#[derive(Debug, Deserialize)]
struct RawGenerationRecords {
    #[serde(rename = "NET_P")]
    net_p: Vec<RawGenerationReading>,
}

#[derive(Debug, Deserialize)]
struct RawGenerationReading {
    #[serde(rename = "FUEL_TYPE")]
    fuel_type: String,
    #[serde(rename = "UNIT_NAME")]
    unit_name: String,
    #[serde(rename = "NET_P")]
    net_p: NumberOrString,
    #[serde(rename = "DATE", default)]
    date: String,
}

/// One native-resolution reading.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReading {
    pub fuel: String,
    pub unit: String,
    pub net_power_mw: f64,
    pub timestamp: String,
}

/// Readings whose unit has no station entry, grouped by unit name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissingStationReport {
    entries: BTreeMap<String, Vec<(String, String, f64)>>,
}

impl MissingStationReport {
    fn record(&mut self, reading: &GenerationReading) {
        self.entries
            .entry(reading.unit.clone())
            .or_default()
            .push((reading.fuel.clone(), reading.timestamp.clone(), reading.net_power_mw));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// (fuel, timestamp, MW) readings dropped for a unit.
    pub fn readings(&self, unit: &str) -> &[(String, String, f64)] {
        self.entries.get(unit).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn log(&self) {
        if self.is_empty() {
            return;
        }
        let units: Vec<&str> = self.units().collect();
        warn!(
            count = units.len(),
            "Please check the new stations or errors: {:?}",
            units
        );
    }
}

pub fn parse_generation_readings<R: Read>(reader: R) -> Result<Vec<GenerationReading>> {
    let raw: RawGenerationFile = serde_json::from_reader(reader)?;
    raw.records
        .net_p
        .into_iter()
        .map(|r| {
            let net_power_mw = r.net_p.to_f64(&r.unit_name)?;
            Ok(GenerationReading {
                fuel: r.fuel_type,
                unit: r.unit_name,
                net_power_mw,
                timestamp: r.date,
            })
        })
        .collect()
}

pub fn load_generation_readings(path: &Path) -> Result<Vec<GenerationReading>> {
    let _timing = logging::start_timing("load_generation_readings",
        OperationCategory::FileIO { subcategory: FileIOType::DataLoad });

    let mut contents = String::new();
    BufReader::new(File::open(path)?).read_to_string(&mut contents)?;
    // Exports are written with a UTF-8 byte-order mark.
    parse_generation_readings(contents.trim_start_matches('\u{feff}').as_bytes())
}

/// Bucket native readings into hourly series keyed by (region, fuel, unit).
///
/// Power is converted MW -> kW and every `SAMPLES_PER_HOUR` consecutive
/// readings of a unit are averaged, keeping reading order. Units missing
/// from `stations` are collected into the report instead of failing.
pub fn build_hourly_series(
    readings: &[GenerationReading],
    stations: &StationInfo,
) -> Result<(HourlyGenerationSeries, MissingStationReport)> {
    let mut grouped: BTreeMap<SeriesKey, Vec<f64>> = BTreeMap::new();
    let mut missing = MissingStationReport::default();

    for reading in readings {
        match stations.get(&reading.unit) {
            Some(entry) => grouped
                .entry(SeriesKey::new(entry.region, reading.fuel.as_str(), reading.unit.as_str()))
                .or_default()
                .push(mw_to_kw(reading.net_power_mw)),
            None => missing.record(reading),
        }
    }

    let mut series = HourlyGenerationSeries::new();
    for (key, samples) in grouped {
        series.insert(key, window_means(&samples, SAMPLES_PER_HOUR))?;
    }

    debug!(units = series.len(), hours = series.hours(), "Built hourly generation series");
    missing.log();

    Ok((series, missing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::region::Region;

    fn stations() -> StationInfo {
        [
            ("興達#1".to_string(), Region::South, "燃煤".to_string()),
            ("彰工".to_string(), Region::Central, "風力".to_string()),
        ]
        .into_iter()
        .collect()
    }

    fn reading(unit: &str, fuel: &str, mw: f64) -> GenerationReading {
        GenerationReading {
            fuel: fuel.to_string(),
            unit: unit.to_string(),
            net_power_mw: mw,
            timestamp: "2024-05-01 00:00".to_string(),
        }
    }

    #[test]
    fn parses_string_and_numeric_power() {
        let json = r#"{"records": {"NET_P": [
            {"FUEL_TYPE": "燃煤", "UNIT_NAME": "興達#1", "NET_P": "1,234.5", "DATE": "2024-05-01 00:00"},
            {"FUEL_TYPE": "燃煤", "UNIT_NAME": "興達#1", "NET_P": 12.5, "DATE": "2024-05-01 00:10"}
        ]}}"#;
        let readings = parse_generation_readings(json.as_bytes()).unwrap();
        assert_eq!(readings[0].net_power_mw, 1234.5);
        assert_eq!(readings[1].net_power_mw, 12.5);
    }

    #[test]
    fn rejects_unparseable_power() {
        let json = r#"{"records": {"NET_P": [
            {"FUEL_TYPE": "燃煤", "UNIT_NAME": "興達#1", "NET_P": "N/A", "DATE": ""}
        ]}}"#;
        let err = parse_generation_readings(json.as_bytes()).unwrap_err();
        assert!(matches!(err, EmissionError::InvalidReading { .. }));
    }

    #[test]
    fn buckets_six_samples_per_hour_in_kw() {
        let mut readings: Vec<_> = (0..6).map(|_| reading("興達#1", "燃煤", 1.0)).collect();
        readings.extend((0..6).map(|_| reading("興達#1", "燃煤", 3.0)));
        readings.extend((0..6).map(|i| reading("彰工", "風力", i as f64)));
        readings.extend((0..6).map(|_| reading("彰工", "風力", 0.0)));

        let (series, missing) = build_hourly_series(&readings, &stations()).unwrap();
        assert!(missing.is_empty());
        assert_eq!(series.get(Region::South, "燃煤", "興達#1"), Some(&[1000.0, 3000.0][..]));
        assert_eq!(series.get(Region::Central, "風力", "彰工"), Some(&[2500.0, 0.0][..]));
    }

    #[test]
    fn unknown_units_are_reported_not_fatal() {
        let readings = vec![
            reading("興達#1", "燃煤", 1.0),
            reading("新電廠", "燃氣", 5.0),
            reading("新電廠", "燃氣", 6.0),
        ];
        let (series, missing) = build_hourly_series(&readings, &stations()).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(missing.units().collect::<Vec<_>>(), vec!["新電廠"]);
        assert_eq!(missing.readings("新電廠").len(), 2);
    }
}
