use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Deserialize;

use crate::error::{EmissionError, Result};
use crate::models::reference::{CapacityInfo, StationInfo};
use crate::models::region::Region;
use crate::utils::logging::{self, FileIOType, OperationCategory};

#[derive(Debug, Deserialize)]
struct StationRow {
    #[serde(rename = "Station Name")]
    station_name: String,
    #[serde(rename = "Location")]
    location: String,
    #[serde(rename = "Type")]
    fuel_type: String,
}

#[derive(Debug, Deserialize)]
struct CapacityRow {
    #[serde(rename = "Station Name")]
    station_name: String,
    #[serde(rename = "Fuel Type")]
    fuel_type: String,
    #[serde(rename = "Installed Capacity(kW)")]
    installed_capacity_kw: String,
}

pub(crate) fn read_to_string_without_bom(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents.trim_start_matches('\u{feff}').to_string())
}

pub(crate) fn parse_number(field: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .replace(',', "")
        .parse()
        .map_err(|_| EmissionError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        })
}

pub fn parse_station_info<R: Read>(reader: R) -> Result<StationInfo> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut stations = StationInfo::new();
    for row in reader.deserialize() {
        let row: StationRow = row?;
        let region: Region = row.location.parse()?;
        stations.insert(row.station_name.trim(), region, row.fuel_type.trim());
    }
    Ok(stations)
}

/// Capacity rows for one fuel label; rows of other fuels are skipped.
pub fn parse_capacity_info<R: Read>(reader: R, fuel: &str) -> Result<CapacityInfo> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut capacity = CapacityInfo::new(fuel);
    for row in reader.deserialize() {
        let row: CapacityRow = row?;
        if row.fuel_type.trim() != fuel {
            continue;
        }
        let kw = parse_number("Installed Capacity(kW)", &row.installed_capacity_kw)?;
        capacity.insert(row.station_name.trim(), kw);
    }
    Ok(capacity)
}

pub fn load_station_info(path: &Path) -> Result<StationInfo> {
    let _timing = logging::start_timing("load_station_info",
        OperationCategory::FileIO { subcategory: FileIOType::DataLoad });
    let contents = read_to_string_without_bom(path)?;
    parse_station_info(contents.as_bytes())
}

pub fn load_capacity_info(path: &Path, fuel: &str) -> Result<CapacityInfo> {
    let _timing = logging::start_timing("load_capacity_info",
        OperationCategory::FileIO { subcategory: FileIOType::DataLoad });
    let contents = read_to_string_without_bom(path)?;
    parse_capacity_info(contents.as_bytes(), fuel)
}
