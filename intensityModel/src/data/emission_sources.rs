use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Deserialize;

use super::reference_loader::{parse_number, read_to_string_without_bom};
use crate::error::{EmissionError, Result};
use crate::models::emission_factor::FuelCategory;
use crate::utils::logging::{self, FileIOType, OperationCategory};

#[derive(Debug, Deserialize)]
struct PlantGenerationRow {
    #[serde(rename = "能源別")]
    fuel: String,
    #[serde(rename = "電廠名稱")]
    plant: String,
    #[serde(rename = "淨發電量(度)")]
    net_generation_kwh: String,
}

#[derive(Debug, Deserialize)]
struct PollutantMassRow {
    #[serde(rename = "硫氧化物排放量(kg)")]
    sox_kg: String,
    #[serde(rename = "氮氧化物排放量(kg)")]
    nox_kg: String,
    #[serde(rename = "粒狀污染物排放量(kg)")]
    pm_kg: String,
    #[serde(rename = "溫室氣體排放量係數(kg/kwh)", default)]
    ghg_kg_per_kwh: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerationInfoRow {
    #[serde(rename = "Plant Name")]
    plant: String,
    #[serde(rename = "Fuel Category")]
    fuel_category: String,
    #[serde(rename = "Gross Generation(kWh)")]
    gross_generation_kwh: String,
    #[serde(rename = "Gross Heat Rate(kcal/kWh)")]
    heat_rate_kcal_per_kwh: String,
    #[serde(rename = "Calibration Ratio", default)]
    calibration_ratio: Option<String>,
}

/// One plant's generation and pollutant masses, before factors are derived.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantSourceRecord {
    pub plant: String,
    pub fuel: String,
    pub net_generation_kwh: f64,
    pub sox_kg: f64,
    pub nox_kg: f64,
    pub pm_kg: f64,
    /// Reported GHG coefficient in kg/kWh, when the source carries one.
    pub ghg_kg_per_kwh: Option<f64>,
}

/// Inputs for the first-principles GHG factor.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationInfoRecord {
    pub plant: String,
    pub fuel_category: FuelCategory,
    pub gross_generation_kwh: f64,
    pub heat_rate_kcal_per_kwh: f64,
    pub calibration_ratio: Option<f64>,
}

fn parse_optional(field: &str, value: &Option<String>) -> Result<Option<f64>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_number(field, v).map(Some),
    }
}

/// Join the plant generation table with the pollutant mass table row by row.
/// Both exports list plants in the same order.
pub fn parse_plant_sources<G: Read, M: Read>(generation: G, masses: M) -> Result<Vec<PlantSourceRecord>> {
    let generation_rows: Vec<PlantGenerationRow> = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(generation)
        .deserialize()
        .collect::<std::result::Result<_, _>>()?;
    let mass_rows: Vec<PollutantMassRow> = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(masses)
        .deserialize()
        .collect::<std::result::Result<_, _>>()?;

    if generation_rows.len() != mass_rows.len() {
        return Err(EmissionError::InvalidValue {
            field: "plant row count".to_string(),
            value: format!("{} generation rows vs {} pollutant rows", generation_rows.len(), mass_rows.len()),
        });
    }

    generation_rows
        .into_iter()
        .zip(mass_rows)
        .map(|(g, m)| {
            Ok(PlantSourceRecord {
                plant: g.plant.trim().to_string(),
                fuel: g.fuel.trim().to_string(),
                net_generation_kwh: parse_number("淨發電量(度)", &g.net_generation_kwh)?,
                sox_kg: parse_number("硫氧化物排放量(kg)", &m.sox_kg)?,
                nox_kg: parse_number("氮氧化物排放量(kg)", &m.nox_kg)?,
                pm_kg: parse_number("粒狀污染物排放量(kg)", &m.pm_kg)?,
                ghg_kg_per_kwh: parse_optional("溫室氣體排放量係數(kg/kwh)", &m.ghg_kg_per_kwh)?,
            })
        })
        .collect()
}

pub fn parse_generation_info<R: Read>(reader: R) -> Result<Vec<GenerationInfoRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut records = Vec::new();
    for row in reader.deserialize() {
        let row: GenerationInfoRow = row?;
        records.push(GenerationInfoRecord {
            plant: row.plant.trim().to_string(),
            fuel_category: row.fuel_category.parse()?,
            gross_generation_kwh: parse_number("Gross Generation(kWh)", &row.gross_generation_kwh)?,
            heat_rate_kcal_per_kwh: parse_number("Gross Heat Rate(kcal/kWh)", &row.heat_rate_kcal_per_kwh)?,
            calibration_ratio: parse_optional("Calibration Ratio", &row.calibration_ratio)?,
        });
    }
    Ok(records)
}

pub fn load_plant_sources(generation_path: &Path, masses_path: &Path) -> Result<Vec<PlantSourceRecord>> {
    let _timing = logging::start_timing("load_plant_sources",
        OperationCategory::FileIO { subcategory: FileIOType::DataLoad });
    let generation = read_to_string_without_bom(generation_path)?;
    let masses = read_to_string_without_bom(masses_path)?;
    parse_plant_sources(generation.as_bytes(), masses.as_bytes())
}

pub fn load_generation_info(path: &Path) -> Result<Vec<GenerationInfoRecord>> {
    let _timing = logging::start_timing("load_generation_info",
        OperationCategory::FileIO { subcategory: FileIOType::DataLoad });
    let contents = read_to_string_without_bom(path)?;
    parse_generation_info(contents.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_generation_and_masses_by_row() {
        let generation = "能源別,電廠名稱,淨發電量(度),其他\n燃煤,興達#1,\"1,000,000\",x\n燃氣,大潭#1,500000,y\n";
        let masses = "硫氧化物排放量(kg),氮氧化物排放量(kg),粒狀污染物排放量(kg),溫室氣體排放量係數(kg/kwh)\n\
                      100,200,10,0.9\n\
                      0,50,1,\n";
        let records = parse_plant_sources(generation.as_bytes(), masses.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].plant, "興達#1");
        assert_eq!(records[0].net_generation_kwh, 1_000_000.0);
        assert_eq!(records[0].ghg_kg_per_kwh, Some(0.9));
        assert_eq!(records[1].ghg_kg_per_kwh, None);
    }

    #[test]
    fn row_count_mismatch_is_fatal() {
        let generation = "能源別,電廠名稱,淨發電量(度)\n燃煤,興達#1,1\n";
        let masses = "硫氧化物排放量(kg),氮氧化物排放量(kg),粒狀污染物排放量(kg)\n";
        assert!(parse_plant_sources(generation.as_bytes(), masses.as_bytes()).is_err());
    }

    #[test]
    fn parses_generation_info() {
        let csv = "Plant Name,Fuel Category,Gross Generation(kWh),Gross Heat Rate(kcal/kWh),Calibration Ratio\n\
                   興達#1,Coal,1000000,2200,1.05\n\
                   大潭#1,Gas,500000,1800,\n";
        let records = parse_generation_info(csv.as_bytes()).unwrap();
        assert_eq!(records[0].fuel_category, FuelCategory::Coal);
        assert_eq!(records[0].calibration_ratio, Some(1.05));
        assert_eq!(records[1].calibration_ratio, None);
    }
}
