use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::const_funcs::{calc_heat_content_tj, calc_mass_factor_g_per_kwh};
use crate::config::constants::*;
use crate::data::emission_sources::{GenerationInfoRecord, PlantSourceRecord};
use crate::models::emission_factor::{EmissionFactorTable, FuelCategory, PlantEmissionFactor};
use crate::utils::logging::{self, EmissionCalcType, OperationCategory};

/// Stationary combustion factors for a fuel category, kg per TJ of heat
/// input, as (CO2, CH4, N2O).
pub fn combustion_factors(category: FuelCategory) -> (f64, f64, f64) {
    match category {
        FuelCategory::Coal => (COAL_CO2_KG_PER_TJ, COAL_CH4_KG_PER_TJ, COAL_N2O_KG_PER_TJ),
        FuelCategory::Gas => (GAS_CO2_KG_PER_TJ, GAS_CH4_KG_PER_TJ, GAS_N2O_KG_PER_TJ),
        FuelCategory::Diesel => (DIESEL_CO2_KG_PER_TJ, DIESEL_CH4_KG_PER_TJ, DIESEL_N2O_KG_PER_TJ),
        FuelCategory::Oil => (OIL_CO2_KG_PER_TJ, OIL_CH4_KG_PER_TJ, OIL_N2O_KG_PER_TJ),
    }
}

/// CO2-equivalent mass (kg) released by `heat_tj` of the given fuel.
pub fn ghg_mass_kg(heat_tj: f64, category: FuelCategory) -> f64 {
    let (co2, ch4, n2o) = combustion_factors(category);
    heat_tj * (co2 * GWP_CO2 + ch4 * GWP_CH4 + n2o * GWP_N2O)
}

/// CO2e factor in g/kWh of net generation computed from heat input, with
/// the optional calibration ratio applied. `None` when net generation is
/// not positive.
pub fn first_principles_co2e(info: &GenerationInfoRecord, net_generation_kwh: f64) -> Option<f64> {
    let heat_tj = calc_heat_content_tj(info.gross_generation_kwh, info.heat_rate_kcal_per_kwh);
    let basic = calc_mass_factor_g_per_kwh(ghg_mass_kg(heat_tj, info.fuel_category), net_generation_kwh)?;
    Some(basic * info.calibration_ratio.unwrap_or(1.0))
}

/// Rename fuel labels to the legacy emission-source taxonomy.
pub fn legacy_fuel_label(label: &str) -> &str {
    LEGACY_FUEL_RENAMES
        .iter()
        .find(|(from, _)| *from == label)
        .map(|(_, to)| *to)
        .unwrap_or(label)
}

#[derive(Debug, Clone, Default)]
pub struct EmissionFactorOptions {
    pub legacy_taxonomy: bool,
}

/// Derive per-plant g/kWh factors.
///
/// SOx, NOx and PM come from reported masses over net generation. CO2e comes
/// from the first-principles calculation when `generation_info` lists the
/// plant, otherwise from the reported kg/kWh coefficient. Plants with no
/// net generation get zero mass factors and are recorded on the table.
pub fn build_emission_factors(
    sources: &[PlantSourceRecord],
    generation_info: Option<&[GenerationInfoRecord]>,
    options: &EmissionFactorOptions,
) -> EmissionFactorTable {
    let _timing = logging::start_timing("build_emission_factors",
        OperationCategory::Emissions { subcategory: EmissionCalcType::Factors });

    let info_by_plant: HashMap<&str, &GenerationInfoRecord> = generation_info
        .unwrap_or(&[])
        .iter()
        .map(|info| (info.plant.as_str(), info))
        .collect();

    let mut table = EmissionFactorTable::new();
    let mut missing_ghg = Vec::new();

    for source in sources {
        let net = source.net_generation_kwh;
        let zero_generation = net.is_nan() || net <= 0.0;
        let mass = |kg: f64| calc_mass_factor_g_per_kwh(kg, net).unwrap_or(0.0);

        let co2e = match info_by_plant.get(source.plant.as_str()) {
            Some(info) => first_principles_co2e(info, net).unwrap_or(0.0),
            None => match source.ghg_kg_per_kwh {
                Some(coefficient) => coefficient * GRAMS_PER_KG,
                None => {
                    missing_ghg.push(source.plant.clone());
                    0.0
                }
            },
        };

        let fuel = if options.legacy_taxonomy {
            legacy_fuel_label(&source.fuel).to_string()
        } else {
            source.fuel.clone()
        };

        let inserted = table.insert(PlantEmissionFactor {
            plant: source.plant.clone(),
            fuel,
            net_generation_kwh: net,
            sox: mass(source.sox_kg),
            nox: mass(source.nox_kg),
            pm: mass(source.pm_kg),
            co2e,
        });
        if !inserted {
            warn!(plant = %source.plant, "Duplicate plant row ignored, keeping the first");
            continue;
        }
        if zero_generation {
            table.mark_zero_generation(source.plant.clone());
        }
    }

    if !table.zero_generation_plants().is_empty() {
        warn!(plants = ?table.zero_generation_plants(), "Plants with no net generation, mass factors set to 0");
    }
    if !missing_ghg.is_empty() {
        warn!(plants = ?missing_ghg, "Plants without a GHG coefficient, CO2e factor set to 0");
    }
    debug!(plants = table.len(), "Emission factor table built");
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::emission_factor::Pollutant;

    fn source(plant: &str, fuel: &str, net: f64, ghg: Option<f64>) -> PlantSourceRecord {
        PlantSourceRecord {
            plant: plant.to_string(),
            fuel: fuel.to_string(),
            net_generation_kwh: net,
            sox_kg: 50.0,
            nox_kg: 100.0,
            pm_kg: 5.0,
            ghg_kg_per_kwh: ghg,
        }
    }

    #[test]
    fn mass_factors_are_grams_per_kwh() {
        let table = build_emission_factors(
            &[source("興達#1", "燃煤", 100_000.0, Some(0.9))],
            None,
            &EmissionFactorOptions::default(),
        );
        assert_eq!(table.factor("興達#1", Pollutant::SOx), Some(0.5));
        assert_eq!(table.factor("興達#1", Pollutant::NOx), Some(1.0));
        assert_eq!(table.factor("興達#1", Pollutant::PM), Some(0.05));
        assert_eq!(table.factor("興達#1", Pollutant::CO2e), Some(900.0));
    }

    #[test]
    fn zero_generation_is_zeroed_and_recorded() {
        let table = build_emission_factors(
            &[source("備用", "燃油", 0.0, None)],
            None,
            &EmissionFactorOptions::default(),
        );
        assert_eq!(table.factor("備用", Pollutant::SOx), Some(0.0));
        assert_eq!(table.zero_generation_plants(), &["備用".to_string()]);
        assert!(table.iter().all(|p| p.sox.is_finite() && p.co2e.is_finite()));
    }

    #[test]
    fn first_principles_overrides_coefficient() {
        let info = GenerationInfoRecord {
            plant: "大潭#1".to_string(),
            fuel_category: FuelCategory::Gas,
            gross_generation_kwh: 1_000_000.0,
            heat_rate_kcal_per_kwh: 2_000.0,
            calibration_ratio: None,
        };
        let table = build_emission_factors(
            &[source("大潭#1", "燃氣", 1_000_000.0, Some(0.4))],
            Some(&[info.clone()][..]),
            &EmissionFactorOptions::default(),
        );

        let heat_tj = 1_000_000.0 * 2_000.0 * TJ_PER_KCAL;
        let expected = heat_tj * (56_100.0 + 25.0 + 29.8) * 1000.0 / 1_000_000.0;
        let co2e = table.factor("大潭#1", Pollutant::CO2e).unwrap();
        assert!((co2e - expected).abs() < 1e-9);
        // roughly 470 g/kWh for a combined-cycle gas plant
        assert!(co2e > 400.0 && co2e < 550.0);

        let calibrated = first_principles_co2e(
            &GenerationInfoRecord { calibration_ratio: Some(1.1), ..info },
            1_000_000.0,
        )
        .unwrap();
        assert!((calibrated - expected * 1.1).abs() < 1e-9);
    }

    #[test]
    fn legacy_taxonomy_is_opt_in() {
        let sources = [source("林口#1", "燃煤", 10.0, Some(1.0))];
        let plain = build_emission_factors(&sources, None, &EmissionFactorOptions::default());
        assert_eq!(plain.get("林口#1").unwrap().fuel, "燃煤");

        let legacy = build_emission_factors(&sources, None, &EmissionFactorOptions { legacy_taxonomy: true });
        assert_eq!(legacy.get("林口#1").unwrap().fuel, "COAL");
        assert_eq!(legacy_fuel_label("太陽能"), "太陽能");
    }

    #[test]
    fn first_duplicate_row_wins() {
        let table = build_emission_factors(
            &[source("A", "燃煤", 100.0, Some(1.0)), source("A", "燃煤", 100.0, Some(2.0))],
            None,
            &EmissionFactorOptions::default(),
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.factor("A", Pollutant::CO2e), Some(1000.0));
    }
}
