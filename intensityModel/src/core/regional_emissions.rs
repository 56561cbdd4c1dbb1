use std::collections::BTreeSet;

use tracing::debug;

use crate::error::Result;
use crate::models::emission_factor::{EmissionFactorTable, Pollutant};
use crate::models::generation::HourlyGenerationSeries;
use crate::models::table::RegionalTable;
use crate::utils::logging::{self, EmissionCalcType, OperationCategory};

/// Hourly emission mass (g) per mainland region for one pollutant.
///
/// Every unit whose fuel appears in the factor table contributes
/// `generation x plant factor`. Units with no plant row contribute nothing.
/// Regions with generation but no matched unit get a zero series.
pub fn aggregate_regional_emissions(
    series: &HourlyGenerationSeries,
    factors: &EmissionFactorTable,
    pollutant: Pollutant,
) -> Result<RegionalTable> {
    let _timing = logging::start_timing("aggregate_regional_emissions",
        OperationCategory::Emissions { subcategory: EmissionCalcType::Aggregation });

    let fuels: BTreeSet<&str> = factors.fuels();
    let mut emissions = RegionalTable::new(series.hours());
    let mut unmatched = 0usize;

    for region in series.regions() {
        if region.is_excluded() {
            continue;
        }
        let column = emissions.column_mut(region);
        for fuel in &fuels {
            for (unit, values) in series.units(region, fuel) {
                let Some(factor) = factors.factor(unit, pollutant) else {
                    unmatched += 1;
                    continue;
                };
                for (acc, v) in column.iter_mut().zip(values) {
                    *acc += v * factor;
                }
            }
        }
    }

    debug!(pollutant = %pollutant, unmatched_units = unmatched, "Aggregated regional emissions");
    Ok(emissions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::emission_factor::PlantEmissionFactor;
    use crate::models::generation::SeriesKey;
    use crate::models::region::Region;

    fn factor(plant: &str, fuel: &str, co2e: f64) -> PlantEmissionFactor {
        PlantEmissionFactor {
            plant: plant.to_string(),
            fuel: fuel.to_string(),
            net_generation_kwh: 1.0,
            sox: co2e / 100.0,
            nox: 0.0,
            pm: 0.0,
            co2e,
        }
    }

    #[test]
    fn sums_units_times_factors_per_region() {
        let mut series = HourlyGenerationSeries::new();
        series.insert(SeriesKey::new(Region::South, "燃煤", "興達#1"), vec![10.0, 20.0]).unwrap();
        series.insert(SeriesKey::new(Region::South, "燃氣", "興達CC#1"), vec![5.0, 5.0]).unwrap();
        series.insert(SeriesKey::new(Region::North, "燃氣", "大潭#1"), vec![1.0, 2.0]).unwrap();
        series.insert(SeriesKey::new(Region::North, "太陽能", "北部太陽能"), vec![9.0, 9.0]).unwrap();
        series.insert(SeriesKey::new(Region::Islands, "燃油", "塔山"), vec![3.0, 3.0]).unwrap();

        let mut table = EmissionFactorTable::new();
        table.insert(factor("興達#1", "燃煤", 900.0));
        table.insert(factor("興達CC#1", "燃氣", 400.0));
        table.insert(factor("大潭#1", "燃氣", 400.0));
        table.insert(factor("塔山", "燃油", 800.0));

        let co2e = aggregate_regional_emissions(&series, &table, Pollutant::CO2e).unwrap();
        assert_eq!(co2e.get(Region::South), Some(&[11_000.0, 20_000.0][..]));
        assert_eq!(co2e.get(Region::North), Some(&[400.0, 800.0][..]));
        assert!(!co2e.contains(Region::Islands));
    }

    #[test]
    fn unmatched_units_contribute_zero() {
        let mut series = HourlyGenerationSeries::new();
        series.insert(SeriesKey::new(Region::East, "燃煤", "未知機組"), vec![10.0]).unwrap();
        let mut table = EmissionFactorTable::new();
        table.insert(factor("興達#1", "燃煤", 900.0));

        let sox = aggregate_regional_emissions(&series, &table, Pollutant::SOx).unwrap();
        assert_eq!(sox.get(Region::East), Some(&[0.0][..]));
    }
}
