use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::fuel_type::{normalize_fuel_label, TargetFuel};
use crate::error::Result;
use crate::models::generation::HourlyGenerationSeries;
use crate::models::reference::CapacityInfo;
use crate::models::region::Region;
use crate::models::table::RegionalTable;
use crate::utils::logging::{self, CapacityCalcType, OperationCategory};

/// Hourly capacity factors for one fuel, both per region and pooled.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityFactorResult {
    pub fuel: TargetFuel,
    pub regional: RegionalTable,
    pub national: Vec<f64>,
    /// (region, station) pairs that had negative readings, with the count of
    /// clamped hours.
    pub clamped: BTreeMap<(Region, String), usize>,
    /// Set when the Eastern column was derived from Central and South.
    pub eastern_substituted: bool,
}

#[derive(Default)]
struct Pool {
    generation: Vec<f64>,
    capacity_kw: f64,
    stations: usize,
}

impl Pool {
    fn new(hours: usize) -> Self {
        Self {
            generation: vec![0.0; hours],
            ..Default::default()
        }
    }

    fn factors(&self, label: &str) -> Vec<f64> {
        if self.capacity_kw > 0.0 {
            self.generation.iter().map(|g| g / self.capacity_kw).collect()
        } else {
            warn!(column = label, stations = self.stations, "Installed capacity is zero, capacity factor set to 0");
            vec![0.0; self.generation.len()]
        }
    }
}

/// Capacity factor of `fuel` from measured generation and installed capacity.
///
/// Only stations listed in `capacity` count. Negative readings are clamped to
/// zero before summing. The national series pools every station rather than
/// averaging the regional factors.
pub fn estimate_capacity_factor(
    series: &HourlyGenerationSeries,
    capacity: &CapacityInfo,
    fuel: TargetFuel,
) -> Result<CapacityFactorResult> {
    let _timing = logging::start_timing("estimate_capacity_factor",
        OperationCategory::Capacity { subcategory: CapacityCalcType::CapacityFactor });

    let hours = series.hours();
    let generation_label = normalize_fuel_label(capacity.fuel());
    let mut pools: BTreeMap<Region, Pool> = BTreeMap::new();
    let mut national = Pool::new(hours);
    let mut clamped = BTreeMap::new();

    for region in series.regions() {
        for (unit, values) in series.units(region, generation_label) {
            let Some(capacity_kw) = capacity.get(unit) else {
                continue;
            };

            let pool = pools.entry(region).or_insert_with(|| Pool::new(hours));
            let mut negatives = 0;
            for (t, value) in values.iter().enumerate() {
                let v = if *value < 0.0 {
                    negatives += 1;
                    0.0
                } else {
                    *value
                };
                pool.generation[t] += v;
                national.generation[t] += v;
            }
            if negatives > 0 {
                warn!(region = %region, station = unit, hours = negatives, "Negative generation clamped to 0");
                clamped.insert((region, unit.to_string()), negatives);
            }

            pool.capacity_kw += capacity_kw;
            pool.stations += 1;
            national.capacity_kw += capacity_kw;
            national.stations += 1;
        }
    }

    let mut regional = RegionalTable::new(hours);
    for (region, pool) in &pools {
        regional.insert(*region, pool.factors(region.label()))?;
        debug!(region = %region, stations = pool.stations, capacity_kw = pool.capacity_kw, "Regional capacity pooled");
    }

    let eastern_substituted = fuel.has_eastern_data_gap() && substitute_eastern(&mut regional)?;

    Ok(CapacityFactorResult {
        fuel,
        regional,
        national: national.factors("national"),
        clamped,
        eastern_substituted,
    })
}

/// Fill a missing Eastern column with the mean of Central and South.
fn substitute_eastern(table: &mut RegionalTable) -> Result<bool> {
    if table.contains(Region::East) {
        return Ok(false);
    }
    let (Some(central), Some(south)) = (table.get(Region::Central), table.get(Region::South)) else {
        warn!("No Eastern measurement and no Central/South factors to substitute from");
        return Ok(false);
    };
    let east: Vec<f64> = central.iter().zip(south).map(|(c, s)| (c + s) / 2.0).collect();
    table.insert(Region::East, east)?;
    debug!("Eastern capacity factor substituted by mean of Central and South");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::generation::SeriesKey;

    fn wind_capacity(entries: &[(&str, f64)]) -> CapacityInfo {
        let mut capacity = CapacityInfo::new("陸域風電");
        for (name, kw) in entries {
            capacity.insert(*name, *kw);
        }
        capacity
    }

    #[test]
    fn negative_readings_are_clamped() {
        let mut series = HourlyGenerationSeries::new();
        series
            .insert(SeriesKey::new(Region::North, "風力", "石門"), vec![100.0, 200.0, -50.0, 150.0])
            .unwrap();
        let result = estimate_capacity_factor(&series, &wind_capacity(&[("石門", 200.0)]), TargetFuel::OnshoreWind).unwrap();

        assert_eq!(result.regional.get(Region::North), Some(&[0.5, 1.0, 0.0, 0.75][..]));
        assert_eq!(result.national, vec![0.5, 1.0, 0.0, 0.75]);
        assert_eq!(result.clamped.get(&(Region::North, "石門".to_string())), Some(&1));
    }

    #[test]
    fn national_factor_pools_stations() {
        let mut series = HourlyGenerationSeries::new();
        series.insert(SeriesKey::new(Region::North, "風力", "A"), vec![10.0]).unwrap();
        series.insert(SeriesKey::new(Region::Central, "風力", "B"), vec![90.0]).unwrap();
        let capacity = wind_capacity(&[("A", 100.0), ("B", 100.0)]);
        let result = estimate_capacity_factor(&series, &capacity, TargetFuel::OnshoreWind).unwrap();

        assert_eq!(result.regional.get(Region::North), Some(&[0.1][..]));
        assert_eq!(result.regional.get(Region::Central), Some(&[0.9][..]));
        assert_eq!(result.national, vec![0.5]);
    }

    #[test]
    fn stations_without_capacity_are_ignored() {
        let mut series = HourlyGenerationSeries::new();
        series.insert(SeriesKey::new(Region::North, "風力", "A"), vec![10.0]).unwrap();
        series.insert(SeriesKey::new(Region::North, "風力", "unlisted"), vec![1000.0]).unwrap();
        let result = estimate_capacity_factor(&series, &wind_capacity(&[("A", 20.0)]), TargetFuel::OnshoreWind).unwrap();
        assert_eq!(result.regional.get(Region::North), Some(&[0.5][..]));
    }

    #[test]
    fn solar_east_is_substituted_from_central_and_south() {
        let mut series = HourlyGenerationSeries::new();
        series.insert(SeriesKey::new(Region::Central, "太陽能", "C"), vec![20.0, 40.0]).unwrap();
        series.insert(SeriesKey::new(Region::South, "太陽能", "S"), vec![60.0, 0.0]).unwrap();
        let mut capacity = CapacityInfo::new("太陽能");
        capacity.insert("C", 100.0);
        capacity.insert("S", 100.0);

        let result = estimate_capacity_factor(&series, &capacity, TargetFuel::Solar).unwrap();
        assert!(result.eastern_substituted);
        assert_eq!(result.regional.get(Region::East), Some(&[0.4, 0.2][..]));
    }

    #[test]
    fn wind_east_is_not_substituted() {
        let mut series = HourlyGenerationSeries::new();
        series.insert(SeriesKey::new(Region::Central, "風力", "C"), vec![20.0]).unwrap();
        series.insert(SeriesKey::new(Region::South, "風力", "S"), vec![60.0]).unwrap();
        let capacity = wind_capacity(&[("C", 100.0), ("S", 100.0)]);

        let result = estimate_capacity_factor(&series, &capacity, TargetFuel::OnshoreWind).unwrap();
        assert!(!result.eastern_substituted);
        assert!(!result.regional.contains(Region::East));
    }

    #[test]
    fn zero_generation_gives_zero_factor() {
        let mut series = HourlyGenerationSeries::new();
        series.insert(SeriesKey::new(Region::South, "太陽能", "S"), vec![0.0, 0.0]).unwrap();
        let mut capacity = CapacityInfo::new("太陽能");
        capacity.insert("S", 50.0);
        let result = estimate_capacity_factor(&series, &capacity, TargetFuel::Solar).unwrap();
        assert_eq!(result.national, vec![0.0, 0.0]);
        assert!(result.regional.iter().all(|(_, v)| v.iter().all(|x| *x >= 0.0)));
    }
}
