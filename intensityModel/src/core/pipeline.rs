use std::collections::BTreeMap;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::info;

use crate::config::fuel_type::TargetFuel;
use crate::config::run_config::{PeriodConfig, RunConfig};
use crate::core::capacity_factor::{estimate_capacity_factor, CapacityFactorResult};
use crate::core::capacity_percentage::{allocate_capacity_shares, CapacityShare};
use crate::core::emission_factors::{build_emission_factors, EmissionFactorOptions};
use crate::core::intensity::{baseline_generation, combine_generation, emission_intensity, ZeroGuardReport};
use crate::core::power_flow::{adjust_for_flow, FlowAdjustment};
use crate::core::regional_emissions::aggregate_regional_emissions;
use crate::core::target_generation::{project_target_generation, TargetCapacity};
use crate::data::emission_sources::{load_generation_info, load_plant_sources};
use crate::data::flow_loader::load_flow_edges;
use crate::data::readings_loader::{build_hourly_series, load_generation_readings, MissingStationReport};
use crate::data::reference_loader::{load_capacity_info, load_station_info};
use crate::error::{EmissionError, Result};
use crate::models::emission_factor::{EmissionFactorTable, Pollutant};
use crate::models::flow::{CorridorMap, FlowEdge};
use crate::models::generation::HourlyGenerationSeries;
use crate::models::reference::{CapacityInfo, StationInfo};
use crate::models::table::{HourIndex, IntensityTable, RegionalTable, Scale, ScaledSeries};
use crate::utils::logging::{self, OperationCategory};

/// Reference data shared by every period of a run.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub stations: StationInfo,
    pub capacities: BTreeMap<TargetFuel, CapacityInfo>,
    pub factors: EmissionFactorTable,
}

impl ReferenceData {
    pub fn new(
        stations: StationInfo,
        capacities: BTreeMap<TargetFuel, CapacityInfo>,
        factors: EmissionFactorTable,
    ) -> Self {
        Self { stations, capacities, factors }
    }

    pub fn load(config: &RunConfig) -> anyhow::Result<Self> {
        let station_path = config.data_path(&config.station_file);
        let stations = load_station_info(&station_path)
            .with_context(|| format!("loading station table {}", station_path.display()))?;

        let capacity_path = config.data_path(&config.capacity_file);
        let mut capacities = BTreeMap::new();
        for fuel in config.capacity_fuels() {
            let capacity = load_capacity_info(&capacity_path, fuel.capacity_label())
                .with_context(|| format!("loading {} capacity from {}", fuel, capacity_path.display()))?;
            capacities.insert(fuel, capacity);
        }

        let generation_path = config.data_path(&config.plant_generation_file);
        let pollutant_path = config.data_path(&config.pollutant_file);
        let sources = load_plant_sources(&generation_path, &pollutant_path)
            .with_context(|| format!("loading plant sources {} / {}", generation_path.display(), pollutant_path.display()))?;

        let generation_info = match &config.generation_info_file {
            Some(file) => {
                let path = config.data_path(file);
                Some(load_generation_info(&path).with_context(|| format!("loading generation info {}", path.display()))?)
            }
            None => None,
        };

        let factors = build_emission_factors(
            &sources,
            generation_info.as_deref(),
            &EmissionFactorOptions { legacy_taxonomy: config.legacy_fuel_taxonomy },
        );

        info!(stations = stations.len(), plants = factors.len(), "Reference data loaded");
        Ok(Self::new(stations, capacities, factors))
    }

    pub fn capacity(&self, fuel: TargetFuel) -> Result<&CapacityInfo> {
        self.capacities
            .get(&fuel)
            .ok_or_else(|| EmissionError::UnknownFuel(fuel.capacity_label().to_string()))
    }
}

/// Everything one period needs, already loaded.
pub struct PeriodInputs<'a> {
    pub label: &'a str,
    pub index: &'a HourIndex,
    pub series: &'a HourlyGenerationSeries,
    pub reference: &'a ReferenceData,
    pub targets: &'a [TargetCapacity],
    pub edges: &'a [FlowEdge],
    pub scale: Scale,
    pub parallel: bool,
}

/// Projection of one target fuel, with the fuel's own capacity factor and
/// shares kept for reporting.
#[derive(Debug, Clone)]
pub struct FuelProjection {
    pub target: TargetCapacity,
    pub projected: RegionalTable,
    pub projection_factor: CapacityFactorResult,
    pub reported_factor: CapacityFactorResult,
    pub reported_shares: CapacityShare,
}

#[derive(Debug, Clone)]
pub struct PollutantResult {
    pub pollutant: Pollutant,
    pub emission: RegionalTable,
    pub pre_flow: IntensityTable,
    pub pre_flow_zero_guard: ZeroGuardReport,
    pub post_flow: FlowAdjustment,
}

impl PollutantResult {
    pub fn pre_flow_for(&self, scale: Scale) -> ScaledSeries {
        match scale {
            Scale::Regional => ScaledSeries::Regional(self.pre_flow.regional.clone()),
            Scale::National => ScaledSeries::National(self.pre_flow.national.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PeriodResult {
    pub label: String,
    pub index: HourIndex,
    pub scale: Scale,
    pub fuels: Vec<FuelProjection>,
    pub projected: RegionalTable,
    pub generation: RegionalTable,
    pub pollutants: BTreeMap<Pollutant, PollutantResult>,
    pub missing_stations: MissingStationReport,
}

impl PeriodResult {
    pub fn pollutant(&self, pollutant: Pollutant) -> Option<&PollutantResult> {
        self.pollutants.get(&pollutant)
    }
}

fn project_fuel(inputs: &PeriodInputs, target: &TargetCapacity) -> Result<FuelProjection> {
    let stations = &inputs.reference.stations;
    let proxy = target.fuel.projection_proxy();

    let proxy_capacity = inputs.reference.capacity(proxy)?;
    let projection_factor = estimate_capacity_factor(inputs.series, proxy_capacity, proxy)?;
    let projection_shares = allocate_capacity_shares(proxy_capacity, stations);
    let projected = project_target_generation(&projection_factor.regional, target, &projection_shares);

    let (reported_factor, reported_shares) = if proxy == target.fuel {
        (projection_factor.clone(), projection_shares)
    } else {
        let own = inputs.reference.capacity(target.fuel)?;
        (estimate_capacity_factor(inputs.series, own, target.fuel)?, allocate_capacity_shares(own, stations))
    };

    let national_mean = crate::config::const_funcs::mean(&projection_factor.national).unwrap_or(0.0);
    info!(
        period = inputs.label,
        fuel = %target.fuel,
        national_capacity_factor = national_mean,
        projected_kwh = projected.sum_across_regions().iter().sum::<f64>(),
        "Projected target generation"
    );
    for (region, share) in reported_shares.shares() {
        info!(period = inputs.label, fuel = %target.fuel, region = %region, share, "Capacity share");
    }

    Ok(FuelProjection {
        target: target.clone(),
        projected,
        projection_factor,
        reported_factor,
        reported_shares,
    })
}

fn run_pollutant(
    inputs: &PeriodInputs,
    generation: &RegionalTable,
    pollutant: Pollutant,
) -> Result<PollutantResult> {
    let emission = aggregate_regional_emissions(inputs.series, &inputs.reference.factors, pollutant)?;

    let (regional, mut pre_flow_zero_guard) = emission_intensity(&emission, generation, Scale::Regional);
    let (national, national_guard) = emission_intensity(&emission, generation, Scale::National);
    pre_flow_zero_guard.merge(national_guard);
    let pre_flow = match (regional, national) {
        (ScaledSeries::Regional(regional), ScaledSeries::National(national)) => IntensityTable { regional, national },
        _ => IntensityTable::default(),
    };

    let post_flow = adjust_for_flow(generation, inputs.edges, &pre_flow.regional, &emission)?;

    let context = format!("{} {}", inputs.label, pollutant);
    pre_flow_zero_guard.log(&format!("{} pre-flow", context));
    post_flow.zero_guard.log(&format!("{} post-flow", context));

    Ok(PollutantResult {
        pollutant,
        emission,
        pre_flow,
        pre_flow_zero_guard,
        post_flow,
    })
}

/// Compute one period end to end. Any structural error fails the whole
/// period.
pub fn run_period(inputs: &PeriodInputs) -> Result<PeriodResult> {
    let _timing = logging::start_timing("run_period", OperationCategory::Pipeline);

    inputs.index.check_len(inputs.series.hours())?;

    let mut fuels = Vec::with_capacity(inputs.targets.len());
    let mut projected = RegionalTable::new(inputs.series.hours());
    for target in inputs.targets {
        let projection = project_fuel(inputs, target)?;
        projected = projected.add_zero_filled(&projection.projected)?;
        fuels.push(projection);
    }

    let studied: Vec<TargetFuel> = inputs.targets.iter().map(|t| t.fuel).collect();
    let baseline = baseline_generation(inputs.series, &studied)?;
    let generation = if projected.is_empty() {
        baseline.mainland()
    } else {
        combine_generation(&baseline, &projected)?
    };

    let results: Vec<PollutantResult> = if inputs.parallel {
        Pollutant::ALL
            .par_iter()
            .map(|p| run_pollutant(inputs, &generation, *p))
            .collect::<Result<_>>()?
    } else {
        Pollutant::ALL
            .iter()
            .map(|p| run_pollutant(inputs, &generation, *p))
            .collect::<Result<_>>()?
    };

    Ok(PeriodResult {
        label: inputs.label.to_string(),
        index: inputs.index.clone(),
        scale: inputs.scale,
        fuels,
        projected,
        generation,
        pollutants: results.into_iter().map(|r| (r.pollutant, r)).collect(),
        missing_stations: MissingStationReport::default(),
    })
}

/// Load a configured period's files and run it.
pub fn run_configured_period(
    config: &RunConfig,
    period: &PeriodConfig,
    reference: &ReferenceData,
    parallel: bool,
) -> anyhow::Result<PeriodResult> {
    let index = period
        .hour_index()
        .with_context(|| format!("period {} time range", period.label))?;

    let generation_path = config.data_path(&period.generation_file);
    let readings = load_generation_readings(&generation_path)
        .with_context(|| format!("loading generation readings {}", generation_path.display()))?;
    let (series, missing_stations) = build_hourly_series(&readings, &reference.stations)
        .with_context(|| format!("building hourly series for period {}", period.label))?;

    let flow_path = config.data_path(&period.flow_file);
    let edges = load_flow_edges(&flow_path, CorridorMap::taiwan())
        .with_context(|| format!("loading flow data {}", flow_path.display()))?;

    let inputs = PeriodInputs {
        label: &period.label,
        index: &index,
        series: &series,
        reference,
        targets: &config.targets,
        edges: &edges,
        scale: config.scale,
        parallel,
    };
    let mut result = run_period(&inputs).with_context(|| format!("computing period {}", period.label))?;
    result.missing_stations = missing_stations;
    Ok(result)
}

/// Run every configured period in order. `on_period` sees each result as
/// soon as it is ready.
pub fn run_all<F>(
    config: &RunConfig,
    reference: &ReferenceData,
    parallel: bool,
    mut on_period: F,
) -> anyhow::Result<Vec<PeriodResult>>
where
    F: FnMut(&PeriodResult) -> anyhow::Result<()>,
{
    let pb = ProgressBar::new(config.periods.len() as u64);
    pb.set_style(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?);

    let mut results = Vec::with_capacity(config.periods.len());
    for period in &config.periods {
        pb.set_message(period.label.clone());
        let result = run_configured_period(config, period, reference, parallel)?;
        on_period(&result)?;
        results.push(result);
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target_generation::CapacityUnit;
    use crate::models::emission_factor::PlantEmissionFactor;
    use crate::models::generation::SeriesKey;
    use crate::models::region::Region;

    fn reference() -> ReferenceData {
        let stations: StationInfo = [
            ("北太陽".to_string(), Region::North, "太陽能".to_string()),
            ("南太陽".to_string(), Region::South, "太陽能".to_string()),
            ("協和#1".to_string(), Region::North, "燃油".to_string()),
            ("興達#1".to_string(), Region::South, "燃煤".to_string()),
        ]
        .into_iter()
        .collect();

        let mut solar = CapacityInfo::new("太陽能");
        solar.insert("北太陽", 100.0);
        solar.insert("南太陽", 300.0);

        let mut factors = EmissionFactorTable::new();
        for (plant, fuel, co2e) in [("協和#1", "燃油", 800.0), ("興達#1", "燃煤", 1000.0)] {
            factors.insert(PlantEmissionFactor {
                plant: plant.to_string(),
                fuel: fuel.to_string(),
                net_generation_kwh: 1.0,
                sox: co2e / 1000.0,
                nox: 0.0,
                pm: 0.0,
                co2e,
            });
        }

        ReferenceData::new(stations, [(TargetFuel::Solar, solar)].into_iter().collect(), factors)
    }

    fn series() -> HourlyGenerationSeries {
        let mut series = HourlyGenerationSeries::new();
        series.insert(SeriesKey::new(Region::North, "太陽能", "北太陽"), vec![0.0, 50.0]).unwrap();
        series.insert(SeriesKey::new(Region::South, "太陽能", "南太陽"), vec![0.0, 150.0]).unwrap();
        series.insert(SeriesKey::new(Region::North, "燃油", "協和#1"), vec![100.0, 100.0]).unwrap();
        series.insert(SeriesKey::new(Region::South, "燃煤", "興達#1"), vec![200.0, 100.0]).unwrap();
        series
    }

    fn run(parallel: bool, edges: &[FlowEdge]) -> PeriodResult {
        let reference = reference();
        let series = series();
        let index = HourIndex::parse("2024-05-01 00:00:00", "2024-05-01 01:00:00").unwrap();
        let targets = [TargetCapacity::new(TargetFuel::Solar, 800.0, CapacityUnit::KW)];
        run_period(&PeriodInputs {
            label: "test",
            index: &index,
            series: &series,
            reference: &reference,
            targets: &targets,
            edges,
            scale: Scale::Regional,
            parallel,
        })
        .unwrap()
    }

    #[test]
    fn projected_solar_replaces_measured_solar() {
        let result = run(false, &[]);
        // cf 0.5 in hour 1, target 800 kW split 1:3
        assert_eq!(result.projected.get(Region::North), Some(&[0.0, 100.0][..]));
        assert_eq!(result.projected.get(Region::South), Some(&[0.0, 300.0][..]));
        assert_eq!(result.generation.get(Region::North), Some(&[100.0, 200.0][..]));
        assert_eq!(result.generation.get(Region::South), Some(&[200.0, 400.0][..]));
    }

    #[test]
    fn intensities_without_flow_match_pre_flow() {
        let result = run(false, &[]);
        let co2e = result.pollutant(Pollutant::CO2e).unwrap();
        assert_eq!(co2e.pre_flow.regional.get(Region::North), Some(&[800.0, 400.0][..]));
        assert_eq!(co2e.pre_flow.regional.get(Region::South), Some(&[1000.0, 250.0][..]));
        assert_eq!(co2e.post_flow.intensity, co2e.pre_flow);
    }

    #[test]
    fn parallel_and_sequential_runs_agree() {
        let edges = [FlowEdge::new("南送北潮流", Region::South, Region::North, vec![10.0, 20.0])];
        let sequential = run(false, &edges);
        let parallel = run(true, &edges);
        for pollutant in Pollutant::ALL {
            assert_eq!(
                sequential.pollutant(pollutant).unwrap().post_flow,
                parallel.pollutant(pollutant).unwrap().post_flow
            );
        }
    }

    #[test]
    fn index_length_must_match_series() {
        let reference = reference();
        let series = series();
        let index = HourIndex::parse("2024-05-01 00:00:00", "2024-05-01 05:00:00").unwrap();
        let err = run_period(&PeriodInputs {
            label: "bad",
            index: &index,
            series: &series,
            reference: &reference,
            targets: &[],
            edges: &[],
            scale: Scale::Regional,
            parallel: false,
        })
        .unwrap_err();
        assert!(matches!(err, EmissionError::IndexLengthMismatch { index: 6, data: 2 }));
    }

    #[test]
    fn island_solar_stays_out_of_national_intensity() {
        let stations: StationInfo = [
            ("北太陽".to_string(), Region::North, "太陽能".to_string()),
            ("澎湖太陽".to_string(), Region::Islands, "太陽能".to_string()),
            ("協和#1".to_string(), Region::North, "燃油".to_string()),
            ("尖山#1".to_string(), Region::Islands, "燃油".to_string()),
        ]
        .into_iter()
        .collect();
        let mut solar = CapacityInfo::new("太陽能");
        solar.insert("北太陽", 100.0);
        solar.insert("澎湖太陽", 100.0);
        let mut factors = EmissionFactorTable::new();
        for plant in ["協和#1", "尖山#1"] {
            factors.insert(PlantEmissionFactor {
                plant: plant.to_string(),
                fuel: "燃油".to_string(),
                net_generation_kwh: 1.0,
                sox: 0.0,
                nox: 0.0,
                pm: 0.0,
                co2e: 800.0,
            });
        }
        let reference = ReferenceData::new(stations, [(TargetFuel::Solar, solar)].into_iter().collect(), factors);

        let mut series = HourlyGenerationSeries::new();
        series.insert(SeriesKey::new(Region::North, "太陽能", "北太陽"), vec![50.0]).unwrap();
        series.insert(SeriesKey::new(Region::Islands, "太陽能", "澎湖太陽"), vec![50.0]).unwrap();
        series.insert(SeriesKey::new(Region::North, "燃油", "協和#1"), vec![100.0]).unwrap();
        series.insert(SeriesKey::new(Region::Islands, "燃油", "尖山#1"), vec![100.0]).unwrap();

        let index = HourIndex::parse("2024-05-01 00:00:00", "2024-05-01 00:00:00").unwrap();
        let targets = [TargetCapacity::new(TargetFuel::Solar, 200.0, CapacityUnit::KW)];
        let result = run_period(&PeriodInputs {
            label: "islands",
            index: &index,
            series: &series,
            reference: &reference,
            targets: &targets,
            edges: &[],
            scale: Scale::National,
            parallel: false,
        })
        .unwrap();

        assert_eq!(result.generation.regions().collect::<Vec<_>>(), vec![Region::North]);
        let co2e = result.pollutant(Pollutant::CO2e).unwrap();
        let expected = 80_000.0 / 150.0;
        assert!((co2e.pre_flow.national[0] - expected).abs() < 1e-9);
        assert!((co2e.post_flow.intensity.national[0] - expected).abs() < 1e-9);
    }
}
