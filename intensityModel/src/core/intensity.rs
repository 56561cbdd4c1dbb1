use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::config::const_funcs::guarded_ratio;
use crate::config::constants::NATIONAL_LABEL;
use crate::config::fuel_type::{normalize_fuel_label, TargetFuel};
use crate::error::{EmissionError, Result};
use crate::models::generation::HourlyGenerationSeries;
use crate::models::table::{RegionalTable, Scale, ScaledSeries};
use crate::utils::logging::{self, EmissionCalcType, OperationCategory};

/// Hour indices where a zero denominator forced the intensity to 0, per
/// column label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZeroGuardReport {
    entries: BTreeMap<String, Vec<usize>>,
}

impl ZeroGuardReport {
    fn record(&mut self, column: &str, hour: usize) {
        self.entries.entry(column.to_string()).or_default().push(hour);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hours(&self, column: &str) -> &[usize] {
        self.entries.get(column).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn merge(&mut self, other: ZeroGuardReport) {
        for (column, hours) in other.entries {
            self.entries.entry(column).or_default().extend(hours);
        }
    }

    pub fn log(&self, context: &str) {
        for (column, hours) in &self.entries {
            warn!(context = context, column = %column, count = hours.len(), "Zero generation, intensity set to 0 at hours {:?}", hours);
        }
    }
}

/// Elementwise emission / generation with the zero guard.
pub(crate) fn guarded_division(
    emission: &[f64],
    generation: &[f64],
    column: &str,
    report: &mut ZeroGuardReport,
) -> Vec<f64> {
    emission
        .iter()
        .zip(generation)
        .enumerate()
        .map(|(t, (e, g))| {
            let (value, guarded) = guarded_ratio(*e, *g);
            if guarded {
                report.record(column, t);
            }
            value
        })
        .collect()
}

/// Labels excluded from the baseline: the studied fuels plus the measured
/// labels they normalize to.
pub fn studied_fuel_labels(fuels: &[TargetFuel]) -> BTreeSet<&'static str> {
    fuels
        .iter()
        .flat_map(|f| [f.capacity_label(), normalize_fuel_label(f.capacity_label())])
        .collect()
}

/// Per-region measured generation of every fuel other than the studied ones.
pub fn baseline_generation(series: &HourlyGenerationSeries, studied: &[TargetFuel]) -> Result<RegionalTable> {
    let excluded = studied_fuel_labels(studied);
    RegionalTable::from_columns(series.hours(), series.region_totals_excluding(&excluded))
}

/// Baseline plus projected target generation, restricted to the mainland
/// regions of the projection.
pub fn combine_generation(baseline: &RegionalTable, target: &RegionalTable) -> Result<RegionalTable> {
    if !baseline.is_empty() && !target.is_empty() && baseline.hours() != target.hours() {
        return Err(EmissionError::SeriesLengthMismatch {
            key: "baseline generation".to_string(),
            expected: target.hours(),
            found: baseline.hours(),
        });
    }
    let mut combined = RegionalTable::new(target.hours());
    for (region, projected) in target.iter() {
        if region.is_excluded() {
            continue;
        }
        let values = baseline
            .get_or_zeros(region)
            .iter()
            .zip(projected)
            .map(|(b, p)| b + p)
            .collect();
        combined.insert(region, values)?;
    }
    Ok(combined)
}

/// Emission intensity (g/kWh).
///
/// Regional scale divides per region present in `emission`. National scale
/// sums both tables across regions first.
pub fn emission_intensity(
    emission: &RegionalTable,
    generation: &RegionalTable,
    scale: Scale,
) -> (ScaledSeries, ZeroGuardReport) {
    let _timing = logging::start_timing("emission_intensity",
        OperationCategory::Emissions { subcategory: EmissionCalcType::Intensity });

    let mut report = ZeroGuardReport::default();
    let result = match scale {
        Scale::Regional => {
            let mut intensity = RegionalTable::new(emission.hours());
            for (region, values) in emission.iter() {
                let denominator = generation.get_or_zeros(region);
                *intensity.column_mut(region) = guarded_division(values, &denominator, region.label(), &mut report);
            }
            ScaledSeries::Regional(intensity)
        }
        Scale::National => ScaledSeries::National(guarded_division(
            &emission.sum_across_regions(),
            &generation.sum_across_regions(),
            NATIONAL_LABEL,
            &mut report,
        )),
    };
    (result, report)
}
