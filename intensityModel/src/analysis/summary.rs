use std::collections::BTreeMap;

use chrono::Timelike;

use crate::config::const_funcs::mean;
use crate::core::pipeline::PeriodResult;
use crate::error::Result;
use crate::models::emission_factor::Pollutant;
use crate::models::region::Region;
use crate::models::table::{HourIndex, RegionalTable};

pub const HOURS_PER_DAY: usize = 24;

/// Column means of one period's post-flow intensity tables.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSummary {
    pub label: String,
    pub means: BTreeMap<Pollutant, Vec<(String, f64)>>,
}

impl PeriodSummary {
    pub fn column_mean(&self, pollutant: Pollutant, column: &str) -> Option<f64> {
        self.means
            .get(&pollutant)?
            .iter()
            .find(|(label, _)| label == column)
            .map(|(_, value)| *value)
    }
}

/// Mean of each column across periods, plus the national average of those
/// means.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnualSummary {
    pub periods: usize,
    pub means: BTreeMap<Pollutant, Vec<(String, f64)>>,
    pub national_average: BTreeMap<Pollutant, f64>,
}

impl AnnualSummary {
    pub fn column_mean(&self, pollutant: Pollutant, column: &str) -> Option<f64> {
        self.means
            .get(&pollutant)?
            .iter()
            .find(|(label, _)| label == column)
            .map(|(_, value)| *value)
    }
}

pub fn summarize_period(result: &PeriodResult) -> PeriodSummary {
    PeriodSummary {
        label: result.label.clone(),
        means: result
            .pollutants
            .iter()
            .map(|(pollutant, r)| (*pollutant, r.post_flow.intensity.column_means()))
            .collect(),
    }
}

/// Average every column over the periods that report it. Column order
/// follows first appearance.
pub fn annual_summary(periods: &[PeriodSummary]) -> AnnualSummary {
    let mut summary = AnnualSummary {
        periods: periods.len(),
        ..AnnualSummary::default()
    };

    for pollutant in Pollutant::ALL {
        let mut order: Vec<String> = Vec::new();
        let mut values: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for period in periods {
            let Some(means) = period.means.get(&pollutant) else {
                continue;
            };
            for (label, value) in means {
                if !values.contains_key(label) {
                    order.push(label.clone());
                }
                values.entry(label.clone()).or_default().push(*value);
            }
        }
        if order.is_empty() {
            continue;
        }

        let columns: Vec<(String, f64)> = order
            .into_iter()
            .filter_map(|label| {
                let value = mean(values.get(&label)?)?;
                Some((label, value))
            })
            .collect();
        if let Some(average) = national_average(&columns) {
            summary.national_average.insert(pollutant, average);
        }
        summary.means.insert(pollutant, columns);
    }
    summary
}

/// Mean over every numeric column, the national column included.
pub fn national_average(columns: &[(String, f64)]) -> Option<f64> {
    let values: Vec<f64> = columns.iter().map(|(_, v)| *v).filter(|v| v.is_finite()).collect();
    mean(&values)
}

/// Mean value by hour of day (0-23) for every region column.
pub fn diurnal_profile(table: &RegionalTable, index: &HourIndex) -> Result<BTreeMap<Region, [f64; HOURS_PER_DAY]>> {
    index.check_len(table.hours())?;

    let hours_of_day: Vec<usize> = index.iter().map(|stamp| stamp.hour() as usize).collect();
    let mut profiles = BTreeMap::new();
    for (region, values) in table.iter() {
        let mut sums = [0.0; HOURS_PER_DAY];
        let mut counts = [0usize; HOURS_PER_DAY];
        for (hour, value) in hours_of_day.iter().zip(values) {
            sums[*hour] += value;
            counts[*hour] += 1;
        }
        let mut profile = [0.0; HOURS_PER_DAY];
        for hour in 0..HOURS_PER_DAY {
            if counts[hour] > 0 {
                profile[hour] = sums[hour] / counts[hour] as f64;
            }
        }
        profiles.insert(region, profile);
    }
    Ok(profiles)
}
