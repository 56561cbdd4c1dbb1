use tracing::{info, warn};

use super::summary::{AnnualSummary, PeriodSummary};
use crate::config::const_funcs::mean;
use crate::core::pipeline::PeriodResult;
use crate::models::emission_factor::Pollutant;

fn format_columns(columns: &[(String, f64)]) -> String {
    columns
        .iter()
        .map(|(label, value)| format!("{}: {:.4}", label, value))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn log_period_summary(result: &PeriodResult, summary: &PeriodSummary) {
    info!("Period {} Summary", result.label);
    info!("----------------------------------------");
    info!("Hours: {}", result.index.len());
    for fuel in &result.fuels {
        info!(
            "  {} target {} {}: mean national capacity factor {:.4} (own capacity {:.4})",
            fuel.target.fuel,
            fuel.target.capacity,
            fuel.target.unit,
            mean(&fuel.projection_factor.national).unwrap_or(0.0),
            mean(&fuel.reported_factor.national).unwrap_or(0.0),
        );
        if fuel.reported_factor.eastern_substituted {
            info!("  {} Eastern capacity factor substituted from Central and South", fuel.target.fuel);
        }
        if !fuel.reported_shares.unplaced_stations().is_empty() {
            warn!(
                "  {} stations without a region: {:?}",
                fuel.target.fuel,
                fuel.reported_shares.unplaced_stations()
            );
        }
    }
    for pollutant in Pollutant::ALL {
        if let Some(columns) = summary.means.get(&pollutant) {
            info!("  Post-flow {} (g/kWh): {}", pollutant, format_columns(columns));
        }
    }
    if !result.missing_stations.is_empty() {
        warn!("  {} units had no station entry", result.missing_stations.units().count());
    }
}

pub fn log_annual_summary(annual: &AnnualSummary) {
    info!("Annual Summary ({} periods)", annual.periods);
    info!("----------------------------------------");
    for pollutant in Pollutant::ALL {
        let Some(columns) = annual.means.get(&pollutant) else {
            continue;
        };
        info!("Annual average {} emission intensity (g/kWh): {}", pollutant, format_columns(columns));
        if let Some(average) = annual.national_average.get(&pollutant) {
            info!("Annual national average {} emission intensity (g/kWh): {:.4}", pollutant, average);
        }
    }
}
