use tracing::{debug, warn};

use crate::config::constants::NATIONAL_LABEL;
use crate::core::intensity::{guarded_division, ZeroGuardReport};
use crate::error::{EmissionError, Result};
use crate::models::flow::FlowEdge;
use crate::models::table::{IntensityTable, RegionalTable};
use crate::utils::logging::{self, OperationCategory};

/// Post-flow generation, emission mass and intensities.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowAdjustment {
    pub generation: RegionalTable,
    pub emission: RegionalTable,
    pub intensity: IntensityTable,
    pub zero_guard: ZeroGuardReport,
}

/// Move generation and emission mass along every edge.
///
/// Works on copies of the caller's tables. Each edge adds its power to the
/// destination and removes it from the origin; the emission mass carried is
/// the power times the origin's pre-flow intensity. Regions named by an edge
/// but missing from a table start from zero.
pub fn redistribute(
    generation: &RegionalTable,
    emission: &RegionalTable,
    edges: &[FlowEdge],
    pre_flow_intensity: &RegionalTable,
) -> Result<(RegionalTable, RegionalTable)> {
    let hours = generation.hours();
    let mut generation = generation.clone();
    let mut emission = if emission.is_empty() {
        RegionalTable::new(hours)
    } else {
        emission.clone()
    };
    if emission.hours() != hours {
        return Err(EmissionError::SeriesLengthMismatch {
            key: "emission".to_string(),
            expected: hours,
            found: emission.hours(),
        });
    }

    for edge in edges {
        if edge.power_kwh.len() != hours {
            return Err(EmissionError::SeriesLengthMismatch {
                key: edge.name.clone(),
                expected: hours,
                found: edge.power_kwh.len(),
            });
        }
        if !pre_flow_intensity.contains(edge.origin) {
            debug!(edge = %edge.name, origin = %edge.origin, "No pre-flow intensity for origin, exported mass is 0");
        }
        let origin_intensity = pre_flow_intensity.get_or_zeros(edge.origin);
        let carried: Vec<f64> = edge
            .power_kwh
            .iter()
            .zip(&origin_intensity)
            .map(|(p, i)| p * i)
            .collect();

        shift(&mut generation, edge, &edge.power_kwh);
        shift(&mut emission, edge, &carried);
    }

    Ok((generation, emission))
}

fn shift(table: &mut RegionalTable, edge: &FlowEdge, amounts: &[f64]) {
    for (acc, a) in table.column_mut(edge.destination).iter_mut().zip(amounts) {
        *acc += a;
    }
    for (acc, a) in table.column_mut(edge.origin).iter_mut().zip(amounts) {
        *acc -= a;
    }
}

/// Redistribute along `edges` and recompute intensities.
///
/// Regional intensities cover mainland regions only. The national column
/// divides total post-flow emission by total post-flow generation.
pub fn adjust_for_flow(
    generation: &RegionalTable,
    edges: &[FlowEdge],
    pre_flow_intensity: &RegionalTable,
    emission: &RegionalTable,
) -> Result<FlowAdjustment> {
    let _timing = logging::start_timing("adjust_for_flow", OperationCategory::PowerFlow);

    let (generation, emission) = redistribute(generation, emission, edges, pre_flow_intensity)?;

    let mut zero_guard = ZeroGuardReport::default();
    let mut regional = RegionalTable::new(generation.hours());
    for (region, values) in emission.iter() {
        if region.is_excluded() {
            continue;
        }
        let denominator = generation.get_or_zeros(region);
        *regional.column_mut(region) = guarded_division(values, &denominator, region.label(), &mut zero_guard);
    }
    let national = guarded_division(
        &emission.sum_across_regions(),
        &generation.sum_across_regions(),
        NATIONAL_LABEL,
        &mut zero_guard,
    );

    if regional.iter().any(|(_, values)| values.iter().any(|v| *v < 0.0)) {
        warn!("Negative post-flow intensity, a region exports more than it generates");
    }
    debug!(edges = edges.len(), "Applied power flow");

    Ok(FlowAdjustment {
        generation,
        emission,
        intensity: IntensityTable { regional, national },
        zero_guard,
    })
}
