use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::readings_loader::NumberOrString;
use super::reference_loader::read_to_string_without_bom;
use crate::error::{EmissionError, Result};
use crate::models::flow::{CorridorMap, CorridorReading, FlowEdge, FlowRecords};
use crate::models::region::Region;
use crate::utils::logging::{self, FileIOType, OperationCategory};

/// Legacy layout: corridor name -> explicit edge.
#[derive(Debug, Deserialize)]
struct ExplicitEdgeEntry {
    from_: String,
    to: String,
    #[serde(rename = "powerkWh")]
    power_kwh: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct RawFlowFile {
    records: RawFlowRecords,
}

#[derive(Debug, Deserialize)]
struct RawFlowRecords {
    #[serde(rename = "FLOW_P")]
    flow_p: Vec<RawFlowReading>,
}

#[derive(Debug, Deserialize)]
struct RawFlowReading {
    #[serde(rename = "UNIT_NAME")]
    unit_name: String,
    #[serde(rename = "P")]
    p: NumberOrString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowSchema {
    Explicit,
    RawCorridor,
}

impl FlowSchema {
    fn name(&self) -> &'static str {
        match self {
            FlowSchema::Explicit => "explicit",
            FlowSchema::RawCorridor => "raw corridor",
        }
    }

    fn other(&self) -> FlowSchema {
        match self {
            FlowSchema::Explicit => FlowSchema::RawCorridor,
            FlowSchema::RawCorridor => FlowSchema::Explicit,
        }
    }
}

/// Raw exports wrap readings under a top-level `records` key.
pub fn detect_schema(value: &Value) -> FlowSchema {
    match value.get("records") {
        Some(_) => FlowSchema::RawCorridor,
        None => FlowSchema::Explicit,
    }
}

fn parse_explicit(value: &Value) -> Result<FlowRecords> {
    let entries: BTreeMap<String, ExplicitEdgeEntry> = serde_json::from_value(value.clone())?;
    let edges = entries
        .into_iter()
        .map(|(name, entry)| {
            let origin: Region = entry.from_.parse()?;
            let destination: Region = entry.to.parse()?;
            Ok(FlowEdge::new(name, origin, destination, entry.power_kwh))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(FlowRecords::ExplicitEdges(edges))
}

fn parse_raw(value: &Value) -> Result<FlowRecords> {
    let raw: RawFlowFile = serde_json::from_value(value.clone())?;
    let readings = raw
        .records
        .flow_p
        .into_iter()
        .map(|r| {
            let power_mw = r.p.to_f64(&r.unit_name)?;
            Ok(CorridorReading {
                corridor: r.unit_name,
                power_mw,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(FlowRecords::RawCorridorReadings(readings))
}

fn parse_as(schema: FlowSchema, value: &Value, corridors: &CorridorMap) -> Result<Vec<FlowEdge>> {
    let records = match schema {
        FlowSchema::Explicit => parse_explicit(value)?,
        FlowSchema::RawCorridor => parse_raw(value)?,
    };
    records.into_edges(corridors)
}

/// Parse flow data into explicit edges.
///
/// The detected schema is tried first. If it fails, the other schema is
/// tried exactly once; if that fails too the first error is returned.
pub fn parse_flow_edges(value: &Value, corridors: &CorridorMap) -> Result<Vec<FlowEdge>> {
    let schema = detect_schema(value);
    match parse_as(schema, value, corridors) {
        Ok(edges) => Ok(edges),
        Err(original) => {
            warn!(schema = schema.name(), error = %original, "Flow data does not match detected schema");
            let fallback = schema.other();
            match parse_as(fallback, value, corridors) {
                Ok(edges) => {
                    info!(schema = fallback.name(), "Flow data parsed with fallback schema");
                    Ok(edges)
                }
                Err(_) => Err(EmissionError::FlowSchema {
                    schema: schema.name(),
                    reason: original.to_string(),
                }),
            }
        }
    }
}

pub fn load_flow_edges(path: &Path, corridors: &CorridorMap) -> Result<Vec<FlowEdge>> {
    let _timing = logging::start_timing("load_flow_edges",
        OperationCategory::FileIO { subcategory: FileIOType::DataLoad });
    let contents = read_to_string_without_bom(path)?;
    let value: Value = serde_json::from_str(&contents)?;
    parse_flow_edges(&value, corridors)
}
