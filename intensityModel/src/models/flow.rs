use std::collections::{BTreeMap, HashMap};

use lazy_static::lazy_static;

use crate::config::const_funcs::{mw_to_kw, window_means};
use crate::config::constants::{CORRIDOR_TABLE, SAMPLES_PER_HOUR};
use crate::error::{EmissionError, Result};
use crate::models::region::Region;

/// Directed inter-region transfer along one named corridor.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowEdge {
    pub name: String,
    pub origin: Region,
    pub destination: Region,
    pub power_kwh: Vec<f64>,
}

impl FlowEdge {
    pub fn new(name: impl Into<String>, origin: Region, destination: Region, power_kwh: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            origin,
            destination,
            power_kwh,
        }
    }

    /// Same magnitudes in the opposite direction.
    pub fn reversed(&self) -> FlowEdge {
        FlowEdge {
            name: format!("{} (reversed)", self.name),
            origin: self.destination,
            destination: self.origin,
            power_kwh: self.power_kwh.clone(),
        }
    }

    /// Same direction with every magnitude negated.
    pub fn negated(&self) -> FlowEdge {
        FlowEdge {
            name: format!("{} (negated)", self.name),
            origin: self.origin,
            destination: self.destination,
            power_kwh: self.power_kwh.iter().map(|p| -p).collect(),
        }
    }
}

/// One native-resolution reading on a corridor, in MW.
#[derive(Debug, Clone, PartialEq)]
pub struct CorridorReading {
    pub corridor: String,
    pub power_mw: f64,
}

/// Corridor name -> (origin, destination). Static reference data.
#[derive(Debug, Clone)]
pub struct CorridorMap {
    corridors: HashMap<String, (Region, Region)>,
}

lazy_static! {
    static ref TAIWAN_CORRIDORS: CorridorMap = CorridorMap::from_table(&CORRIDOR_TABLE);
}

impl CorridorMap {
    fn from_table(table: &[(&str, &str, &str)]) -> Self {
        let corridors = table
            .iter()
            .filter_map(|(name, from, to)| {
                let origin = from.parse().ok()?;
                let destination = to.parse().ok()?;
                Some((name.to_string(), (origin, destination)))
            })
            .collect();
        Self { corridors }
    }

    /// The twelve corridors between the four mainland regions.
    pub fn taiwan() -> &'static CorridorMap {
        &TAIWAN_CORRIDORS
    }

    pub fn new(corridors: HashMap<String, (Region, Region)>) -> Self {
        Self { corridors }
    }

    pub fn resolve(&self, corridor: &str) -> Result<(Region, Region)> {
        self.corridors
            .get(corridor)
            .copied()
            .ok_or_else(|| EmissionError::UnknownCorridor(corridor.to_string()))
    }

    pub fn len(&self) -> usize {
        self.corridors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corridors.is_empty()
    }
}

/// Flow data after schema detection.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowRecords {
    ExplicitEdges(Vec<FlowEdge>),
    RawCorridorReadings(Vec<CorridorReading>),
}

impl FlowRecords {
    /// Resolve into explicit edges. Raw readings are converted MW -> kW,
    /// grouped per corridor in reading order, and averaged per hour.
    pub fn into_edges(self, corridors: &CorridorMap) -> Result<Vec<FlowEdge>> {
        match self {
            FlowRecords::ExplicitEdges(edges) => Ok(edges),
            FlowRecords::RawCorridorReadings(readings) => {
                let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
                for reading in readings {
                    grouped
                        .entry(reading.corridor)
                        .or_default()
                        .push(mw_to_kw(reading.power_mw));
                }
                grouped
                    .into_iter()
                    .map(|(name, samples)| {
                        let (origin, destination) = corridors.resolve(&name)?;
                        let hourly = window_means(&samples, SAMPLES_PER_HOUR);
                        Ok(FlowEdge::new(name, origin, destination, hourly))
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taiwan_map_has_all_corridors() {
        let map = CorridorMap::taiwan();
        assert_eq!(map.len(), 12);
        assert_eq!(map.resolve("北送中潮流").unwrap(), (Region::North, Region::Central));
        assert_eq!(map.resolve("東送南潮流").unwrap(), (Region::East, Region::South));
        assert!(map.resolve("澎湖潮流").is_err());
    }

    #[test]
    fn raw_readings_become_hourly_edges() {
        let readings = (0..12)
            .map(|i| CorridorReading {
                corridor: "南送北潮流".to_string(),
                power_mw: if i < 6 { 1.0 } else { 2.0 },
            })
            .collect();
        let edges = FlowRecords::RawCorridorReadings(readings)
            .into_edges(CorridorMap::taiwan())
            .unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].origin, Region::South);
        assert_eq!(edges[0].destination, Region::North);
        assert_eq!(edges[0].power_kwh, vec![1000.0, 2000.0]);
    }

    #[test]
    fn unknown_corridor_is_an_error() {
        let readings = vec![CorridorReading { corridor: "X".to_string(), power_mw: 1.0 }];
        let err = FlowRecords::RawCorridorReadings(readings)
            .into_edges(CorridorMap::taiwan())
            .unwrap_err();
        assert!(matches!(err, EmissionError::UnknownCorridor(_)));
    }
}
