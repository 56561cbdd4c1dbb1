use std::collections::BTreeMap;

use tracing::warn;

use crate::config::fuel_type::normalize_fuel_label;
use crate::models::reference::{CapacityInfo, StationInfo};
use crate::models::region::Region;
use crate::utils::logging::{self, CapacityCalcType, OperationCategory};

/// Each region's share of national installed capacity for one fuel.
///
/// Regions without capacity of the fuel are absent; `share` reads them as 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapacityShare {
    shares: BTreeMap<Region, f64>,
    regional_kw: BTreeMap<Region, f64>,
    national_kw: f64,
    unplaced: Vec<String>,
    other_fuel: Vec<String>,
}

impl CapacityShare {
    pub fn share(&self, region: Region) -> f64 {
        self.shares.get(&region).copied().unwrap_or(0.0)
    }

    pub fn shares(&self) -> &BTreeMap<Region, f64> {
        &self.shares
    }

    pub fn regional_kw(&self, region: Region) -> f64 {
        self.regional_kw.get(&region).copied().unwrap_or(0.0)
    }

    pub fn national_kw(&self) -> f64 {
        self.national_kw
    }

    /// Capacity stations with no station-table entry.
    pub fn unplaced_stations(&self) -> &[String] {
        &self.unplaced
    }

    /// Capacity stations whose station-table fuel is a different fuel.
    pub fn other_fuel_stations(&self) -> &[String] {
        &self.other_fuel
    }

    pub fn total(&self) -> f64 {
        self.shares.values().sum()
    }
}

pub fn allocate_capacity_shares(capacity: &CapacityInfo, stations: &StationInfo) -> CapacityShare {
    let _timing = logging::start_timing("allocate_capacity_shares",
        OperationCategory::Capacity { subcategory: CapacityCalcType::CapacityShare });

    let fuel = normalize_fuel_label(capacity.fuel());
    let mut result = CapacityShare::default();
    for (station, kw) in capacity.iter() {
        match stations.get(station) {
            Some(entry) if normalize_fuel_label(&entry.fuel) != fuel => {
                result.other_fuel.push(station.to_string());
            }
            Some(entry) => {
                *result.regional_kw.entry(entry.region).or_insert(0.0) += kw;
                result.national_kw += kw;
            }
            None => result.unplaced.push(station.to_string()),
        }
    }

    if !result.unplaced.is_empty() {
        warn!(fuel = capacity.fuel(), stations = ?result.unplaced, "Capacity stations missing from station table");
    }

    if !result.other_fuel.is_empty() {
        warn!(fuel = capacity.fuel(), stations = ?result.other_fuel, "Capacity stations listed under another fuel, skipped");
    }

    if result.national_kw > 0.0 {
        result.shares = result
            .regional_kw
            .iter()
            .filter(|(_, kw)| **kw > 0.0)
            .map(|(region, kw)| (*region, kw / result.national_kw))
            .collect();
    } else {
        warn!(fuel = capacity.fuel(), "No installed capacity found, all regional shares are 0");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::constants::SHARE_SUM_TOLERANCE;

    fn stations() -> StationInfo {
        [
            ("北A".to_string(), Region::North, "太陽能".to_string()),
            ("北B".to_string(), Region::North, "太陽能".to_string()),
            ("南A".to_string(), Region::South, "太陽能".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn shares_follow_installed_capacity() {
        let mut capacity = CapacityInfo::new("太陽能");
        capacity.insert("北A", 100.0);
        capacity.insert("北B", 200.0);
        capacity.insert("南A", 700.0);
        let shares = allocate_capacity_shares(&capacity, &stations());

        assert!((shares.share(Region::North) - 0.3).abs() < 1e-12);
        assert!((shares.share(Region::South) - 0.7).abs() < 1e-12);
        assert_eq!(shares.share(Region::East), 0.0);
        assert!(!shares.shares().contains_key(&Region::East));
        assert!((shares.total() - 1.0).abs() < SHARE_SUM_TOLERANCE);
    }

    #[test]
    fn unknown_stations_are_left_out() {
        let mut capacity = CapacityInfo::new("太陽能");
        capacity.insert("南A", 100.0);
        capacity.insert("新案場", 900.0);
        let shares = allocate_capacity_shares(&capacity, &stations());
        assert_eq!(shares.share(Region::South), 1.0);
        assert_eq!(shares.unplaced_stations(), &["新案場".to_string()]);
    }

    #[test]
    fn stations_of_another_fuel_are_skipped() {
        let stations: StationInfo = [
            ("A".to_string(), Region::North, "風力".to_string()),
            ("B".to_string(), Region::South, "太陽能".to_string()),
        ]
        .into_iter()
        .collect();
        let mut capacity = CapacityInfo::new("陸域風電");
        capacity.insert("A", 300.0);
        capacity.insert("B", 700.0);

        let shares = allocate_capacity_shares(&capacity, &stations);
        assert_eq!(shares.share(Region::North), 1.0);
        assert!(!shares.shares().contains_key(&Region::South));
        assert_eq!(shares.national_kw(), 300.0);
        assert_eq!(shares.other_fuel_stations(), &["B".to_string()]);
    }

    #[test]
    fn empty_capacity_has_no_shares() {
        let shares = allocate_capacity_shares(&CapacityInfo::new("太陽能"), &stations());
        assert!(shares.shares().is_empty());
        assert_eq!(shares.share(Region::North), 0.0);
    }
}
