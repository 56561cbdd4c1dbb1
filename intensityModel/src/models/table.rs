use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::const_funcs::mean;
use crate::config::constants::{NATIONAL_LABEL, TIMESTAMP_FORMAT};
use crate::error::{EmissionError, Result};
use crate::models::region::Region;

/// Calculation scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    #[default]
    Regional,
    National,
}

impl FromStr for Scale {
    type Err = EmissionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regional" => Ok(Scale::Regional),
            "national" => Ok(Scale::National),
            other => Err(EmissionError::UnknownScale(other.to_string())),
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scale::Regional => write!(f, "regional"),
            Scale::National => write!(f, "national"),
        }
    }
}

/// Hourly time series with one column per region. All columns share the
/// table's length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionalTable {
    hours: usize,
    columns: BTreeMap<Region, Vec<f64>>,
}

impl RegionalTable {
    pub fn new(hours: usize) -> Self {
        Self {
            hours,
            columns: BTreeMap::new(),
        }
    }

    pub fn from_columns<I>(hours: usize, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Region, Vec<f64>)>,
    {
        let mut table = Self::new(hours);
        for (region, values) in columns {
            table.insert(region, values)?;
        }
        Ok(table)
    }

    pub fn insert(&mut self, region: Region, values: Vec<f64>) -> Result<()> {
        if values.len() != self.hours {
            return Err(EmissionError::SeriesLengthMismatch {
                key: region.label().to_string(),
                expected: self.hours,
                found: values.len(),
            });
        }
        self.columns.insert(region, values);
        Ok(())
    }

    pub fn hours(&self) -> usize {
        self.hours
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, region: Region) -> bool {
        self.columns.contains_key(&region)
    }

    pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
        self.columns.keys().copied()
    }

    pub fn get(&self, region: Region) -> Option<&[f64]> {
        self.columns.get(&region).map(Vec::as_slice)
    }

    /// Column values, or zeros when the region is absent.
    pub fn get_or_zeros(&self, region: Region) -> Vec<f64> {
        self.columns
            .get(&region)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.hours])
    }

    /// Mutable column, created as zeros when absent.
    pub fn column_mut(&mut self, region: Region) -> &mut Vec<f64> {
        let hours = self.hours;
        self.columns.entry(region).or_insert_with(|| vec![0.0; hours])
    }

    pub fn remove(&mut self, region: Region) -> Option<Vec<f64>> {
        self.columns.remove(&region)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Region, &[f64])> {
        self.columns.iter().map(|(r, v)| (*r, v.as_slice()))
    }

    /// Copy with the excluded regions dropped.
    pub fn mainland(&self) -> RegionalTable {
        RegionalTable {
            hours: self.hours,
            columns: self
                .columns
                .iter()
                .filter(|(r, _)| !r.is_excluded())
                .map(|(r, v)| (*r, v.clone()))
                .collect(),
        }
    }

    /// Elementwise sum over all columns.
    pub fn sum_across_regions(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.hours];
        for values in self.columns.values() {
            for (acc, v) in total.iter_mut().zip(values) {
                *acc += v;
            }
        }
        total
    }

    /// Union of both tables' regions, adding elementwise with zero fill.
    pub fn add_zero_filled(&self, other: &RegionalTable) -> Result<RegionalTable> {
        if self.is_empty() {
            return Ok(other.clone());
        }
        if other.is_empty() {
            return Ok(self.clone());
        }
        if self.hours != other.hours {
            return Err(EmissionError::SeriesLengthMismatch {
                key: "table".to_string(),
                expected: self.hours,
                found: other.hours,
            });
        }
        let mut sum = self.clone();
        for (region, values) in other.iter() {
            for (acc, v) in sum.column_mut(region).iter_mut().zip(values) {
                *acc += v;
            }
        }
        Ok(sum)
    }

    pub fn map_values<F>(&self, f: F) -> RegionalTable
    where
        F: Fn(f64) -> f64,
    {
        RegionalTable {
            hours: self.hours,
            columns: self
                .columns
                .iter()
                .map(|(r, v)| (*r, v.iter().map(|x| f(*x)).collect()))
                .collect(),
        }
    }

    pub fn column_means(&self) -> BTreeMap<Region, f64> {
        self.columns
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(r, v)| (*r, v.iter().sum::<f64>() / v.len() as f64))
            .collect()
    }
}

/// Result of a scale-dispatched calculation.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaledSeries {
    Regional(RegionalTable),
    National(Vec<f64>),
}

impl ScaledSeries {
    pub fn hours(&self) -> usize {
        match self {
            ScaledSeries::Regional(table) => table.hours(),
            ScaledSeries::National(values) => values.len(),
        }
    }

    pub fn as_regional(&self) -> Option<&RegionalTable> {
        match self {
            ScaledSeries::Regional(table) => Some(table),
            ScaledSeries::National(_) => None,
        }
    }

    pub fn as_national(&self) -> Option<&[f64]> {
        match self {
            ScaledSeries::Regional(_) => None,
            ScaledSeries::National(values) => Some(values),
        }
    }
}

/// Mainland regional intensities plus the national aggregate column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntensityTable {
    pub regional: RegionalTable,
    pub national: Vec<f64>,
}

impl IntensityTable {
    pub fn hours(&self) -> usize {
        self.national.len()
    }

    pub fn map_values<F>(&self, f: F) -> IntensityTable
    where
        F: Fn(f64) -> f64,
    {
        IntensityTable {
            regional: self.regional.map_values(&f),
            national: self.national.iter().map(|x| f(*x)).collect(),
        }
    }

    /// Column means keyed by column label, regions first then the national
    /// column.
    pub fn column_means(&self) -> Vec<(String, f64)> {
        let mut means: Vec<(String, f64)> = self
            .regional
            .column_means()
            .into_iter()
            .map(|(region, value)| (region.label().to_string(), value))
            .collect();
        if let Some(national) = mean(&self.national) {
            means.push((NATIONAL_LABEL.to_string(), national));
        }
        means
    }
}

/// Hourly timestamps for one period, inclusive of both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct HourIndex {
    stamps: Vec<NaiveDateTime>,
}

impl HourIndex {
    pub fn hourly(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if end < start {
            return Err(EmissionError::InvalidTimeRange(format!("{} is before {}", end, start)));
        }
        let mut stamps = Vec::new();
        let mut current = start;
        while current <= end {
            stamps.push(current);
            current += Duration::hours(1);
        }
        Ok(Self { stamps })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
                .map_err(|e| EmissionError::InvalidTimeRange(format!("{}: {}", s, e)))
        };
        Self::hourly(parse(start)?, parse(end)?)
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NaiveDateTime> {
        self.stamps.iter()
    }

    /// Fails unless the index covers exactly `hours` rows.
    pub fn check_len(&self, hours: usize) -> Result<()> {
        if self.stamps.len() != hours {
            return Err(EmissionError::IndexLengthMismatch {
                index: self.stamps.len(),
                data: hours,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_zero_filled_unions_regions() {
        let a = RegionalTable::from_columns(2, [(Region::North, vec![1.0, 2.0])]).unwrap();
        let b = RegionalTable::from_columns(
            2,
            [(Region::North, vec![10.0, 10.0]), (Region::East, vec![3.0, 4.0])],
        )
        .unwrap();
        let sum = a.add_zero_filled(&b).unwrap();
        assert_eq!(sum.get(Region::North), Some(&[11.0, 12.0][..]));
        assert_eq!(sum.get(Region::East), Some(&[3.0, 4.0][..]));
    }

    #[test]
    fn insert_checks_length() {
        let mut table = RegionalTable::new(3);
        assert!(table.insert(Region::South, vec![1.0]).is_err());
    }

    #[test]
    fn mainland_drops_islands() {
        let table = RegionalTable::from_columns(
            1,
            [(Region::North, vec![1.0]), (Region::Islands, vec![2.0])],
        )
        .unwrap();
        let mainland = table.mainland();
        assert!(!mainland.contains(Region::Islands));
        assert_eq!(mainland.sum_across_regions(), vec![1.0]);
    }

    #[test]
    fn hour_index_is_inclusive() {
        let index = HourIndex::parse("2024-05-01 00:00:00", "2024-05-01 23:00:00").unwrap();
        assert_eq!(index.len(), 24);
        assert!(index.check_len(24).is_ok());
        assert!(index.check_len(23).is_err());
        assert!(HourIndex::parse("2024-05-02 00:00:00", "2024-05-01 00:00:00").is_err());
    }

    #[test]
    fn scale_parses_case_insensitively() {
        assert_eq!("National".parse::<Scale>().unwrap(), Scale::National);
        assert!("global".parse::<Scale>().is_err());
    }
}
