use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::constants::{CENTRAL_LABEL, EAST_LABEL, ISLANDS_LABEL, NORTH_LABEL, SOUTH_LABEL};
use crate::error::EmissionError;

/// Grid regions. `Islands` covers the offshore islands, which are never
/// attributed mainland emissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Region {
    North,
    Central,
    South,
    East,
    Islands,
}

impl Region {
    pub const ALL: [Region; 5] = [Region::North, Region::Central, Region::South, Region::East, Region::Islands];

    pub fn label(&self) -> &'static str {
        match self {
            Region::North => NORTH_LABEL,
            Region::Central => CENTRAL_LABEL,
            Region::South => SOUTH_LABEL,
            Region::East => EAST_LABEL,
            Region::Islands => ISLANDS_LABEL,
        }
    }

    pub fn english_name(&self) -> &'static str {
        match self {
            Region::North => "North",
            Region::Central => "Center",
            Region::South => "South",
            Region::East => "East",
            Region::Islands => "Island",
        }
    }

    pub fn is_excluded(&self) -> bool {
        *self == Region::Islands
    }
}

impl FromStr for Region {
    type Err = EmissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            NORTH_LABEL | "North" => Ok(Region::North),
            CENTRAL_LABEL | "Central" | "Center" => Ok(Region::Central),
            SOUTH_LABEL | "South" => Ok(Region::South),
            EAST_LABEL | "East" => Ok(Region::East),
            ISLANDS_LABEL | "Islands" | "Island" => Ok(Region::Islands),
            other => Err(EmissionError::UnknownRegion(other.to_string())),
        }
    }
}

impl TryFrom<String> for Region {
    type Error = EmissionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.label().to_string()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.english_name())
    }
}
