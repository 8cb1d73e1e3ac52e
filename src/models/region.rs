//! Ranked game regions.
//!
//! Ranked matches run in three regional brackets. The collector's raw
//! database stores them as integer codes; everything downstream works
//! with the closed enum so an unmapped code fails at load time instead
//! of leaking a garbled label into derived tables.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error for a region code outside the known mapping.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown region code: {0}")]
pub struct UnknownRegion(pub i64);

/// Regional bracket of a ranked match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    Asia,
    Europe,
    #[serde(rename = "North America")]
    NorthAmerica,
}

impl Region {
    /// All regions, in the collector's code order.
    pub const ALL: [Region; 3] = [Region::Asia, Region::Europe, Region::NorthAmerica];

    /// Map a raw integer code (1/2/3) to a region.
    pub fn from_code(code: i64) -> Result<Self, UnknownRegion> {
        match code {
            1 => Ok(Region::Asia),
            2 => Ok(Region::Europe),
            3 => Ok(Region::NorthAmerica),
            other => Err(UnknownRegion(other)),
        }
    }

    /// The raw integer code for this region.
    pub fn code(&self) -> i64 {
        match self {
            Region::Asia => 1,
            Region::Europe => 2,
            Region::NorthAmerica => 3,
        }
    }

    /// Display label, as used in derived tables.
    pub fn name(&self) -> &'static str {
        match self {
            Region::Asia => "Asia",
            Region::Europe => "Europe",
            Region::NorthAmerica => "North America",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
