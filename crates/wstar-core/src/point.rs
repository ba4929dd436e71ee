// crates/wstar-core/src/point.rs
//
// Azimuth point identifiers and their size classes.
//
// The numeric range of a point determines its class:
//   - Galaxy: 0 ..= 0xff
//   - Star:   0x100 ..= 0xffff
//   - Planet: 0x10000 ..= 0xffff_ffff
//
// A point's prefix (parent) is its low byte for stars and its low two bytes
// for planets. Galaxies are their own prefix.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WstarError;

/// Size class of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointSize {
    Galaxy,
    Star,
    Planet,
}

impl PointSize {
    /// The size class one level below this one, if any.
    pub fn child(&self) -> Option<PointSize> {
        match self {
            PointSize::Galaxy => Some(PointSize::Star),
            PointSize::Star => Some(PointSize::Planet),
            PointSize::Planet => None,
        }
    }
}

impl fmt::Display for PointSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointSize::Galaxy => write!(f, "galaxy"),
            PointSize::Star => write!(f, "star"),
            PointSize::Planet => write!(f, "planet"),
        }
    }
}

/// An Azimuth point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Point(pub u32);

impl Point {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// The raw 32-bit identifier.
    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn size(&self) -> PointSize {
        if self.0 < 0x100 {
            PointSize::Galaxy
        } else if self.0 < 0x1_0000 {
            PointSize::Star
        } else {
            PointSize::Planet
        }
    }

    pub fn is_star(&self) -> bool {
        self.size() == PointSize::Star
    }

    /// The point that spawns this one. Galaxies return themselves.
    pub fn prefix(&self) -> Point {
        match self.size() {
            PointSize::Galaxy => *self,
            PointSize::Star => Point(self.0 & 0xff),
            PointSize::Planet => Point(self.0 & 0xffff),
        }
    }

    /// The galaxy at the root of this point's hierarchy.
    pub fn parent_galaxy(&self) -> Point {
        Point(self.0 & 0xff)
    }
}

impl From<u32> for Point {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::LowerHex for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl FromStr for Point {
    type Err = WstarError;

    /// Accepts decimal (`256`) or hex (`0x100`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => trimmed.parse::<u32>(),
        };
        parsed
            .map(Point)
            .map_err(|e| WstarError::Parse(format!("Invalid point {:?}: {}", s, e)))
    }
}
