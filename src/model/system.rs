use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::model::{ConnectedRoute, RouteId};

/// Lifecycle tier of a highway system.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SystemLevel {
    Active,
    Preview,
    Devel,
}

impl fmt::Display for SystemLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SystemLevel::Active => "active",
            SystemLevel::Preview => "preview",
            SystemLevel::Devel => "devel",
        })
    }
}

impl FromStr for SystemLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SystemLevel::Active),
            "preview" => Ok(SystemLevel::Preview),
            "devel" => Ok(SystemLevel::Devel),
            other => Err(format!("unrecognized system level: {other}")),
        }
    }
}

/// A collection of routes and connected routes sharing one designation
/// scheme, read from one line of the systems file.
#[derive(Debug)]
pub struct HighwaySystem {
    pub name: String,
    pub country: String,
    pub fullname: String,
    pub color: String,
    pub tier: i64,
    pub level: SystemLevel,
    pub routes: Vec<RouteId>,
    pub con_routes: Vec<ConnectedRoute>,
    /// Concurrency-discounted mileage within this system, per region.
    pub mileage_by_region: BTreeMap<String, f64>,
}

impl HighwaySystem {
    pub fn new(
        name: String,
        country: String,
        fullname: String,
        color: String,
        tier: i64,
        level: SystemLevel,
    ) -> Self {
        Self {
            name,
            country,
            fullname,
            color,
            tier,
            level,
            routes: Vec::new(),
            con_routes: Vec::new(),
            mileage_by_region: BTreeMap::new(),
        }
    }

    pub fn active(&self) -> bool {
        self.level == SystemLevel::Active
    }

    pub fn preview(&self) -> bool {
        self.level == SystemLevel::Preview
    }

    pub fn active_or_preview(&self) -> bool {
        self.level != SystemLevel::Devel
    }

    pub fn devel(&self) -> bool {
        self.level == SystemLevel::Devel
    }
}
