use std::collections::BTreeSet;

use crate::model::{RouteId, SegmentId, SystemId, WaypointId};

/// One highway within a system: the catalog fields from the system's route
/// list plus the point and segment sequences read from its waypoint file.
#[derive(Debug)]
pub struct Route {
    pub system: SystemId,
    /// Project region or subdivision the route belongs to.
    pub region: String,
    /// Route name as specified in traveler list files.
    pub route: String,
    /// Optional banner such as `Alt`, `Bus`, or `Trk`.
    pub banner: String,
    /// Optional abbreviation distinguishing multiple sections.
    pub abbrev: String,
    /// Full display name for the abbreviation.
    pub city: String,
    /// Unique identifier, equal to the waypoint file's base name.
    pub root: String,
    /// Former or alternate names that may appear in traveler lists.
    pub alt_route_names: Vec<String>,
    pub points: Vec<WaypointId>,
    pub segments: Vec<SegmentId>,
    /// Labels actually referenced by some traveler, stored upper-cased.
    pub labels_in_use: BTreeSet<String>,
    /// Alternate labels never referenced by any traveler, upper-cased with
    /// leading `+` stripped.
    pub unused_alt_labels: BTreeSet<String>,
    pub mileage: f64,
    /// Position within the owning connected route.
    pub root_order: i64,
}

impl Route {
    pub fn new(
        system: SystemId,
        region: String,
        route: String,
        banner: String,
        abbrev: String,
        city: String,
        root: String,
        alt_route_names: Vec<String>,
    ) -> Self {
        Self {
            system,
            region,
            route,
            banner,
            abbrev,
            city,
            root,
            alt_route_names,
            points: Vec::new(),
            segments: Vec::new(),
            labels_in_use: BTreeSet::new(),
            unused_alt_labels: BTreeSet::new(),
            mileage: 0.0,
            root_order: -1,
        }
    }

    /// Human-readable name including the region.
    pub fn readable_name(&self) -> String {
        format!("{} {}{}{}", self.region, self.route, self.banner, self.abbrev)
    }

    /// Name in the form expected in traveler list files.
    pub fn list_entry_name(&self) -> String {
        format!("{}{}{}", self.route, self.banner, self.abbrev)
    }

    /// Name as often encountered in intersecting-route labels, where the
    /// abbreviation is usually omitted.
    pub fn name_no_abbrev(&self) -> String {
        format!("{}{}", self.route, self.banner)
    }
}

/// One or more routes stitched into a single logical highway, as defined by a
/// line of a system's `_con.csv` file.
#[derive(Debug)]
pub struct ConnectedRoute {
    pub system: SystemId,
    pub route: String,
    pub banner: String,
    pub groupname: String,
    /// Member routes, in order; never empty after a successful parse.
    pub roots: Vec<RouteId>,
    pub mileage: f64,
}

impl ConnectedRoute {
    pub fn readable_name(&self) -> String {
        let mut name = format!("{}{}", self.route, self.banner);
        if !self.groupname.is_empty() {
            name.push_str(&format!(" ({})", self.groupname));
        }
        name
    }
}
