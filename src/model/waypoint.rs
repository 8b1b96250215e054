use std::collections::BTreeSet;

use crate::model::{ColocationId, ConcurrencyId, RouteId, TravelerId, WaypointId};

/// A single named point from a route's waypoint file.
#[derive(Debug)]
pub struct Waypoint {
    /// Primary label; a leading `+` marks the point hidden.
    pub label: String,
    /// Alternate labels, in file order.
    pub alt_labels: Vec<String>,
    pub lat: f64,
    pub lng: f64,
    pub route: RouteId,
    /// Colocation group this point belongs to, if any other point shares its
    /// exact coordinates.
    pub colocated: Option<ColocationId>,
    /// Points within the near-miss tolerance but not exactly colocated.
    pub near_miss_points: Vec<WaypointId>,
}

impl Waypoint {
    pub fn is_hidden(&self) -> bool {
        self.label.starts_with('+')
    }

    /// Exact coordinate equality, the identity test for colocation.
    pub fn same_coords(&self, other: &Waypoint) -> bool {
        self.lat == other.lat && self.lng == other.lng
    }

    /// Within `tolerance` degrees of `other` on each axis independently.
    pub fn nearby(&self, other: &Waypoint, tolerance: f64) -> bool {
        (self.lat - other.lat).abs() < tolerance
            && (self.lng - other.lng).abs() < tolerance
    }
}

/// The connection between two consecutive waypoints of one route.
#[derive(Debug)]
pub struct Segment {
    pub waypoint1: WaypointId,
    pub waypoint2: WaypointId,
    pub route: RouteId,
    /// Concurrency group shared with segments of other routes whose endpoints
    /// are pairwise colocated with this one's.
    pub concurrent: Option<ConcurrencyId>,
    pub clinched_by: BTreeSet<TravelerId>,
}

impl Segment {
    pub fn new(waypoint1: WaypointId, waypoint2: WaypointId, route: RouteId) -> Self {
        Self {
            waypoint1,
            waypoint2,
            route,
            concurrent: None,
            clinched_by: BTreeSet::new(),
        }
    }

    /// Record `t` as having clinched this segment; false if already present.
    pub fn add_clinched_by(&mut self, t: TravelerId) -> bool {
        self.clinched_by.insert(t)
    }
}
