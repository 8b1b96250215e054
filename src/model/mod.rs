//! Arena-backed data model for one run of the correlation engine.
//!
//! Systems own routes, routes own waypoints and segments, but all references
//! between entities are typed indices into the [`Network`] arenas. Colocation
//! and concurrency groups are shared id lists held in side arenas, so no
//! entity ever owns another through a cycle.

mod route;
mod system;
mod traveler;
mod waypoint;

pub use route::{ConnectedRoute, Route};
pub use system::{HighwaySystem, SystemLevel};
pub use traveler::Traveler;
pub use waypoint::{Segment, Waypoint};

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        pub struct $name(pub usize);
    };
}

arena_id!(SystemId);
arena_id!(RouteId);
arena_id!(WaypointId);
arena_id!(SegmentId);
arena_id!(ColocationId);
arena_id!(ConcurrencyId);
arena_id!(TravelerId);

/// All highway data read in one run.
#[derive(Default)]
pub struct Network {
    pub systems: Vec<HighwaySystem>,
    pub routes: Vec<Route>,
    pub waypoints: Vec<Waypoint>,
    pub segments: Vec<Segment>,
    /// Groups of waypoints sharing exact coordinates, each sorted by
    /// `root@label` once reading completes.
    pub colocations: Vec<Vec<WaypointId>>,
    /// Groups of segments sharing pavement via colocated endpoints.
    pub concurrencies: Vec<Vec<SegmentId>>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system(&self, id: SystemId) -> &HighwaySystem {
        &self.systems[id.0]
    }

    pub fn system_mut(&mut self, id: SystemId) -> &mut HighwaySystem {
        &mut self.systems[id.0]
    }

    pub fn route(&self, id: RouteId) -> &Route {
        &self.routes[id.0]
    }

    pub fn route_mut(&mut self, id: RouteId) -> &mut Route {
        &mut self.routes[id.0]
    }

    pub fn wp(&self, id: WaypointId) -> &Waypoint {
        &self.waypoints[id.0]
    }

    pub fn wp_mut(&mut self, id: WaypointId) -> &mut Waypoint {
        &mut self.waypoints[id.0]
    }

    pub fn seg(&self, id: SegmentId) -> &Segment {
        &self.segments[id.0]
    }

    pub fn seg_mut(&mut self, id: SegmentId) -> &mut Segment {
        &mut self.segments[id.0]
    }

    /// System owning the given route.
    pub fn route_system(&self, id: RouteId) -> &HighwaySystem {
        self.system(self.route(id).system)
    }

    /// Sort key used for quadtree buckets, colocation groups, and near-miss
    /// partner ordering.
    pub fn waypoint_key(&self, id: WaypointId) -> String {
        let w = self.wp(id);
        format!("{}@{}", self.route(w.route).root, w.label)
    }

    /// Long display form of a waypoint, as used in the near-miss logs.
    pub fn waypoint_str(&self, id: WaypointId) -> String {
        let w = self.wp(id);
        let mut s = format!("{} {}", self.route(w.route).root, w.label);
        if !w.alt_labels.is_empty() {
            s.push_str(&format!(" [alt: {:?}]", w.alt_labels));
        }
        s.push_str(&format!(" ({},{})", w.lat, w.lng));
        s
    }

    /// Display form of a segment: readable route name plus endpoint labels.
    pub fn segment_str(&self, id: SegmentId) -> String {
        let s = self.seg(id);
        format!(
            "{} {} {}",
            self.route(s.route).readable_name(),
            self.wp(s.waypoint1).label,
            self.wp(s.waypoint2).label
        )
    }

    /// Segment of `route` whose endpoints are `{w1, w2}` in either order.
    pub fn find_segment_by_waypoints(
        &self,
        route: RouteId,
        w1: WaypointId,
        w2: WaypointId,
    ) -> Option<SegmentId> {
        self.route(route)
            .segments
            .iter()
            .copied()
            .find(|&sid| {
                let s = self.seg(sid);
                s.waypoint1 == w1 && s.waypoint2 == w2
                    || s.waypoint1 == w2 && s.waypoint2 == w1
            })
    }

    /// Segment length in miles.
    pub fn segment_length(&self, id: SegmentId) -> f64 {
        let s = self.seg(id);
        let a = self.wp(s.waypoint1);
        let b = self.wp(s.waypoint2);
        crate::geo::distance_miles(a.lat, a.lng, b.lat, b.lng)
    }

    /// Number of waypoints colocated with `id`, counting itself.
    pub fn num_colocated(&self, id: WaypointId) -> usize {
        match self.wp(id).colocated {
            Some(c) => self.colocations[c.0].len(),
            None => 1,
        }
    }

    /// True when the waypoint's own route, or any colocated waypoint's route,
    /// belongs to an active or preview system.
    pub fn on_active_or_preview(&self, id: WaypointId) -> bool {
        if self.route_system(self.wp(id).route).active_or_preview() {
            return true;
        }
        if let Some(c) = self.wp(id).colocated {
            for &other in &self.colocations[c.0] {
                if self.route_system(self.wp(other).route).active_or_preview() {
                    return true;
                }
            }
        }
        false
    }

    /// Mileage of `route` clinched by traveler `t`.
    pub fn clinched_by_traveler(&self, route: RouteId, t: TravelerId) -> f64 {
        self.route(route)
            .segments
            .iter()
            .filter(|&&sid| self.seg(sid).clinched_by.contains(&t))
            .map(|&sid| self.segment_length(sid))
            .sum()
    }
}
