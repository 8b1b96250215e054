//! Recursive quadtree over (latitude, longitude) space for efficient
//! colocation lookup and near-miss enumeration.

use crate::model::WaypointId;

/// One stored point: coordinates plus the arena id of its waypoint.
#[derive(Clone, Copy, Debug)]
pub struct QtPoint {
    pub lat: f64,
    pub lng: f64,
    pub id: WaypointId,
}

const MAX_UNIQUE_LOCATIONS: usize = 50;

// child slots, in the order they are visited by traversals
const NW: usize = 0;
const NE: usize = 1;
const SW: usize = 2;
const SE: usize = 3;

/// A quadtree node. Terminal nodes hold a bucket of points; refined nodes
/// hold exactly four children and an empty bucket. A terminal node is
/// refined once it would exceed [`MAX_UNIQUE_LOCATIONS`] distinct
/// coordinate pairs.
pub struct WaypointQuadtree {
    min_lat: f64,
    min_lng: f64,
    max_lat: f64,
    max_lng: f64,
    mid_lat: f64,
    mid_lng: f64,
    children: Option<Box<[WaypointQuadtree; 4]>>,
    points: Vec<QtPoint>,
    unique_locations: usize,
}

impl WaypointQuadtree {
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            min_lng,
            max_lat,
            max_lng,
            mid_lat: (min_lat + max_lat) / 2.0,
            mid_lng: (min_lng + max_lng) / 2.0,
            children: None,
            points: Vec::new(),
            unique_locations: 0,
        }
    }

    /// Root node spanning the whole coordinate universe.
    pub fn master() -> Self {
        Self::new(-90.0, -180.0, 90.0, 180.0)
    }

    fn is_terminal(&self) -> bool {
        self.children.is_none()
    }

    /// Which child quadrant contains (lat, lng). The test is strict `<`
    /// against both midpoints, so points on a midpoint line belong to the
    /// north / east side.
    fn child_index(&self, lat: f64, lng: f64) -> usize {
        if lat < self.mid_lat {
            if lng < self.mid_lng { SW } else { SE }
        } else if lng < self.mid_lng {
            NW
        } else {
            NE
        }
    }

    /// Split into four sub-quadrants and redistribute the bucket.
    fn refine(&mut self) {
        self.children = Some(Box::new([
            WaypointQuadtree::new(self.mid_lat, self.min_lng, self.max_lat, self.mid_lng),
            WaypointQuadtree::new(self.mid_lat, self.mid_lng, self.max_lat, self.max_lng),
            WaypointQuadtree::new(self.min_lat, self.min_lng, self.mid_lat, self.mid_lng),
            WaypointQuadtree::new(self.min_lat, self.mid_lng, self.mid_lat, self.max_lng),
        ]));
        for p in std::mem::take(&mut self.points) {
            self.insert(p);
        }
    }

    pub fn insert(&mut self, p: QtPoint) {
        let idx = self.child_index(p.lat, p.lng);
        if let Some(children) = self.children.as_mut() {
            children[idx].insert(p);
            return;
        }
        if self.point_at_same_coords(p.lat, p.lng).is_none() {
            self.unique_locations += 1;
        }
        self.points.push(p);
        if self.unique_locations > MAX_UNIQUE_LOCATIONS {
            self.refine();
        }
    }

    /// Find an already-stored point at exactly the given coordinates.
    pub fn point_at_same_coords(&self, lat: f64, lng: f64) -> Option<WaypointId> {
        match &self.children {
            None => self
                .points
                .iter()
                .find(|p| p.lat == lat && p.lng == lng)
                .map(|p| p.id),
            Some(children) => children[self.child_index(lat, lng)]
                .point_at_same_coords(lat, lng),
        }
    }

    /// All stored points within `tolerance` degrees on each axis of
    /// (lat, lng), excluding any point at exactly those coordinates.
    pub fn near_miss_points(&self, lat: f64, lng: f64, tolerance: f64) -> Vec<WaypointId> {
        let mut found = Vec::new();
        self.collect_near_misses(lat, lng, tolerance, &mut found);
        found
    }

    fn collect_near_misses(
        &self,
        lat: f64,
        lng: f64,
        tolerance: f64,
        found: &mut Vec<WaypointId>,
    ) {
        match &self.children {
            None => {
                for p in &self.points {
                    if (p.lat != lat || p.lng != lng)
                        && (p.lat - lat).abs() < tolerance
                        && (p.lng - lng).abs() < tolerance
                    {
                        found.push(p.id);
                    }
                }
            }
            Some(children) => {
                let look_north = lat + tolerance >= self.mid_lat;
                let look_south = lat - tolerance <= self.mid_lat;
                let look_east = lng + tolerance >= self.mid_lng;
                let look_west = lng - tolerance <= self.mid_lng;
                if look_north && look_west {
                    children[NW].collect_near_misses(lat, lng, tolerance, found);
                }
                if look_north && look_east {
                    children[NE].collect_near_misses(lat, lng, tolerance, found);
                }
                if look_south && look_west {
                    children[SW].collect_near_misses(lat, lng, tolerance, found);
                }
                if look_south && look_east {
                    children[SE].collect_near_misses(lat, lng, tolerance, found);
                }
            }
        }
    }

    /// Number of points stored in the tree (a multiset count, not unique
    /// coordinate pairs).
    pub fn size(&self) -> usize {
        match &self.children {
            None => self.points.len(),
            Some(children) => children.iter().map(|c| c.size()).sum(),
        }
    }

    /// Total node count including refined interior nodes.
    pub fn total_nodes(&self) -> usize {
        match &self.children {
            None => 1,
            Some(children) => 1 + children.iter().map(|c| c.total_nodes()).sum::<usize>(),
        }
    }

    /// Every stored point, bucket by bucket.
    pub fn point_list(&self) -> Vec<WaypointId> {
        let mut out = Vec::new();
        self.collect_points(&mut out);
        out
    }

    fn collect_points(&self, out: &mut Vec<WaypointId>) {
        match &self.children {
            None => out.extend(self.points.iter().map(|p| p.id)),
            Some(children) => {
                children[NE].collect_points(out);
                children[NW].collect_points(out);
                children[SE].collect_points(out);
                children[SW].collect_points(out);
            }
        }
    }

    /// Order every terminal bucket by the given key so downstream traversals
    /// are deterministic.
    pub fn sort_points<F>(&mut self, key: &F)
    where
        F: Fn(WaypointId) -> String,
    {
        match &mut self.children {
            None => self.points.sort_by_key(|p| key(p.id)),
            Some(children) => {
                for c in children.iter_mut() {
                    c.sort_points(key);
                }
            }
        }
    }

    /// Structural invariant check: refined nodes have all four children and
    /// an empty bucket; terminal nodes have no children and at most the
    /// refinement threshold of unique locations.
    pub fn is_valid(&self) -> bool {
        match &self.children {
            Some(children) => {
                self.points.is_empty() && children.iter().all(|c| c.is_valid())
            }
            None => self.unique_locations <= MAX_UNIQUE_LOCATIONS,
        }
    }
}

impl Default for WaypointQuadtree {
    fn default() -> Self {
        Self::master()
    }
}
