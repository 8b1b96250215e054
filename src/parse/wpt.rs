//! Waypoint-file reading: line and URL parsing, colocation and near-miss
//! detection against the quadtree, and segment assembly.

use std::io::Write as _;
use std::path::Path;

use crate::datacheck::{CheckInfo, DatacheckCode, DatacheckEntry};
use crate::errors::ErrorList;
use crate::model::{Network, RouteId, Segment, SegmentId, Waypoint, WaypointId};
use crate::quadtree::{QtPoint, WaypointQuadtree};

/// Tolerance in degrees, per axis, for near-miss detection.
pub const NEAR_MISS_TOLERANCE: f64 = 0.0005;

/// One parsed waypoint-file line. `coords` is `None` when the URL failed the
/// grammar, in which case the point must not join the route.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedWaypoint {
    pub label: String,
    pub alt_labels: Vec<String>,
    pub coords: Option<(f64, f64)>,
    /// The raw URL token, reported when malformed.
    pub url: String,
}

/// A coordinate substring extracted from the URL: digits, at most one
/// decimal point, and a minus sign only at the start.
fn parse_coord(s: &str) -> Option<f64> {
    let mut point_count = 0;
    for (i, c) in s.chars().enumerate() {
        match c {
            '.' => {
                point_count += 1;
                if point_count > 1 {
                    return None;
                }
            }
            '-' if i > 0 => return None,
            '-' | '0'..='9' => {}
            _ => return None,
        }
    }
    s.parse().ok()
}

/// Split a waypoint line into primary label, alternate labels, and the
/// OSM-style URL, and extract latitude and longitude from the URL's
/// `lat=`/`lon=` fields.
pub fn parse_waypoint_line(line: &str) -> ParsedWaypoint {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let label = parts[0].to_string();
    let alt_labels = if parts.len() > 2 {
        parts[1..parts.len() - 1]
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        Vec::new()
    };
    let url = parts[parts.len() - 1].to_string();

    let url_parts: Vec<&str> = url.split('=').collect();
    let coords = if url_parts.len() < 3 {
        None
    } else {
        let lat_string = url_parts[1].split('&').next().unwrap_or("");
        let lng_string = url_parts[2].split('&').next().unwrap_or("");
        match (parse_coord(lat_string), parse_coord(lng_string)) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    };

    ParsedWaypoint {
        label,
        alt_labels,
        coords,
        url,
    }
}

/// Read one route's `.wpt` file: build waypoints, cross-link colocations and
/// near-misses through the quadtree, insert every valid point, and form the
/// segment chain. Malformed URLs yield a `MALFORMED_URL` entry and the point
/// is skipped entirely.
pub fn read_route_wpt(
    net: &mut Network,
    rid: RouteId,
    tree: &mut WaypointQuadtree,
    datacheck: &mut Vec<DatacheckEntry>,
    el: &ErrorList,
    hwy_data: &Path,
) {
    let (region, system_name, root) = {
        let r = net.route(rid);
        (
            r.region.clone(),
            net.system(r.system).name.clone(),
            r.root.clone(),
        )
    };
    let path = hwy_data
        .join(&region)
        .join(&system_name)
        .join(format!("{root}.wpt"));

    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            el.add_error(format!("{}: {}", path.display(), e));
            return;
        }
    };

    let mut previous: Option<WaypointId> = None;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed = parse_waypoint_line(line);
        let Some((lat, lng)) = parsed.coords else {
            datacheck.push(DatacheckEntry::with_info(
                rid,
                vec![parsed.label],
                DatacheckCode::MalformedUrl,
                CheckInfo::Text(parsed.url),
            ));
            continue;
        };

        let wid = WaypointId(net.waypoints.len());
        for alt in &parsed.alt_labels {
            net.route_mut(rid)
                .unused_alt_labels
                .insert(alt.to_uppercase().trim_matches('+').to_string());
        }
        net.waypoints.push(Waypoint {
            label: parsed.label,
            alt_labels: parsed.alt_labels,
            lat,
            lng,
            route: rid,
            colocated: None,
            near_miss_points: Vec::new(),
        });
        net.route_mut(rid).points.push(wid);

        // colocation: an exact-coordinate match must be found before this
        // point enters the tree
        if let Some(other) = tree.point_at_same_coords(lat, lng) {
            let existing = net.wp(other).colocated;
            match existing {
                None => {
                    let group = crate::model::ColocationId(net.colocations.len());
                    net.colocations.push(vec![other, wid]);
                    net.wp_mut(other).colocated = Some(group);
                    net.wp_mut(wid).colocated = Some(group);
                }
                Some(group) => {
                    net.colocations[group.0].push(wid);
                    net.wp_mut(wid).colocated = Some(group);
                }
            }
        }

        // near-misses, likewise queried before insertion, then cross-linked
        // both ways
        let nmps = tree.near_miss_points(lat, lng, NEAR_MISS_TOLERANCE);
        for &other in &nmps {
            net.wp_mut(other).near_miss_points.push(wid);
        }
        net.wp_mut(wid).near_miss_points = nmps;

        tree.insert(QtPoint { lat, lng, id: wid });

        if let Some(prev) = previous {
            let sid = SegmentId(net.segments.len());
            net.segments.push(Segment::new(prev, wid, rid));
            net.route_mut(rid).segments.push(sid);
        }
        previous = Some(wid);
    }
}

/// Every `.wpt` file under `hwy_data`, excluding boundary-definition
/// directories. Used to report files no catalog entry refers to.
pub fn find_all_wpt_files(hwy_data: &Path) -> Vec<std::path::PathBuf> {
    let mut found = Vec::new();
    collect_wpt_files(hwy_data, &mut found);
    found
}

fn collect_wpt_files(dir: &Path, found: &mut Vec<std::path::PathBuf>) {
    if dir.to_string_lossy().contains("_boundaries") {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let mut entries: Vec<_> = entries.flatten().map(|e| e.path()).collect();
    entries.sort();
    for path in entries {
        if path.is_dir() {
            collect_wpt_files(&path, found);
        } else if path.extension().is_some_and(|e| e == "wpt") {
            found.push(path);
        }
    }
}

/// Read the waypoint files of every route in every system, reporting a fatal
/// error for any route left with fewer than two points.
pub fn read_all_wpts(
    net: &mut Network,
    tree: &mut WaypointQuadtree,
    datacheck: &mut Vec<DatacheckEntry>,
    el: &ErrorList,
    hwy_data: &Path,
    processed_files: &mut Vec<std::path::PathBuf>,
) {
    for sidx in 0..net.systems.len() {
        print!("{}", net.systems[sidx].name);
        std::io::stdout().flush().ok();
        for rid in net.systems[sidx].routes.clone() {
            {
                let r = net.route(rid);
                processed_files.push(
                    hwy_data
                        .join(&r.region)
                        .join(&net.system(r.system).name)
                        .join(format!("{}.wpt", r.root)),
                );
            }
            read_route_wpt(net, rid, tree, datacheck, el, hwy_data);
            if net.route(rid).points.len() < 2 {
                el.add_error(format!(
                    "Route contains fewer than 2 points: {} ({} total points)",
                    net.route(rid).root,
                    net.route(rid).points.len()
                ));
            }
            print!(".");
            std::io::stdout().flush().ok();
        }
        println!("!");
    }
}
