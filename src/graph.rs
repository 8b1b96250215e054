//! Graph model of the active/preview highway network: unique locations as
//! vertices, segments as edges labeled with their concurrent route names.
//! The master graph and the filtered subgraph families (area, region,
//! system, multi-system, multi-region, country, continent) are written in
//! the simple text format and in the collapsed format, where chains of
//! hidden points fold into edge shaping points.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::geo;
use crate::model::{Network, SegmentId, WaypointId};
use crate::quadtree::WaypointQuadtree;

#[derive(Debug, Serialize)]
pub struct GraphVertex {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// False when every waypoint at this location is hidden; such vertices
    /// collapse into edge shaping points in the collapsed format.
    pub visible: bool,
}

#[derive(Debug, Serialize)]
pub struct GraphEdge {
    pub v1: usize,
    pub v2: usize,
    pub label: String,
    /// Regions of the concurrent active/preview routes, for subgraph
    /// filtering.
    #[serde(skip)]
    regions: BTreeSet<String>,
    /// System names of the concurrent active/preview routes.
    #[serde(skip)]
    systems: BTreeSet<String>,
}

/// A named place with a radius in miles, from `areagraphs.csv`.
#[derive(Clone, Debug)]
pub struct PlaceRadius {
    pub place: String,
    pub base: String,
    pub lat: f64,
    pub lng: f64,
    pub r: f64,
}

/// Which edges a subgraph keeps. A vertex is kept when incident to a kept
/// edge.
pub enum GraphFilter<'a> {
    All,
    /// Edges touching any of these regions.
    Regions(&'a [String]),
    /// Edges touching any of these systems.
    Systems(&'a [String]),
    /// Edges with an endpoint within the place's radius.
    Place(&'a PlaceRadius),
}

/// Metadata row for the graphs database table.
#[derive(Debug)]
pub struct GraphListEntry {
    pub filename: String,
    pub descr: String,
    pub vertices: usize,
    pub edges: usize,
    pub format: String,
    pub category: String,
}

pub struct HighwayGraph {
    pub vertices: Vec<GraphVertex>,
    pub edges: Vec<GraphEdge>,
    /// Decisions made while simplifying vertex names.
    pub naming_log: Vec<String>,
}

impl HighwayGraph {
    /// Build the graph over every location that is on, or colocated with, an
    /// active or preview route. Colocated points collapse into one vertex,
    /// keyed by the lowest-sorted group member.
    pub fn build(net: &Network, tree: &WaypointQuadtree) -> Self {
        let mut naming_log = Vec::new();
        let mut vertices = Vec::new();
        let mut vertex_of: BTreeMap<WaypointId, usize> = BTreeMap::new();

        for wid in tree.point_list() {
            if !net.on_active_or_preview(wid) {
                continue;
            }
            let rep = representative(net, wid);
            if vertex_of.contains_key(&rep) {
                continue;
            }
            let name = canonical_name(net, rep, &mut naming_log);
            let w = net.wp(rep);
            vertex_of.insert(rep, vertices.len());
            vertices.push(GraphVertex {
                name,
                lat: w.lat,
                lng: w.lng,
                visible: location_visible(net, rep),
            });
        }

        let mut edges = Vec::new();
        for h in &net.systems {
            if !h.active_or_preview() {
                continue;
            }
            for &rid in &h.routes {
                for &sid in &net.route(rid).segments {
                    if !is_group_leader(net, sid) {
                        continue;
                    }
                    let s = net.seg(sid);
                    let (Some(&v1), Some(&v2)) = (
                        vertex_of.get(&representative(net, s.waypoint1)),
                        vertex_of.get(&representative(net, s.waypoint2)),
                    ) else {
                        continue;
                    };
                    if v1 == v2 {
                        // colocated endpoints collapse to one vertex
                        continue;
                    }
                    let (regions, systems) = member_sets(net, sid);
                    edges.push(GraphEdge {
                        v1,
                        v2,
                        label: segment_name(net, sid),
                        regions,
                        systems,
                    });
                }
            }
        }

        Self {
            vertices,
            edges,
            naming_log,
        }
    }

    fn edge_matches(&self, e: &GraphEdge, filter: &GraphFilter<'_>) -> bool {
        match filter {
            GraphFilter::All => true,
            GraphFilter::Regions(wanted) => {
                e.regions.iter().any(|r| wanted.contains(r))
            }
            GraphFilter::Systems(wanted) => {
                e.systems.iter().any(|s| wanted.contains(s))
            }
            GraphFilter::Place(p) => {
                let near = |v: usize| {
                    let vert = &self.vertices[v];
                    geo::distance_miles(vert.lat, vert.lng, p.lat, p.lng) <= p.r
                };
                near(e.v1) || near(e.v2)
            }
        }
    }

    fn filtered_edges(&self, filter: &GraphFilter<'_>) -> Vec<usize> {
        (0..self.edges.len())
            .filter(|&i| self.edge_matches(&self.edges[i], filter))
            .collect()
    }

    /// Write the simple text format: every kept vertex (hidden included),
    /// one edge per segment group. Returns (vertices, edges).
    pub fn write_subgraph_simple(
        &self,
        path: &Path,
        filter: &GraphFilter<'_>,
    ) -> Result<(usize, usize)> {
        let edge_idxs = self.filtered_edges(filter);
        let mut kept: BTreeSet<usize> = BTreeSet::new();
        for &ei in &edge_idxs {
            kept.insert(self.edges[ei].v1);
            kept.insert(self.edges[ei].v2);
        }
        let renumber: BTreeMap<usize, usize> = kept
            .iter()
            .enumerate()
            .map(|(new, &old)| (old, new))
            .collect();

        let mut f = BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        );
        writeln!(f, "TMG 1.0 simple")?;
        writeln!(f, "{} {}", kept.len(), edge_idxs.len())?;
        for &old in &kept {
            let v = &self.vertices[old];
            writeln!(f, "{} {} {}", v.name, v.lat, v.lng)?;
        }
        for &ei in &edge_idxs {
            let e = &self.edges[ei];
            writeln!(f, "{} {} {}", renumber[&e.v1], renumber[&e.v2], e.label)?;
        }
        f.flush()?;
        Ok((kept.len(), edge_idxs.len()))
    }

    /// Write the collapsed format: chains of hidden degree-2 vertices fold
    /// into shaping points appended to the merged edge line. Returns
    /// (vertices, edges).
    pub fn write_subgraph_collapsed(
        &self,
        path: &Path,
        filter: &GraphFilter<'_>,
    ) -> Result<(usize, usize)> {
        let edge_idxs = self.filtered_edges(filter);

        // adjacency over the filtered edge set, by position in edge_idxs
        let mut adj: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (pos, &ei) in edge_idxs.iter().enumerate() {
            adj.entry(self.edges[ei].v1).or_default().push(pos);
            adj.entry(self.edges[ei].v2).or_default().push(pos);
        }
        // a hidden vertex folds only when it joins exactly two edges
        let collapsible = |v: usize| {
            !self.vertices[v].visible && adj.get(&v).map(Vec::len) == Some(2)
        };

        let mut consumed = vec![false; edge_idxs.len()];
        let mut merged: Vec<(usize, usize, &str, Vec<(f64, f64)>)> = Vec::new();
        for (pos, &ei) in edge_idxs.iter().enumerate() {
            if consumed[pos] {
                continue;
            }
            let e = &self.edges[ei];
            if collapsible(e.v1) && collapsible(e.v2) {
                // interior of a chain, reached from one of its anchors
                continue;
            }
            let (anchor, mut cur) = if collapsible(e.v1) {
                (e.v2, e.v1)
            } else {
                (e.v1, e.v2)
            };
            consumed[pos] = true;
            let mut points = Vec::new();
            let mut prev = pos;
            while collapsible(cur) {
                points.push((self.vertices[cur].lat, self.vertices[cur].lng));
                let Some(next) = adj[&cur].iter().copied().find(|&p| p != prev) else {
                    break;
                };
                consumed[next] = true;
                let ne = &self.edges[edge_idxs[next]];
                cur = if ne.v1 == cur { ne.v2 } else { ne.v1 };
                prev = next;
            }
            merged.push((anchor, cur, e.label.as_str(), points));
        }

        let mut kept: BTreeSet<usize> = BTreeSet::new();
        for (v1, v2, _, _) in &merged {
            kept.insert(*v1);
            kept.insert(*v2);
        }
        let renumber: BTreeMap<usize, usize> = kept
            .iter()
            .enumerate()
            .map(|(new, &old)| (old, new))
            .collect();

        let mut f = BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        );
        writeln!(f, "TMG 1.0 collapsed")?;
        writeln!(f, "{} {}", kept.len(), merged.len())?;
        for &old in &kept {
            let v = &self.vertices[old];
            writeln!(f, "{} {} {}", v.name, v.lat, v.lng)?;
        }
        for (v1, v2, label, points) in &merged {
            write!(f, "{} {} {}", renumber[v1], renumber[v2], label)?;
            for (lat, lng) in points {
                write!(f, " {lat} {lng}")?;
            }
            writeln!(f)?;
        }
        f.flush()?;
        Ok((kept.len(), merged.len()))
    }

    /// Write one subgraph in both formats (`<root>-simple.tmg` and
    /// `<root>.tmg`) and record both files for the graphs database table.
    pub fn write_subgraphs_tmg(
        &self,
        graph_list: &mut Vec<GraphListEntry>,
        dir: &Path,
        root: &str,
        descr: &str,
        category: &str,
        filter: &GraphFilter<'_>,
    ) -> Result<()> {
        let simple_file = format!("{root}-simple.tmg");
        let (sv, se) = self.write_subgraph_simple(&dir.join(&simple_file), filter)?;
        graph_list.push(GraphListEntry {
            filename: simple_file,
            descr: descr.to_string(),
            vertices: sv,
            edges: se,
            format: "simple".to_string(),
            category: category.to_string(),
        });
        let collapsed_file = format!("{root}.tmg");
        let (cv, ce) = self.write_subgraph_collapsed(&dir.join(&collapsed_file), filter)?;
        graph_list.push(GraphListEntry {
            filename: collapsed_file,
            descr: descr.to_string(),
            vertices: cv,
            edges: ce,
            format: "collapsed".to_string(),
            category: category.to_string(),
        });
        Ok(())
    }

    pub fn write_json(&self, path: &Path) -> Result<(usize, usize)> {
        #[derive(Serialize)]
        struct GraphExport<'a> {
            vertices: &'a [GraphVertex],
            edges: &'a [GraphEdge],
        }
        let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(
            BufWriter::new(f),
            &GraphExport {
                vertices: &self.vertices,
                edges: &self.edges,
            },
        )?;
        Ok((self.vertices.len(), self.edges.len()))
    }
}

/// Identity key of a location: the lowest-sorted member of the colocation
/// group, or the point itself.
fn representative(net: &Network, wid: WaypointId) -> WaypointId {
    match net.wp(wid).colocated {
        Some(c) => net.colocations[c.0][0],
        None => wid,
    }
}

/// A location is visible unless every waypoint there is hidden.
fn location_visible(net: &Network, wid: WaypointId) -> bool {
    match net.wp(wid).colocated {
        Some(c) => net.colocations[c.0]
            .iter()
            .any(|&w| !net.wp(w).is_hidden()),
        None => !net.wp(wid).is_hidden(),
    }
}

/// A concurrency group is drawn once, by its first active/preview member.
fn is_group_leader(net: &Network, sid: SegmentId) -> bool {
    let Some(g) = net.seg(sid).concurrent else {
        return true;
    };
    net.concurrencies[g.0]
        .iter()
        .copied()
        .find(|&m| net.route_system(net.seg(m).route).active_or_preview())
        == Some(sid)
}

/// Regions and system names of every concurrent active/preview route of a
/// segment, for subgraph filtering.
fn member_sets(net: &Network, sid: SegmentId) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut regions = BTreeSet::new();
    let mut systems = BTreeSet::new();
    let mut add = |member: SegmentId| {
        let r = net.route(net.seg(member).route);
        if net.system(r.system).active_or_preview() {
            regions.insert(r.region.clone());
            systems.insert(net.system(r.system).name.clone());
        }
    };
    match net.seg(sid).concurrent {
        None => add(sid),
        Some(g) => {
            for &m in &net.concurrencies[g.0] {
                add(m);
            }
        }
    }
    (regions, systems)
}

/// Edge label: the list names of every concurrent route in an active or
/// preview system, comma-joined.
fn segment_name(net: &Network, sid: SegmentId) -> String {
    let s = net.seg(sid);
    match s.concurrent {
        None => {
            let r = net.route(s.route);
            if net.system(r.system).active_or_preview() {
                r.list_entry_name()
            } else {
                String::new()
            }
        }
        Some(g) => {
            let mut name = String::new();
            for &m in &net.concurrencies[g.0] {
                let r = net.route(net.seg(m).route);
                if net.system(r.system).active_or_preview() {
                    if !name.is_empty() {
                        name.push(',');
                    }
                    name.push_str(&r.list_entry_name());
                }
            }
            name
        }
    }
}

/// Failsafe vertex name: `route@label`, or the `&`-joined form over every
/// active/preview colocated point.
fn simple_name(net: &Network, wid: WaypointId) -> String {
    let w = net.wp(wid);
    let Some(c) = w.colocated else {
        return format!(
            "{}@{}",
            net.route(w.route).list_entry_name(),
            w.label
        );
    };
    let mut long_label = String::new();
    for &other in &net.colocations[c.0] {
        let o = net.wp(other);
        if net.route_system(o.route).active_or_preview() {
            if !long_label.is_empty() {
                long_label.push('&');
            }
            long_label.push_str(&format!(
                "{}@{}",
                net.route(o.route).list_entry_name(),
                o.label
            ));
        }
    }
    long_label
}

/// Best display name for a location, applying the simplification tiers in
/// order: matching labels across a concurrency, two-route crossed labels,
/// a primary route with an exit-style label the others reference, 3+
/// intersections whose labels slash together the other route names, and
/// exit-number matches. Falls back to the failsafe name.
fn canonical_name(net: &Network, wid: WaypointId, log: &mut Vec<String>) -> String {
    let name = simple_name(net, wid);
    let Some(c) = net.wp(wid).colocated else {
        return name;
    };
    let colocated: Vec<WaypointId> = net.colocations[c.0]
        .iter()
        .copied()
        .filter(|&w| net.route_system(net.wp(w).route).active_or_preview())
        .collect();
    if colocated.len() <= 1 {
        return name;
    }

    let entry_of = |w: WaypointId| net.route(net.wp(w).route).list_entry_name();
    let label_of = |w: WaypointId| &net.wp(w).label;

    // concurrency with matching waypoint labels (hidden labels also match)
    let mut routes = String::new();
    let mut pointname = String::new();
    let mut matches = 0;
    for &w in &colocated {
        let label = label_of(w);
        let entry = entry_of(w);
        if routes.is_empty() {
            routes = entry;
            pointname = label.clone();
            matches = 1;
        } else if *label == pointname || label.starts_with('+') {
            // avoids doubled route names at border crossings
            if routes != entry {
                routes.push('/');
                routes.push_str(&entry);
            }
            matches += 1;
        }
    }
    if matches == colocated.len() {
        log.push(format!(
            "Straightforward concurrency: {name} -> {routes}@{pointname}"
        ));
        return format!("{routes}@{pointname}");
    }

    // two routes whose labels reference each other, with optional
    // directional suffixes
    if colocated.len() == 2 {
        let w0_entry = entry_of(colocated[0]);
        let w1_entry = entry_of(colocated[1]);
        let w0_label = label_of(colocated[0]);
        let w1_label = label_of(colocated[1]);
        if (w0_entry == *w1_label || w1_label.starts_with(&format!("{w0_entry}_")))
            && (w1_entry == *w0_label || w0_label.starts_with(&format!("{w1_entry}_")))
        {
            let simplified = format!("{w1_label}/{w0_label}");
            log.push(format!("Straightforward intersection: {name} -> {simplified}"));
            return simplified;
        }
    }

    // one route's label is an exit or intersection name the others carry,
    // plain or parenthesized
    for (mi, &m) in colocated.iter().enumerate() {
        let lookfor1 = entry_of(m);
        let lookfor2 = format!("{}({})", lookfor1, label_of(m));
        let all_match = colocated.iter().enumerate().all(|(ci, &c)| {
            ci == mi || *label_of(c) == lookfor1 || *label_of(c) == lookfor2
        });
        if all_match {
            let mut label = if label_of(m).chars().next().is_some_and(char::is_numeric) {
                lookfor2
            } else {
                lookfor1
            };
            for (ai, &a) in colocated.iter().enumerate() {
                if ai == mi {
                    continue;
                }
                label.push('/');
                label.push_str(&entry_of(a));
            }
            log.push(format!("Exit/Intersection: {name} -> {label}"));
            return label;
        }
    }

    // 3+ intersection whose labels slash together the other route names,
    // keeping any _ suffix that completes an exact match
    if colocated.len() > 2 {
        let mut all_match = true;
        let mut suffixes = vec![String::new(); colocated.len()];
        for (ci, &c) in colocated.iter().enumerate() {
            let cl = label_of(c).clone();
            let mut this_match = false;
            for (oi, &o) in colocated.iter().enumerate() {
                if oi == ci {
                    continue;
                }
                let o_route = net.route(net.wp(o).route);
                for base in [o_route.list_entry_name(), o_route.name_no_abbrev()] {
                    if cl.starts_with(&base) {
                        this_match = true;
                        if let Some(u) = cl.find('_') {
                            let suffix = &cl[u..];
                            if format!("{base}{suffix}") == cl {
                                suffixes[oi] = suffix.to_string();
                            }
                        }
                    }
                }
            }
            if !this_match {
                all_match = false;
                break;
            }
        }
        if all_match {
            let mut label = String::new();
            for (i, &w) in colocated.iter().enumerate() {
                if i > 0 {
                    label.push('/');
                }
                label.push_str(&entry_of(w));
                label.push_str(&suffixes[i]);
            }
            log.push(format!("3+ intersection: {name} -> {label}"));
            return label;
        }
    }

    // exit-number simplification: one point carries the number, the others
    // reference it in any of the recognized shapes
    for (ei, &e) in colocated.iter().enumerate() {
        let e_label = label_of(e).clone();
        if !e_label.chars().next().is_some_and(|ch| ch.is_ascii_digit()) {
            continue;
        }
        let e_route = net.route(net.wp(e).route);
        let e_entry = e_route.list_entry_name();
        let e_no_abbrev = e_route.name_no_abbrev();
        let route_number_only = match e_no_abbrev.find(|ch: char| ch.is_ascii_digit()) {
            Some(pos) => e_no_abbrev[pos..].to_string(),
            None => e_no_abbrev.clone(),
        };
        let all_match = colocated.iter().enumerate().all(|(mi, &m)| {
            if mi == ei {
                return true;
            }
            let ml = label_of(m);
            *ml == e_entry
                || *ml == e_no_abbrev
                || *ml == format!("{e_entry}({e_label})")
                || *ml == format!("{e_label}({route_number_only})")
                || *ml == format!("{e_label}({e_no_abbrev})")
                || ml.starts_with(&format!("{e_no_abbrev}_"))
                || ml.starts_with(&format!("{e_no_abbrev}/"))
                || *ml == e_label
        });
        if all_match {
            let mut label = String::new();
            for (pos, &w) in colocated.iter().enumerate() {
                if pos > 0 {
                    label.push('/');
                }
                label.push_str(&entry_of(w));
                if pos == ei {
                    label.push_str(&format!("({})", label_of(w)));
                }
            }
            log.push(format!("Exit number: {name} -> {label}"));
            return label;
        }
    }

    log.push(format!("Keep failsafe: {name}"));
    name
}
