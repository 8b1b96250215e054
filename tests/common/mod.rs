#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use siteupdate::datacheck::DatacheckEntry;
use siteupdate::errors::ErrorList;
use siteupdate::model::{Network, Traveler, TravelerId};
use siteupdate::parse::{catalog, list, wpt};
use siteupdate::quadtree::WaypointQuadtree;

/// A route fixture: catalog fields plus the waypoint file body.
pub struct RouteSpec<'a> {
    pub region: &'a str,
    pub route: &'a str,
    pub root: &'a str,
    pub alt_names: &'a str,
    pub wpt: String,
}

/// A system fixture with one connected route per route.
pub struct SystemSpec<'a> {
    pub name: &'a str,
    pub level: &'a str,
    pub routes: Vec<RouteSpec<'a>>,
}

/// Fresh scratch directory for one test's corpus.
pub fn fixture_dir(name: &str) -> PathBuf {
    let dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join(name);
    if dir.exists() {
        fs::remove_dir_all(&dir).expect("clearing fixture dir");
    }
    fs::create_dir_all(&dir).expect("creating fixture dir");
    dir
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("creating fixture parent dir");
    }
    fs::write(path, content).expect("writing fixture file");
}

/// Standard waypoint line with an OSM-style URL at six decimals.
pub fn wpt_line(labels: &str, lat: f64, lng: f64) -> String {
    format!(
        "{labels} http://www.openstreetmap.org/?lat={lat:.6}&lon={lng:.6}\n"
    )
}

/// Lay a corpus out on disk the way the readers expect it: a systems file,
/// per-system route and connected-route lists, and the waypoint files.
pub fn write_corpus(root: &Path, systems: &[SystemSpec<'_>]) {
    let mut systems_csv = String::from("System;Country;FullName;Color;Tier;Level\n");
    for s in systems {
        systems_csv.push_str(&format!(
            "{};USA;{} Full Name;blue;1;{}\n",
            s.name, s.name, s.level
        ));

        let mut routes_csv =
            String::from("System;Region;Route;Banner;Abbrev;City;Root;AltRouteNames\n");
        let mut con_csv = String::from("System;Route;Banner;GroupName;Roots\n");
        for r in &s.routes {
            routes_csv.push_str(&format!(
                "{};{};{};;;;{};{}\n",
                s.name, r.region, r.route, r.root, r.alt_names
            ));
            con_csv.push_str(&format!("{};{};;;{}\n", s.name, r.route, r.root));
            write_file(
                &root
                    .join("hwy_data")
                    .join(r.region)
                    .join(s.name)
                    .join(format!("{}.wpt", r.root)),
                &r.wpt,
            );
        }
        write_file(
            &root.join("hwy_data").join("_systems").join(format!("{}.csv", s.name)),
            &routes_csv,
        );
        write_file(
            &root
                .join("hwy_data")
                .join("_systems")
                .join(format!("{}_con.csv", s.name)),
            &con_csv,
        );
    }
    write_file(&root.join("systems.csv"), &systems_csv);
}

/// Everything the read phase produces for one corpus.
pub struct Corpus {
    pub net: Network,
    pub tree: WaypointQuadtree,
    pub datacheck: Vec<DatacheckEntry>,
    pub el: ErrorList,
}

/// Read a corpus from disk: catalogs, then every waypoint file with
/// colocation and near-miss correlation, then the deterministic sorts.
pub fn load_corpus(root: &Path) -> Corpus {
    let el = ErrorList::new();
    let mut net = Network::new();
    catalog::read_systems(&mut net, root, "systems.csv", &el);

    let mut tree = WaypointQuadtree::master();
    let mut datacheck = Vec::new();
    let mut processed = Vec::new();
    wpt::read_all_wpts(
        &mut net,
        &mut tree,
        &mut datacheck,
        &el,
        &root.join("hwy_data"),
        &mut processed,
    );

    tree.sort_points(&|wid| net.waypoint_key(wid));
    for gidx in 0..net.colocations.len() {
        let mut group = net.colocations[gidx].clone();
        group.sort_by_key(|&w| net.waypoint_key(w));
        net.colocations[gidx] = group;
    }

    Corpus {
        net,
        tree,
        datacheck,
        el,
    }
}

/// Write a traveler's list file and run the matcher over it.
pub fn read_traveler(
    corpus: &mut Corpus,
    lists_dir: &Path,
    name: &str,
    lines: &str,
    travelers: &mut Vec<Traveler>,
) {
    write_file(&lists_dir.join(format!("{name}.list")), lines);
    let route_map = list::build_route_map(&corpus.net);
    let tid = TravelerId(travelers.len());
    let mut t = Traveler::new(name.to_string());
    list::read_traveler_list(&mut corpus.net, tid, &mut t, &route_map, lists_dir)
        .expect("reading traveler list");
    travelers.push(t);
}

/// Find the route id by root.
pub fn route_by_root(net: &Network, root: &str) -> siteupdate::model::RouteId {
    for h in &net.systems {
        for &rid in &h.routes {
            if net.route(rid).root == root {
                return rid;
            }
        }
    }
    panic!("no route with root {root}");
}
