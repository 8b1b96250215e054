mod common;

use common::{RouteSpec, SystemSpec, load_corpus, route_by_root, wpt_line, write_corpus};
use siteupdate::correlate;
use siteupdate::geo;
use siteupdate::mileage;

/// Two routes sharing both endpoints bit-for-bit: one colocation group per
/// endpoint, one concurrency group holding one segment from each route, and
/// regional mileage counted once.
fn shared_pair_corpus(name: &str) -> common::Corpus {
    let root = common::fixture_dir(name);
    write_corpus(
        &root,
        &[SystemSpec {
            name: "usai",
            level: "active",
            routes: vec![
                RouteSpec {
                    region: "NY",
                    route: "I-90",
                    root: "ny.i90",
                    alt_names: "",
                    wpt: format!(
                        "{}{}",
                        wpt_line("P_A", 40.0, -75.0),
                        wpt_line("Q_A", 40.1, -75.1)
                    ),
                },
                RouteSpec {
                    region: "NY",
                    route: "US-20",
                    root: "ny.us20",
                    alt_names: "",
                    wpt: format!(
                        "{}{}",
                        wpt_line("P_B", 40.0, -75.0),
                        wpt_line("Q_B", 40.1, -75.1)
                    ),
                },
            ],
        }],
    );
    load_corpus(&root)
}

#[test]
fn colocation_groups_form_and_sort_by_root_and_label() {
    let corpus = shared_pair_corpus("coloc_groups");
    assert!(corpus.el.is_empty(), "unexpected fatal errors");
    let net = &corpus.net;

    assert_eq!(net.colocations.len(), 2);
    for group in &net.colocations {
        assert_eq!(group.len(), 2);
        let keys: Vec<String> = group.iter().map(|&w| net.waypoint_key(w)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted, "colocation group not sorted");
        // every member references the same group
        let expected = net.wp(group[0]).colocated;
        assert!(expected.is_some());
        for &w in group {
            assert_eq!(net.wp(w).colocated, expected);
        }
    }

    // exact equality is the identity test: all members share coordinates
    for group in &net.colocations {
        let first = net.wp(group[0]);
        for &w in &group[1..] {
            assert!(net.wp(w).same_coords(first));
        }
    }
}

#[test]
fn concurrency_group_links_the_shared_segments() {
    let mut corpus = shared_pair_corpus("concurrency_pair");
    let mut log = Vec::new();
    correlate::detect_concurrencies(&mut corpus.net, &mut log);
    let net = &corpus.net;

    assert_eq!(net.concurrencies.len(), 1);
    let group = &net.concurrencies[0];
    assert_eq!(group.len(), 2);

    let i90 = route_by_root(net, "ny.i90");
    let us20 = route_by_root(net, "ny.us20");
    let member_routes: Vec<_> = group.iter().map(|&s| net.seg(s).route).collect();
    assert!(member_routes.contains(&i90));
    assert!(member_routes.contains(&us20));

    // closure: endpoints are pairwise colocated across the group
    let s0 = net.seg(group[0]);
    let s1 = net.seg(group[1]);
    let ends0 = (net.wp(s0.waypoint1), net.wp(s0.waypoint2));
    let ends1 = (net.wp(s1.waypoint1), net.wp(s1.waypoint2));
    assert!(
        ends0.0.same_coords(ends1.0) && ends0.1.same_coords(ends1.1)
            || ends0.0.same_coords(ends1.1) && ends0.1.same_coords(ends1.0)
    );

    assert_eq!(log.len(), 1);
    assert!(log[0].starts_with("New concurrency ["), "got: {}", log[0]);
}

#[test]
fn shared_pavement_counts_once_in_regional_totals() {
    let mut corpus = shared_pair_corpus("mileage_shared");
    let mut log = Vec::new();
    correlate::detect_concurrencies(&mut corpus.net, &mut log);
    let mut travelers = Vec::new();
    let totals = mileage::compute_mileage(&mut corpus.net, &mut travelers);
    let net = &corpus.net;

    let length = geo::distance_miles(40.0, -75.0, 40.1, -75.1);

    // each route keeps its full, undiscounted mileage
    for root in ["ny.i90", "ny.us20"] {
        let r = net.route(route_by_root(net, root));
        assert!((r.mileage - length).abs() < 1e-9, "route {root}");
    }

    // the region sees the pavement once: L/2 from each of two routes
    let overall = totals.overall_by_region.get("NY").copied().unwrap_or(0.0);
    assert!((overall - length).abs() < 1e-9, "overall {overall}");

    // both routes are in the same (active) system, so the system-local
    // share is also split
    let by_region = &net.systems[0].mileage_by_region;
    assert!((by_region.get("NY").unwrap() - length).abs() < 1e-9);
}

#[test]
fn near_misses_cross_link_symmetrically() {
    let root = common::fixture_dir("near_miss_links");
    write_corpus(
        &root,
        &[SystemSpec {
            name: "usai",
            level: "active",
            routes: vec![
                RouteSpec {
                    region: "NY",
                    route: "I-90",
                    root: "ny.i90",
                    alt_names: "",
                    wpt: format!(
                        "{}{}",
                        wpt_line("A", 40.0, -75.0),
                        wpt_line("B", 41.0, -75.0)
                    ),
                },
                RouteSpec {
                    region: "NY",
                    route: "NY-5",
                    root: "ny.ny5",
                    alt_names: "",
                    wpt: format!(
                        "{}{}",
                        wpt_line("NearA", 40.0002, -75.0003),
                        wpt_line("Far", 42.0, -75.0)
                    ),
                },
            ],
        }],
    );
    let corpus = load_corpus(&root);
    let net = &corpus.net;

    let i90 = route_by_root(net, "ny.i90");
    let ny5 = route_by_root(net, "ny.ny5");
    let a = net.route(i90).points[0];
    let near_a = net.route(ny5).points[0];
    let far = net.route(ny5).points[1];

    assert_eq!(net.wp(a).near_miss_points, vec![near_a]);
    assert_eq!(net.wp(near_a).near_miss_points, vec![a]);
    assert!(net.wp(far).near_miss_points.is_empty());
    // close but not equal: no colocation
    assert!(net.wp(a).colocated.is_none());
}

#[test]
fn repeated_reads_are_deterministic() {
    let corpus1 = shared_pair_corpus("determinism_a");
    let corpus2 = shared_pair_corpus("determinism_b");

    let keys1: Vec<String> = corpus1
        .tree
        .point_list()
        .iter()
        .map(|&w| corpus1.net.waypoint_key(w))
        .collect();
    let keys2: Vec<String> = corpus2
        .tree
        .point_list()
        .iter()
        .map(|&w| corpus2.net.waypoint_key(w))
        .collect();
    assert_eq!(keys1, keys2);

    let mut log1 = Vec::new();
    let mut log2 = Vec::new();
    let mut net1 = corpus1.net;
    let mut net2 = corpus2.net;
    correlate::detect_concurrencies(&mut net1, &mut log1);
    correlate::detect_concurrencies(&mut net2, &mut log2);
    assert_eq!(log1, log2);
}
