mod common;

use common::{RouteSpec, SystemSpec, load_corpus, route_by_root, wpt_line, write_corpus};
use siteupdate::correlate;
use siteupdate::geo;
use siteupdate::mileage;
use siteupdate::model::TravelerId;

/// Corpus for traveler matching: an active four-point route, a second
/// active route concurrent with its middle segment, and a devel route.
fn traveler_corpus(name: &str) -> common::Corpus {
    let root = common::fixture_dir(name);
    write_corpus(
        &root,
        &[
            SystemSpec {
                name: "usai",
                level: "active",
                routes: vec![RouteSpec {
                    region: "NY",
                    route: "I-90",
                    root: "ny.i90",
                    alt_names: "I90old",
                    wpt: format!(
                        "{}{}{}{}",
                        wpt_line("A", 40.0, -75.0),
                        wpt_line("B +OldB", 40.1, -75.0),
                        wpt_line("C", 40.2, -75.0),
                        wpt_line("D", 40.3, -75.0)
                    ),
                }],
            },
            SystemSpec {
                name: "usaus",
                level: "active",
                routes: vec![RouteSpec {
                    region: "NY",
                    route: "US-20",
                    root: "ny.us20",
                    alt_names: "",
                    wpt: format!(
                        "{}{}",
                        wpt_line("X1", 40.1, -75.0),
                        wpt_line("X2", 40.2, -75.0)
                    ),
                }],
            },
            SystemSpec {
                name: "usadev",
                level: "devel",
                routes: vec![RouteSpec {
                    region: "NY",
                    route: "DEV-1",
                    root: "ny.dev1",
                    alt_names: "",
                    wpt: format!(
                        "{}{}",
                        wpt_line("P1", 41.0, -75.0),
                        wpt_line("P2", 41.1, -75.0)
                    ),
                }],
            },
        ],
    );
    load_corpus(&root)
}

#[test]
fn matched_endpoints_credit_the_inclusive_exclusive_range() {
    let mut corpus = traveler_corpus("tl_range");
    let lists = common::fixture_dir("tl_range_lists");
    let mut travelers = Vec::new();
    common::read_traveler(
        &mut corpus,
        &lists,
        "terescoj",
        "NY I-90 A D\n",
        &mut travelers,
    );

    let net = &corpus.net;
    let i90 = route_by_root(net, "ny.i90");
    let segments = &net.route(i90).segments;
    assert_eq!(segments.len(), 3);

    let t = &travelers[0];
    assert_eq!(t.good_lines, 1);
    assert_eq!(t.clinched_segments.len(), 3);
    for &sid in segments {
        assert!(net.seg(sid).clinched_by.contains(&TravelerId(0)));
    }

    let r = net.route(i90);
    assert!(r.labels_in_use.contains("A"));
    assert!(r.labels_in_use.contains("D"));
}

#[test]
fn alt_labels_match_and_leave_the_unused_pool() {
    let mut corpus = traveler_corpus("tl_alt_labels");
    let lists = common::fixture_dir("tl_alt_labels_lists");
    let mut travelers = Vec::new();
    common::read_traveler(
        &mut corpus,
        &lists,
        "oscar",
        "NY I-90 OldB C\n",
        &mut travelers,
    );

    let net = &corpus.net;
    let i90 = route_by_root(net, "ny.i90");
    let r = net.route(i90);
    // only the B->C segment is credited
    assert_eq!(travelers[0].clinched_segments.len(), 1);
    let sid = r.segments[1];
    assert!(net.seg(sid).clinched_by.contains(&TravelerId(0)));

    assert!(r.labels_in_use.contains("OLDB"));
    assert!(!r.unused_alt_labels.contains("OLDB"));
}

#[test]
fn problem_lines_are_logged_per_traveler_and_skipped() {
    let mut corpus = traveler_corpus("tl_problems");
    let lists = common::fixture_dir("tl_problems_lists");
    let mut travelers = Vec::new();
    common::read_traveler(
        &mut corpus,
        &lists,
        "sammi",
        "NY DEV-1 P1 P2\n\
         NY I-90 A\n\
         NY I-99 A B\n\
         NY I90old A B\n\
         NY I-90 A Nowhere\n\
         # a comment\n\
         \n",
        &mut travelers,
    );

    let t = &travelers[0];
    assert!(
        t.log_entries
            .iter()
            .any(|l| l.starts_with("Ignoring line matching highway in inactive system:"))
    );
    assert!(
        t.log_entries
            .iter()
            .any(|l| l.starts_with("Incorrect format line:"))
    );
    assert!(
        t.log_entries
            .iter()
            .any(|l| l.starts_with("Unknown region/highway combo in line:"))
    );
    assert!(
        t.log_entries
            .iter()
            .any(|l| l.contains("replacing deprecated route name I90old"))
    );
    assert!(
        t.log_entries
            .iter()
            .any(|l| l.starts_with("Waypoint label(s) not found in line:"))
    );

    // only the deprecated-name line credited anything
    assert_eq!(t.good_lines, 1);
    assert_eq!(t.clinched_segments.len(), 1);
    // nothing in the devel route was credited
    let net = &corpus.net;
    let dev = route_by_root(net, "ny.dev1");
    for &sid in &net.route(dev).segments {
        assert!(net.seg(sid).clinched_by.is_empty());
    }
}

#[test]
fn concurrency_augmentation_credits_group_mates() {
    let mut corpus = traveler_corpus("tl_augment");
    let lists = common::fixture_dir("tl_augment_lists");
    let mut travelers = Vec::new();
    common::read_traveler(
        &mut corpus,
        &lists,
        "terescoj",
        "NY I-90 A D\n",
        &mut travelers,
    );

    let mut log = Vec::new();
    correlate::detect_concurrencies(&mut corpus.net, &mut log);
    correlate::augment_travelers(&mut corpus.net, &mut travelers, &mut log);

    let net = &corpus.net;
    let us20 = route_by_root(net, "ny.us20");
    let us20_seg = net.route(us20).segments[0];
    assert!(
        net.seg(us20_seg).clinched_by.contains(&TravelerId(0)),
        "concurrency mate in an active system must be credited"
    );
    assert!(
        log.iter()
            .any(|l| l.starts_with("Concurrency augment for traveler terescoj:"))
    );
    // augmentation credits the segment, not the traveler's own list
    assert_eq!(travelers[0].clinched_segments.len(), 3);
}

#[test]
fn traveler_mileage_discounts_concurrent_segments() {
    let mut corpus = traveler_corpus("tl_mileage");
    let lists = common::fixture_dir("tl_mileage_lists");
    let mut travelers = Vec::new();
    common::read_traveler(
        &mut corpus,
        &lists,
        "terescoj",
        "NY I-90 A D\n",
        &mut travelers,
    );

    let mut log = Vec::new();
    correlate::detect_concurrencies(&mut corpus.net, &mut log);
    correlate::augment_travelers(&mut corpus.net, &mut travelers, &mut log);
    let totals = mileage::compute_mileage(&mut corpus.net, &mut travelers);

    let leg = geo::distance_miles(40.0, -75.0, 40.1, -75.0);
    let t = &travelers[0];
    // three i90 legs (middle one split with us20) plus the us20 copy
    let expected = leg + leg / 2.0 + leg + leg / 2.0;
    let got = t.active_only_mileage_by_region.get("NY").copied().unwrap();
    assert!((got - expected).abs() < 1e-9, "got {got}, want {expected}");

    // the traveler clinched every active mile in the region
    let region_total = totals.active_only_by_region.get("NY").copied().unwrap();
    let dev_free: f64 = expected;
    assert!((region_total - dev_free).abs() < 1e-9);
}
