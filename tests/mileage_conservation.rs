mod common;

use common::{RouteSpec, SystemSpec, load_corpus, route_by_root, wpt_line, write_corpus};
use siteupdate::correlate;
use siteupdate::geo;
use siteupdate::mileage;

/// Three systems at the three levels, all sharing one piece of pavement,
/// each with one extra unshared leg.
fn tiered_corpus(name: &str) -> common::Corpus {
    let shared = format!(
        "{}{}",
        wpt_line("S1", 40.0, -75.0),
        wpt_line("S2", 40.1, -75.0)
    );
    let root = common::fixture_dir(name);
    write_corpus(
        &root,
        &[
            SystemSpec {
                name: "usaact",
                level: "active",
                routes: vec![RouteSpec {
                    region: "NY",
                    route: "A-1",
                    root: "ny.a1",
                    alt_names: "",
                    wpt: format!("{shared}{}", wpt_line("A3", 40.2, -75.0)),
                }],
            },
            SystemSpec {
                name: "usaprev",
                level: "preview",
                routes: vec![RouteSpec {
                    region: "NY",
                    route: "P-1",
                    root: "ny.p1",
                    alt_names: "",
                    wpt: format!("{shared}{}", wpt_line("P3", 40.0, -75.1)),
                }],
            },
            SystemSpec {
                name: "usadev",
                level: "devel",
                routes: vec![RouteSpec {
                    region: "NY",
                    route: "D-1",
                    root: "ny.d1",
                    alt_names: "",
                    wpt: format!("{shared}{}", wpt_line("D3", 40.2, -75.1)),
                }],
            },
        ],
    );
    load_corpus(&root)
}

#[test]
fn regional_totals_equal_physical_pavement() {
    let mut corpus = tiered_corpus("mc_totals");
    let mut log = Vec::new();
    correlate::detect_concurrencies(&mut corpus.net, &mut log);
    let mut travelers = Vec::new();
    let totals = mileage::compute_mileage(&mut corpus.net, &mut travelers);
    let net = &corpus.net;

    let shared = geo::distance_miles(40.0, -75.0, 40.1, -75.0);
    let a_leg = geo::distance_miles(40.1, -75.0, 40.2, -75.0);
    let p_leg = geo::distance_miles(40.1, -75.0, 40.0, -75.1);
    let d_leg = geo::distance_miles(40.1, -75.0, 40.2, -75.1);

    // overall: the shared segment appears three times but counts once
    let overall = totals.overall_by_region.get("NY").copied().unwrap();
    let expected_overall = shared + a_leg + p_leg + d_leg;
    assert!(
        (overall - expected_overall).abs() < 1e-9,
        "overall {overall} vs {expected_overall}"
    );

    // active+preview: shared pavement split between the two clinchable
    // copies, devel's copy and leg excluded
    let preview = totals.active_preview_by_region.get("NY").copied().unwrap();
    let expected_preview = shared + a_leg + p_leg;
    assert!(
        (preview - expected_preview).abs() < 1e-9,
        "preview {preview} vs {expected_preview}"
    );

    // active only: the active route is the single active copy, so its
    // share of the shared pavement is undiscounted
    let active = totals.active_only_by_region.get("NY").copied().unwrap();
    let expected_active = shared + a_leg;
    assert!(
        (active - expected_active).abs() < 1e-9,
        "active {active} vs {expected_active}"
    );

    assert!(active <= preview + 1e-9);
    assert!(preview <= overall + 1e-9);

    // every route keeps undiscounted totals
    let a1 = net.route(route_by_root(net, "ny.a1"));
    assert!((a1.mileage - (shared + a_leg)).abs() < 1e-9);
    let d1 = net.route(route_by_root(net, "ny.d1"));
    assert!((d1.mileage - (shared + d_leg)).abs() < 1e-9);
}

#[test]
fn system_local_share_ignores_other_systems() {
    let mut corpus = tiered_corpus("mc_system_share");
    let mut log = Vec::new();
    correlate::detect_concurrencies(&mut corpus.net, &mut log);
    let mut travelers = Vec::new();
    let _ = mileage::compute_mileage(&mut corpus.net, &mut travelers);
    let net = &corpus.net;

    let shared = geo::distance_miles(40.0, -75.0, 40.1, -75.0);
    let a_leg = geo::distance_miles(40.1, -75.0, 40.2, -75.0);

    // the shared segment is the only member of its group within each
    // system, so the system-local share is the full length
    let act = net
        .systems
        .iter()
        .find(|h| h.name == "usaact")
        .expect("active system");
    let got = act.mileage_by_region.get("NY").copied().unwrap();
    assert!((got - (shared + a_leg)).abs() < 1e-9, "got {got}");
}

#[test]
fn concurrency_counts_follow_system_levels() {
    let mut corpus = tiered_corpus("mc_counts");
    let mut log = Vec::new();
    correlate::detect_concurrencies(&mut corpus.net, &mut log);
    let net = &corpus.net;

    // one concurrency group with one segment per route
    assert_eq!(net.concurrencies.len(), 1);
    assert_eq!(net.concurrencies[0].len(), 3);
    for &sid in &net.concurrencies[0] {
        assert_eq!(net.seg(sid).concurrent, Some(siteupdate::model::ConcurrencyId(0)));
    }
}
