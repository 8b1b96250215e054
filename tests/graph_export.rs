mod common;

use common::{RouteSpec, SystemSpec, load_corpus, wpt_line, write_corpus};
use siteupdate::correlate;
use siteupdate::graph::{GraphFilter, HighwayGraph, PlaceRadius};

fn graph_for(corpus: &mut common::Corpus) -> HighwayGraph {
    let mut log = Vec::new();
    correlate::detect_concurrencies(&mut corpus.net, &mut log);
    HighwayGraph::build(&corpus.net, &corpus.tree)
}

#[test]
fn collapsed_format_folds_hidden_chains_into_shaping_points() {
    let root = common::fixture_dir("gr_collapse");
    write_corpus(
        &root,
        &[SystemSpec {
            name: "usai",
            level: "active",
            routes: vec![RouteSpec {
                region: "NY",
                route: "I-90",
                root: "ny.i90",
                alt_names: "",
                wpt: format!(
                    "{}{}{}{}",
                    wpt_line("A", 40.0, -75.0),
                    wpt_line("+X000001", 40.1, -75.0),
                    wpt_line("+X000002", 40.2, -75.0),
                    wpt_line("B", 40.3, -75.0)
                ),
            }],
        }],
    );
    let mut corpus = load_corpus(&root);
    let graph = graph_for(&mut corpus);

    let simple_path = root.join("gr-simple.tmg");
    let (sv, se) = graph
        .write_subgraph_simple(&simple_path, &GraphFilter::All)
        .expect("writing simple graph");
    assert_eq!((sv, se), (4, 3));

    let collapsed_path = root.join("gr.tmg");
    let (cv, ce) = graph
        .write_subgraph_collapsed(&collapsed_path, &GraphFilter::All)
        .expect("writing collapsed graph");
    assert_eq!((cv, ce), (2, 1), "hidden chain must fold into one edge");

    let content = std::fs::read_to_string(&collapsed_path).expect("reading collapsed graph");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "TMG 1.0 collapsed");
    assert_eq!(lines[1], "2 1");
    assert!(lines[2].starts_with("I-90@A "));
    assert!(lines[3].starts_with("I-90@B "));
    // edge line carries the two folded points as shaping coordinates
    let edge_tokens: Vec<&str> = lines[4].split_whitespace().collect();
    assert_eq!(edge_tokens.len(), 3 + 4, "edge line: {}", lines[4]);
    assert_eq!(&edge_tokens[..3], &["0", "1", "I-90"]);
}

fn two_region_corpus(name: &str) -> common::Corpus {
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
                    alt_names: "",
                    wpt: format!(
                        "{}{}",
                        wpt_line("A", 40.0, -75.0),
                        wpt_line("B", 40.1, -75.0)
                    ),
                }],
            },
            SystemSpec {
                name: "usaus",
                level: "active",
                routes: vec![RouteSpec {
                    region: "PA",
                    route: "US-30",
                    root: "pa.us30",
                    alt_names: "",
                    wpt: format!(
                        "{}{}",
                        wpt_line("C", 50.0, -75.0),
                        wpt_line("D", 50.1, -75.0)
                    ),
                }],
            },
        ],
    );
    load_corpus(&root)
}

#[test]
fn region_filter_keeps_only_matching_edges() {
    let mut corpus = two_region_corpus("gr_region_filter");
    let graph = graph_for(&mut corpus);
    let dir = common::fixture_dir("gr_region_filter_out");

    let wanted = ["NY".to_string()];
    let (nv, ne) = graph
        .write_subgraph_simple(&dir.join("NY-region-simple.tmg"), &GraphFilter::Regions(&wanted))
        .expect("writing region graph");
    assert_eq!((nv, ne), (2, 1));

    let content =
        std::fs::read_to_string(dir.join("NY-region-simple.tmg")).expect("reading region graph");
    assert!(content.contains("I-90@A"));
    assert!(!content.contains("US-30@C"));
}

#[test]
fn system_filter_keeps_only_matching_edges() {
    let mut corpus = two_region_corpus("gr_system_filter");
    let graph = graph_for(&mut corpus);
    let dir = common::fixture_dir("gr_system_filter_out");

    let wanted = ["usaus".to_string()];
    let (nv, ne) = graph
        .write_subgraph_collapsed(
            &dir.join("usaus-system.tmg"),
            &GraphFilter::Systems(&wanted),
        )
        .expect("writing system graph");
    assert_eq!((nv, ne), (2, 1));

    let content =
        std::fs::read_to_string(dir.join("usaus-system.tmg")).expect("reading system graph");
    assert!(content.contains("US-30@C"));
    assert!(!content.contains("I-90@A"));
}

#[test]
fn place_filter_keeps_edges_with_an_endpoint_in_radius() {
    let mut corpus = two_region_corpus("gr_place_filter");
    let graph = graph_for(&mut corpus);
    let dir = common::fixture_dir("gr_place_filter_out");

    let area = PlaceRadius {
        place: "Albany, NY".to_string(),
        base: "albany".to_string(),
        lat: 40.0,
        lng: -75.0,
        r: 100.0,
    };
    let (nv, ne) = graph
        .write_subgraph_simple(
            &dir.join("albany100-area-simple.tmg"),
            &GraphFilter::Place(&area),
        )
        .expect("writing area graph");
    // the second route is hundreds of miles north of the place
    assert_eq!((nv, ne), (2, 1));
}

#[test]
fn both_formats_are_recorded_for_the_graphs_table() {
    let mut corpus = two_region_corpus("gr_table_rows");
    let graph = graph_for(&mut corpus);
    let dir = common::fixture_dir("gr_table_rows_out");

    let mut graph_list = Vec::new();
    let wanted = ["NY".to_string()];
    graph
        .write_subgraphs_tmg(
            &mut graph_list,
            &dir,
            "NY-region",
            "New York (State)",
            "region",
            &GraphFilter::Regions(&wanted),
        )
        .expect("writing subgraph pair");

    assert_eq!(graph_list.len(), 2);
    assert_eq!(graph_list[0].filename, "NY-region-simple.tmg");
    assert_eq!(graph_list[0].format, "simple");
    assert_eq!(graph_list[1].filename, "NY-region.tmg");
    assert_eq!(graph_list[1].format, "collapsed");
    for entry in &graph_list {
        assert_eq!(entry.descr, "New York (State)");
        assert_eq!(entry.category, "region");
        assert!(dir.join(&entry.filename).exists());
    }
}

/// Corpus helper for the vertex-naming tiers: a set of routes meeting at
/// one shared point, each with a far endpoint of its own.
fn naming_corpus(name: &str, routes: Vec<(&'static str, &'static str, &'static str)>) -> HighwayGraph {
    let root = common::fixture_dir(name);
    let specs = routes
        .iter()
        .enumerate()
        .map(|(i, &(route, file_root, label))| RouteSpec {
            region: "NY",
            route,
            root: file_root,
            alt_names: "",
            wpt: format!(
                "{}{}",
                wpt_line(label, 40.0, -75.0),
                wpt_line("End", 41.0 + i as f64, -75.0)
            ),
        })
        .collect();
    write_corpus(
        &root,
        &[SystemSpec {
            name: "usai",
            level: "active",
            routes: specs,
        }],
    );
    let mut corpus = load_corpus(&root);
    graph_for(&mut corpus)
}

#[test]
fn matching_labels_simplify_to_a_concurrency_name() {
    let graph = naming_corpus(
        "gr_name_concurrency",
        vec![("I-90", "ny.i90", "X1"), ("US-20", "ny.us20", "X1")],
    );
    assert!(
        graph.vertices.iter().any(|v| v.name == "I-90/US-20@X1"),
        "vertex names: {:?}",
        graph.vertices.iter().map(|v| &v.name).collect::<Vec<_>>()
    );
    assert!(
        graph
            .naming_log
            .iter()
            .any(|l| l.starts_with("Straightforward concurrency:"))
    );
}

#[test]
fn exit_intersection_labels_simplify() {
    let graph = naming_corpus(
        "gr_name_exit_intersection",
        vec![("I-10", "ny.i010", "753B"), ("US90", "ny.us090", "I-10(753B)")],
    );
    assert!(
        graph.vertices.iter().any(|v| v.name == "I-10(753B)/US90"),
        "vertex names: {:?}",
        graph.vertices.iter().map(|v| &v.name).collect::<Vec<_>>()
    );
    assert!(
        graph
            .naming_log
            .iter()
            .any(|l| l.starts_with("Exit/Intersection:"))
    );
}

#[test]
fn three_way_intersections_slash_the_route_names_together() {
    let graph = naming_corpus(
        "gr_name_three_way",
        vec![
            ("NY5", "ny.ny005", "NY16/384"),
            ("NY16", "ny.ny016", "NY5/384"),
            ("NY384", "ny.ny384", "NY5/16"),
        ],
    );
    assert!(
        graph.vertices.iter().any(|v| v.name == "NY5/NY16/NY384"),
        "vertex names: {:?}",
        graph.vertices.iter().map(|v| &v.name).collect::<Vec<_>>()
    );
    assert!(
        graph
            .naming_log
            .iter()
            .any(|l| l.starts_with("3+ intersection:"))
    );
}

#[test]
fn exit_numbers_are_kept_with_the_owning_route() {
    let graph = naming_corpus(
        "gr_name_exit_number",
        vec![("I-90", "ny.i090", "47B(94)"), ("I-94", "ny.i094", "47B")],
    );
    assert!(
        graph.vertices.iter().any(|v| v.name == "I-90/I-94(47B)"),
        "vertex names: {:?}",
        graph.vertices.iter().map(|v| &v.name).collect::<Vec<_>>()
    );
    assert!(
        graph
            .naming_log
            .iter()
            .any(|l| l.starts_with("Exit number:"))
    );
}
