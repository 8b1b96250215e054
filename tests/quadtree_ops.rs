use siteupdate::model::WaypointId;
use siteupdate::quadtree::{QtPoint, WaypointQuadtree};

fn pt(lat: f64, lng: f64, id: usize) -> QtPoint {
    QtPoint {
        lat,
        lng,
        id: WaypointId(id),
    }
}

#[test]
fn size_counts_the_multiset_of_inserted_points() {
    let mut tree = WaypointQuadtree::master();
    tree.insert(pt(40.0, -75.0, 0));
    tree.insert(pt(40.0, -75.0, 1));
    tree.insert(pt(41.0, -76.0, 2));
    assert_eq!(tree.size(), 3);
    assert_eq!(tree.point_list().len(), 3);
}

#[test]
fn exact_lookup_finds_only_bitwise_equal_coordinates() {
    let mut tree = WaypointQuadtree::master();
    tree.insert(pt(40.0, -75.0, 0));
    assert_eq!(
        tree.point_at_same_coords(40.0, -75.0),
        Some(WaypointId(0))
    );
    assert_eq!(tree.point_at_same_coords(40.0000001, -75.0), None);
    assert_eq!(tree.point_at_same_coords(40.0, -74.9999999), None);
}

#[test]
fn near_miss_respects_tolerance_on_each_axis_independently() {
    let mut tree = WaypointQuadtree::master();
    tree.insert(pt(40.0, -75.0, 0));

    // within tolerance on both axes
    let hits = tree.near_miss_points(40.0004, -75.0004, 0.0005);
    assert_eq!(hits, vec![WaypointId(0)]);

    // one axis out of tolerance is enough to miss
    assert!(tree.near_miss_points(40.0006, -75.0, 0.0005).is_empty());
    assert!(tree.near_miss_points(40.0, -75.0006, 0.0005).is_empty());

    // an exactly-equal point is a colocation, not a near-miss
    assert!(tree.near_miss_points(40.0, -75.0, 0.0005).is_empty());
}

#[test]
fn near_miss_is_symmetric_for_stored_pairs() {
    let mut tree = WaypointQuadtree::master();
    tree.insert(pt(40.0, -75.0, 0));
    tree.insert(pt(40.0002, -75.0003, 1));
    assert_eq!(
        tree.near_miss_points(40.0, -75.0, 0.0005),
        vec![WaypointId(1)]
    );
    assert_eq!(
        tree.near_miss_points(40.0002, -75.0003, 0.0005),
        vec![WaypointId(0)]
    );
}

#[test]
fn refinement_keeps_every_point_and_stays_valid() {
    let mut tree = WaypointQuadtree::master();
    // 60 unique locations forces at least one refinement
    for i in 0..60 {
        tree.insert(pt(40.0 + (i as f64) * 0.01, -75.0, i));
    }
    assert_eq!(tree.size(), 60);
    assert!(tree.total_nodes() > 1, "tree should have refined");
    assert!(tree.is_valid());

    // every point is still findable after redistribution
    for i in 0..60 {
        assert_eq!(
            tree.point_at_same_coords(40.0 + (i as f64) * 0.01, -75.0),
            Some(WaypointId(i)),
        );
    }
}

#[test]
fn duplicate_coordinates_do_not_trigger_refinement() {
    let mut tree = WaypointQuadtree::master();
    // 200 points but only one unique location: must stay terminal
    for i in 0..200 {
        tree.insert(pt(40.0, -75.0, i));
    }
    assert_eq!(tree.size(), 200);
    assert_eq!(tree.total_nodes(), 1);
    assert!(tree.is_valid());
}

#[test]
fn near_miss_crosses_refined_quadrant_boundaries() {
    let mut tree = WaypointQuadtree::master();
    for i in 0..60 {
        tree.insert(pt(10.0 + i as f64, 10.0 + i as f64, i));
    }
    assert!(tree.total_nodes() > 1);
    // a pair straddling a midpoint split must still see each other
    tree.insert(pt(-0.0001, -0.0001, 100));
    tree.insert(pt(0.0001, 0.0001, 101));
    assert_eq!(
        tree.near_miss_points(-0.0001, -0.0001, 0.0005),
        vec![WaypointId(101)]
    );
    assert_eq!(
        tree.near_miss_points(0.0001, 0.0001, 0.0005),
        vec![WaypointId(100)]
    );
}

#[test]
fn sort_orders_each_bucket_by_key() {
    let mut tree = WaypointQuadtree::master();
    tree.insert(pt(40.0, -75.0, 3));
    tree.insert(pt(40.1, -75.1, 1));
    tree.insert(pt(40.2, -75.2, 2));
    tree.sort_points(&|id| format!("key{:03}", id.0));
    assert_eq!(
        tree.point_list(),
        vec![WaypointId(1), WaypointId(2), WaypointId(3)]
    );
}
