//! Traveler `.list` files: resolve each line to a route and a waypoint
//! range, and credit the segments in between.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::{Network, RouteId, Traveler, TravelerId};

/// Lookup table from `lower(region + " " + name)` to the route, covering the
/// canonical list name and every alternate route name.
pub fn build_route_map(net: &Network) -> BTreeMap<String, RouteId> {
    let mut map = BTreeMap::new();
    for h in &net.systems {
        for &rid in &h.routes {
            let r = net.route(rid);
            map.insert(
                format!("{} {}", r.region, r.list_entry_name()).to_lowercase(),
                rid,
            );
            for alt in &r.alt_route_names {
                map.insert(format!("{} {}", r.region, alt).to_lowercase(), rid);
            }
        }
    }
    map
}

/// Strip the marker characters travelers may carry over from waypoint
/// labels before case-folded comparison.
fn fold_label(label: &str, markers: &[char]) -> String {
    label.to_lowercase().trim_matches(markers).to_string()
}

/// Read one traveler's list file and credit every matched segment range.
/// Per-line problems are recorded in the traveler's log, never fatal.
pub fn read_traveler_list(
    net: &mut Network,
    tid: TravelerId,
    traveler: &mut Traveler,
    route_map: &BTreeMap<String, RouteId>,
    path: &Path,
) -> Result<()> {
    let file = path.join(format!("{}.list", traveler.name));
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("reading traveler list {}", file.display()))?;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 4 {
            traveler
                .log_entries
                .push(format!("Incorrect format line: {line}"));
            continue;
        }

        let lookup = format!("{} {}", fields[0], fields[1]).to_lowercase();
        let Some(&rid) = route_map.get(&lookup) else {
            traveler
                .log_entries
                .push(format!("Unknown region/highway combo in line: {line}"));
            continue;
        };

        let canonical = net.route(rid).list_entry_name();
        if fields[1].to_lowercase() != canonical.to_lowercase() {
            traveler.log_entries.push(format!(
                "Note: replacing deprecated route name {} with canonical name {} in line {}",
                fields[1], canonical, line
            ));
        }
        if net.route_system(rid).devel() {
            traveler.log_entries.push(format!(
                "Ignoring line matching highway in inactive system: {line}"
            ));
            continue;
        }

        match_waypoint_range(net, tid, traveler, rid, fields[2], fields[3], line);
    }

    traveler.log_entries.push(format!(
        "Processed {} good lines marking {} segments traveled.",
        traveler.good_lines,
        traveler.clinched_segments.len()
    ));
    Ok(())
}

/// Find the two label matches on the route's point list and mark every
/// segment between them as clinched. Exactly two matches are required.
fn match_waypoint_range(
    net: &mut Network,
    tid: TravelerId,
    traveler: &mut Traveler,
    rid: RouteId,
    label1: &str,
    label2: &str,
    line: &str,
) {
    let list_label_1 = fold_label(label1, &['*']);
    let list_label_2 = fold_label(label2, &['*']);

    let mut matched_indices: Vec<usize> = Vec::new();
    let mut labels_used: Vec<String> = Vec::new();
    let mut alts_used: Vec<String> = Vec::new();

    {
        let r = net.route(rid);
        for (idx, &wid) in r.points.iter().enumerate() {
            let w = net.wp(wid);
            let primary = fold_label(&w.label, &['+', '*']);
            if primary == list_label_1 || primary == list_label_2 {
                matched_indices.push(idx);
                labels_used.push(primary.to_uppercase());
            } else {
                for alt in &w.alt_labels {
                    let folded = fold_label(alt, &['+']);
                    if folded == list_label_1 || folded == list_label_2 {
                        matched_indices.push(idx);
                        labels_used.push(folded.to_uppercase());
                        alts_used.push(folded.to_uppercase());
                    }
                }
            }
        }
    }

    {
        let r = net.route_mut(rid);
        for label in labels_used {
            r.labels_in_use.insert(label);
        }
        for alt in alts_used {
            r.unused_alt_labels.remove(&alt);
        }
    }

    if matched_indices.len() != 2 {
        traveler
            .log_entries
            .push(format!("Waypoint label(s) not found in line: {line}"));
        return;
    }

    traveler.good_lines += 1;
    let (start, end) = (matched_indices[0], matched_indices[1]);
    for pos in start..end {
        let sid = net.route(rid).segments[pos];
        net.seg_mut(sid).add_clinched_by(tid);
        traveler.clinched_segments.insert(sid);
    }
}
