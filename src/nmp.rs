//! Near-miss point reporting: the sorted log, the plottable `.nmp` file,
//! reconciliation against the persisted false-positive list, and the
//! optional rewrite of waypoint files with near-misses merged.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::errors::ErrorList;
use crate::model::Network;
use crate::quadtree::WaypointQuadtree;

/// Coordinate deltas smaller than this (on both axes) suggest the points
/// were offset deliberately, and the pair is marked "looks intentional".
const INTENTIONAL_TOLERANCE: f64 = 0.0000015;

/// Read `nmpfps.log`, the list of near-miss log lines previously reviewed
/// and accepted as false positives.
pub fn read_nmp_fps(path: &Path, el: &ErrorList) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => content
            .lines()
            .map(|l| l.trim_end_matches([' ', '\n']).to_string())
            .filter(|l| !l.is_empty())
            .collect(),
        Err(e) => {
            el.add_error(format!("{}: {}", path.display(), e));
            Vec::new()
        }
    }
}

/// Write `nearmisspoints.log`, `tm-master.nmp`, and `nmpfpsunmatched.log`.
/// Matched or intentional-looking points have their near-miss lists
/// detached so the merged-file rewrite leaves them alone.
pub fn write_nmp_outputs(
    net: &mut Network,
    tree: &WaypointQuadtree,
    mut fp_lines: Vec<String>,
    logpath: &Path,
) -> Result<()> {
    let mut log_lines: Vec<String> = Vec::new();
    let nmp_path = logpath.join("tm-master.nmp");
    let mut nmp_file = BufWriter::new(
        File::create(&nmp_path).with_context(|| format!("creating {}", nmp_path.display()))?,
    );

    for wid in tree.point_list() {
        if net.wp(wid).near_miss_points.is_empty() {
            continue;
        }

        let mut partners = net.wp(wid).near_miss_points.clone();
        partners.sort_by_key(|&p| net.waypoint_key(p));

        let mut line = format!("{} NMP ", net.waypoint_str(wid));
        let mut looks_intentional = false;
        let mut pair_lines: Vec<String> = Vec::new();
        let w_key = net.waypoint_key(wid);
        let (w_lat, w_lng) = (net.wp(wid).lat, net.wp(wid).lng);

        for &other in &partners {
            let o = net.wp(other);
            if (w_lat - o.lat).abs() < INTENTIONAL_TOLERANCE
                && (w_lng - o.lng).abs() < INTENTIONAL_TOLERANCE
            {
                looks_intentional = true;
            }
            line.push_str(&format!("{} ", net.waypoint_str(other)));
            // each pair appears in both points' lists; plot it only from
            // the lower-keyed endpoint
            let other_key = net.waypoint_key(other);
            if w_key < other_key {
                pair_lines.push(format!("{} {:.6} {:.6}", w_key, w_lat, w_lng));
                pair_lines.push(format!("{} {:.6} {:.6}", other_key, o.lat, o.lng));
            }
        }

        let mut extra_field = String::new();
        let mut detach = false;
        let trimmed = line.trim_end().to_string();
        if let Some(pos) = fp_lines.iter().position(|l| *l == trimmed) {
            fp_lines.remove(pos);
            line.push_str("[MARKED FP]");
            detach = true;
            extra_field.push_str("FP");
        }
        if looks_intentional {
            line.push_str("[LOOKS INTENTIONAL]");
            detach = true;
            extra_field.push_str("LI");
        }
        log_lines.push(line.trim_end().to_string());

        for pair_line in &pair_lines {
            if extra_field.is_empty() {
                writeln!(nmp_file, "{pair_line}")?;
            } else {
                writeln!(nmp_file, "{pair_line} {extra_field}")?;
            }
        }

        if detach {
            net.wp_mut(wid).near_miss_points.clear();
        }
    }
    nmp_file.flush()?;

    log_lines.sort();
    let log_path = logpath.join("nearmisspoints.log");
    let mut log_file = BufWriter::new(
        File::create(&log_path).with_context(|| format!("creating {}", log_path.display()))?,
    );
    for l in &log_lines {
        writeln!(log_file, "{l}")?;
    }
    log_file.flush()?;

    let unmatched_path = logpath.join("nmpfpsunmatched.log");
    let mut unmatched = BufWriter::new(
        File::create(&unmatched_path)
            .with_context(|| format!("creating {}", unmatched_path.display()))?,
    );
    for l in &fp_lines {
        writeln!(unmatched, "{l}")?;
    }
    unmatched.flush()?;

    Ok(())
}

/// Rewrite every waypoint file under `mergepath` with near-miss points
/// merged: merged points take the northernmost latitude and easternmost
/// longitude of the set and are marked with an `https` URL.
pub fn write_nmp_merged(net: &Network, mergepath: &Path) -> Result<()> {
    for h in &net.systems {
        print!("{}", h.name);
        std::io::stdout().flush().ok();
        for &rid in &h.routes {
            let r = net.route(rid);
            let dir = mergepath.join(&r.region).join(&h.name);
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            let path = dir.join(format!("{}.wpt", r.root));
            let mut file = BufWriter::new(
                File::create(&path).with_context(|| format!("creating {}", path.display()))?,
            );
            for &wid in &r.points {
                let w = net.wp(wid);
                write!(file, "{} ", w.label)?;
                for alt in &w.alt_labels {
                    write!(file, "{alt} ")?;
                }
                if w.near_miss_points.is_empty() {
                    writeln!(
                        file,
                        "http://www.openstreetmap.org/?lat={:.6}&lon={:.6}",
                        w.lat, w.lng
                    )?;
                } else {
                    // choose the northernmost latitude and easternmost
                    // longitude of the whole near-miss set
                    let mut lat = w.lat;
                    let mut lng = w.lng;
                    for &other in &w.near_miss_points {
                        let o = net.wp(other);
                        if o.lat > lat {
                            lat = o.lat;
                        }
                        if o.lng > lng {
                            lng = o.lng;
                        }
                    }
                    writeln!(
                        file,
                        "https://www.openstreetmap.org/?lat={lat:.6}&lon={lng:.6}"
                    )?;
                }
            }
            file.flush()?;
        }
        print!(".");
        std::io::stdout().flush().ok();
    }
    println!();
    Ok(())
}
