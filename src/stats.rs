//! Statistics emission: the highway data stats log, per-traveler clinched
//! statistics (with the value lists destined for the database), and the CSV
//! stat files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::mileage::MileageTotals;
use crate::model::{Network, Traveler, TravelerId};

/// `12.34 of 56.78 mi (21.7%)`, with `-.-%` when the total is zero.
pub fn format_clinched_mi(clinched: f64, total: f64) -> String {
    let percentage = if total != 0.0 {
        format!("({:.1}%)", 100.0 * clinched / total)
    } else {
        "-.-%".to_string()
    };
    format!("{clinched:.2} of {total:.2} mi {percentage}")
}

fn pct(n: usize, d: usize) -> f64 {
    if d == 0 { 0.0 } else { 100.0 * n as f64 / d as f64 }
}

/// Write `highwaydatastats.log`: grand totals, the per-region breakdown,
/// and per-system totals by region and by (connected) route. Connected
/// route mileages are computed here from their member routes.
pub fn write_highwaydata_stats(
    net: &mut Network,
    totals: &MileageTotals,
    logpath: &Path,
    now: &str,
) -> Result<()> {
    let path = logpath.join("highwaydatastats.log");
    let mut f = BufWriter::new(
        File::create(&path).with_context(|| format!("creating {}", path.display()))?,
    );

    writeln!(f, "Travel Mapping highway mileage as of {now}")?;
    let active_only_miles: f64 = totals.active_only_by_region.values().sum();
    writeln!(f, "Active routes (active): {active_only_miles:.2} mi")?;
    let active_preview_miles: f64 = totals.active_preview_by_region.values().sum();
    writeln!(f, "Clinchable routes (active, preview): {active_preview_miles:.2} mi")?;
    let overall_miles: f64 = totals.overall_by_region.values().sum();
    writeln!(f, "All routes (active, preview, devel): {overall_miles:.2} mi")?;
    writeln!(f, "Breakdown by region:")?;

    // BTreeMap iteration is already alphabetical by region
    for (region, &overall) in &totals.overall_by_region {
        let active = totals.active_only_by_region.get(region).copied().unwrap_or(0.0);
        let preview = totals
            .active_preview_by_region
            .get(region)
            .copied()
            .unwrap_or(0.0);
        writeln!(
            f,
            "{region}: {active:.2} (active), {preview:.2} (active, preview) {overall:.2} (active, preview, devel)"
        )?;
    }

    for sidx in 0..net.systems.len() {
        let system_total: f64 = net.systems[sidx].mileage_by_region.values().sum();
        let name = net.systems[sidx].name.clone();
        writeln!(
            f,
            "System {name} ({}) total: {system_total:.2} mi",
            net.systems[sidx].level
        )?;
        if net.systems[sidx].mileage_by_region.len() > 1 {
            writeln!(f, "System {name} by region:")?;
            for (region, miles) in &net.systems[sidx].mileage_by_region {
                writeln!(f, "{region}: {miles:.2} mi")?;
            }
        }
        writeln!(f, "System {name} by route:")?;
        for cidx in 0..net.systems[sidx].con_routes.len() {
            let (con_total, to_write, readable, roots_len, only_name) = {
                let cr = &net.systems[sidx].con_routes[cidx];
                let mut con_total = 0.0;
                let mut to_write = String::new();
                for &rid in &cr.roots {
                    let r = net.route(rid);
                    to_write.push_str(&format!(
                        "  {}: {:.2} mi\n",
                        r.readable_name(),
                        r.mileage
                    ));
                    con_total += r.mileage;
                }
                let only_name = cr
                    .roots
                    .first()
                    .map(|&rid| net.route(rid).readable_name())
                    .unwrap_or_default();
                (con_total, to_write, cr.readable_name(), cr.roots.len(), only_name)
            };
            net.systems[sidx].con_routes[cidx].mileage = con_total;
            write!(f, "{readable}: {con_total:.2} mi")?;
            if roots_len == 1 {
                writeln!(f, " ({only_name} only)")?;
            } else {
                writeln!(f)?;
                write!(f, "{to_write}")?;
            }
        }
    }
    f.flush()?;
    Ok(())
}

/// Value rows for the clinched-mileage database tables, accumulated while
/// the per-traveler statistics are generated.
#[derive(Debug, Default)]
pub struct ClinchedDbValues {
    /// (system, region, traveler, mileage)
    pub csmbr: Vec<(String, String, String, f64)>,
    /// (first root, traveler, mileage, clinched)
    pub ccr: Vec<(String, String, f64, bool)>,
    /// (root, traveler, mileage, clinched)
    pub cr: Vec<(String, String, f64, bool)>,
}

/// Append clinched-statistics entries to every traveler's log and build the
/// database value lists. Assumes mileage aggregation and the highway stats
/// pass (which fixes connected-route mileages) have both run.
pub fn build_traveler_stats(
    net: &Network,
    travelers: &mut [Traveler],
    totals: &MileageTotals,
) -> ClinchedDbValues {
    let mut values = ClinchedDbValues::default();
    let active_only_miles: f64 = totals.active_only_by_region.values().sum();
    let active_preview_miles: f64 = totals.active_preview_by_region.values().sum();

    for (t_idx, t) in travelers.iter_mut().enumerate() {
        let tid = TravelerId(t_idx);
        t.log_entries.push("Clinched Highway Statistics".to_string());
        let t_active_only: f64 = t.active_only_mileage_by_region.values().sum();
        t.log_entries.push(format!(
            "Overall in active systems: {}",
            format_clinched_mi(t_active_only, active_only_miles)
        ));
        let t_active_preview: f64 = t.active_preview_mileage_by_region.values().sum();
        t.log_entries.push(format!(
            "Overall in active+preview systems: {}",
            format_clinched_mi(t_active_preview, active_preview_miles)
        ));

        t.log_entries.push(
            "Overall by region: (each line reports active only then active+preview)".to_string(),
        );
        for (region, &preview_miles) in &t.active_preview_mileage_by_region {
            let (t_active, total_active) = match t.active_only_mileage_by_region.get(region) {
                Some(&m) => (
                    m,
                    totals.active_only_by_region.get(region).copied().unwrap_or(0.0),
                ),
                None => (0.0, 0.0),
            };
            let total_preview = totals
                .active_preview_by_region
                .get(region)
                .copied()
                .unwrap_or(0.0);
            t.log_entries.push(format!(
                "{region}: {}, {}",
                format_clinched_mi(t_active, total_active),
                format_clinched_mi(preview_miles, total_preview)
            ));
        }

        let mut active_systems = 0;
        let mut preview_systems = 0;

        for h in &net.systems {
            if !h.active_or_preview() {
                continue;
            }
            if h.active() {
                active_systems += 1;
            } else {
                preview_systems += 1;
            }

            let system_total: f64 = h.mileage_by_region.values().sum();
            let t_system_overall: f64 = t
                .system_region_mileages
                .get(&h.name)
                .map(|m| m.values().sum())
                .unwrap_or(0.0);
            t.log_entries.push(format!(
                "System {} ({}) overall: {}",
                h.name,
                h.level,
                format_clinched_mi(t_system_overall, system_total)
            ));
            if t_system_overall > 0.0 {
                if h.active() {
                    t.active_systems_traveled += 1;
                } else {
                    t.preview_systems_traveled += 1;
                }
            }
            if t_system_overall == system_total {
                if h.active() {
                    t.active_systems_clinched += 1;
                } else {
                    t.preview_systems_clinched += 1;
                }
            }

            if t_system_overall > 0.0 {
                if h.mileage_by_region.len() > 1 {
                    t.log_entries.push(format!("System {} by region:", h.name));
                }
                for (region, &region_total) in &h.mileage_by_region {
                    let mut system_region_mileage = 0.0;
                    if let Some(by_region) = t.system_region_mileages.get(&h.name)
                        && let Some(&m) = by_region.get(region)
                    {
                        system_region_mileage = m;
                        values.csmbr.push((
                            h.name.clone(),
                            region.clone(),
                            t.name.clone(),
                            system_region_mileage,
                        ));
                    }
                    if h.mileage_by_region.len() > 1 {
                        t.log_entries.push(format!(
                            "  {region}: {}",
                            format_clinched_mi(system_region_mileage, region_total)
                        ));
                    }
                }

                let mut con_routes_traveled = 0;
                let mut con_routes_clinched = 0;
                t.log_entries.push(format!(
                    "System {} by route (traveled routes only):",
                    h.name
                ));
                for cr in &h.con_routes {
                    let mut con_total_miles = 0.0;
                    let mut con_clinched_miles = 0.0;
                    let mut to_write = String::new();
                    for &rid in &cr.roots {
                        let r = net.route(rid);
                        let miles = net.clinched_by_traveler(rid, tid);
                        if miles > 0.0 {
                            values.cr.push((
                                r.root.clone(),
                                t.name.clone(),
                                miles,
                                miles >= r.mileage,
                            ));
                            con_clinched_miles += miles;
                            to_write.push_str(&format!(
                                "  {}: {}\n",
                                r.readable_name(),
                                format_clinched_mi(miles, r.mileage)
                            ));
                        }
                        con_total_miles += r.mileage;
                    }
                    if con_clinched_miles > 0.0 {
                        con_routes_traveled += 1;
                        let clinched = con_clinched_miles == con_total_miles;
                        if clinched {
                            con_routes_clinched += 1;
                        }
                        if let Some(&first) = cr.roots.first() {
                            values.ccr.push((
                                net.route(first).root.clone(),
                                t.name.clone(),
                                con_clinched_miles,
                                clinched,
                            ));
                        }
                        t.log_entries.push(format!(
                            "{}: {}",
                            cr.readable_name(),
                            format_clinched_mi(con_clinched_miles, con_total_miles)
                        ));
                        if cr.roots.len() == 1 {
                            t.log_entries.push(format!(
                                " ({} only)",
                                net.route(cr.roots[0]).readable_name()
                            ));
                        } else {
                            t.log_entries.push(to_write);
                        }
                    }
                }
                t.log_entries.push(format!(
                    "System {} connected routes traveled: {} of {} ({:.1}%), clinched: {} of {} ({:.1}%).",
                    h.name,
                    con_routes_traveled,
                    h.con_routes.len(),
                    pct(con_routes_traveled, h.con_routes.len()),
                    con_routes_clinched,
                    h.con_routes.len(),
                    pct(con_routes_clinched, h.con_routes.len())
                ));
            }
        }

        t.log_entries.push(format!(
            "Traveled {} of {} ({:.1}%), Clinched {} of {} ({:.1}%) active systems",
            t.active_systems_traveled,
            active_systems,
            pct(t.active_systems_traveled, active_systems),
            t.active_systems_clinched,
            active_systems,
            pct(t.active_systems_clinched, active_systems)
        ));
        t.log_entries.push(format!(
            "Traveled {} of {} ({:.1}%), Clinched {} of {} ({:.1}%) preview systems",
            t.preview_systems_traveled,
            preview_systems,
            pct(t.preview_systems_traveled, preview_systems),
            t.preview_systems_clinched,
            preview_systems,
            pct(t.preview_systems_clinched, preview_systems)
        ));
    }

    values
}

/// Write the per-traveler-by-region CSV files: overall at the two
/// clinchable tiers, then one file per system.
pub fn write_csv_stats(
    net: &Network,
    travelers: &[Traveler],
    totals: &MileageTotals,
    csvpath: &Path,
) -> Result<()> {
    write_region_csv(
        &csvpath.join("allbyregionactiveonly.csv"),
        travelers,
        &totals.active_only_by_region,
        |t| &t.active_only_mileage_by_region,
    )?;
    write_region_csv(
        &csvpath.join("allbyregionactivepreview.csv"),
        travelers,
        &totals.active_preview_by_region,
        |t| &t.active_preview_mileage_by_region,
    )?;

    for h in &net.systems {
        let path = csvpath.join(format!("{}-all.csv", h.name));
        let mut w = csv::Writer::from_path(&path)
            .with_context(|| format!("creating {}", path.display()))?;

        let regions: Vec<&String> = h.mileage_by_region.keys().collect();
        let mut header = vec!["Traveler".to_string(), "Total".to_string()];
        header.extend(regions.iter().map(|r| r.to_string()));
        w.write_record(&header)?;

        for t in travelers {
            // only travelers with any mileage in the system get a row
            let Some(by_region) = t.system_region_mileages.get(&h.name) else {
                continue;
            };
            let total: f64 = by_region.values().sum();
            let mut record = vec![t.name.clone(), format!("{total:.2}")];
            for region in &regions {
                record.push(match by_region.get(*region) {
                    Some(m) => format!("{m:.2}"),
                    None => "0".to_string(),
                });
            }
            w.write_record(&record)?;
        }

        let total: f64 = h.mileage_by_region.values().sum();
        let mut record = vec!["TOTAL".to_string(), format!("{total:.2}")];
        record.extend(h.mileage_by_region.values().map(|m| format!("{m:.2}")));
        w.write_record(&record)?;
        w.flush()?;
    }
    Ok(())
}

fn write_region_csv<'a, F>(
    path: &Path,
    travelers: &'a [Traveler],
    totals_by_region: &std::collections::BTreeMap<String, f64>,
    get: F,
) -> Result<()>
where
    F: Fn(&'a Traveler) -> &'a std::collections::BTreeMap<String, f64>,
{
    let mut w =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;

    let regions: Vec<&String> = totals_by_region.keys().collect();
    let mut header = vec!["Traveler".to_string(), "Total".to_string()];
    header.extend(regions.iter().map(|r| r.to_string()));
    w.write_record(&header)?;

    for t in travelers {
        let by_region = get(t);
        let total: f64 = by_region.values().sum();
        let mut record = vec![t.name.clone(), format!("{total:.2}")];
        for region in &regions {
            record.push(match by_region.get(*region) {
                Some(m) => format!("{m:.2}"),
                None => "0".to_string(),
            });
        }
        w.write_record(&record)?;
    }

    let total: f64 = totals_by_region.values().sum();
    let mut record = vec!["TOTAL".to_string(), format!("{total:.2}")];
    record.extend(totals_by_region.values().map(|m| format!("{m:.2}")));
    w.write_record(&record)?;
    w.flush()?;
    Ok(())
}
