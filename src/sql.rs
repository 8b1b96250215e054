//! Emission of the relational-database load script: DROP/CREATE/INSERT
//! statements for every table the site consumes, in foreign-key-safe order.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::datacheck::DatacheckEntry;
use crate::graph::GraphListEntry;
use crate::mileage::MileageTotals;
use crate::model::{Network, Traveler, WaypointId};
use crate::parse::catalog::RegionRecord;
use crate::stats::ClinchedDbValues;

/// Rows are inserted in batches this large to keep statement sizes sane.
const INSERT_BATCH: usize = 10_000;

/// Everything the script emitter consumes, read-only.
pub struct SqlInputs<'a> {
    pub net: &'a Network,
    pub travelers: &'a [Traveler],
    pub totals: &'a MileageTotals,
    pub clinched_values: &'a ClinchedDbValues,
    pub datacheck: &'a [DatacheckEntry],
    pub regions: &'a [RegionRecord],
    pub countries: &'a [(String, String)],
    pub continents: &'a [(String, String)],
    pub updates: &'a [[String; 5]],
    pub systemupdates: &'a [[String; 5]],
    pub graph_types: &'a [(String, String, String)],
    pub graphs: &'a [GraphListEntry],
    pub skipgraphs: bool,
}

/// Double single quotes for SQL string literals.
fn q(s: &str) -> String {
    s.replace('\'', "''")
}

fn write_batched<W: Write>(
    f: &mut W,
    table: &str,
    rows: &[String],
) -> std::io::Result<()> {
    for chunk in rows.chunks(INSERT_BATCH) {
        writeln!(f, "INSERT INTO {table} VALUES")?;
        for (i, row) in chunk.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            writeln!(f, "{row}")?;
        }
        writeln!(f, ";")?;
    }
    Ok(())
}

fn write_insert<W: Write>(f: &mut W, table: &str, rows: &[String]) -> std::io::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    writeln!(f, "INSERT INTO {table} VALUES")?;
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        writeln!(f, "{row}")?;
    }
    writeln!(f, ";")?;
    Ok(())
}

pub fn write_sql_file(inputs: &SqlInputs<'_>, path: &Path) -> Result<()> {
    let net = inputs.net;
    let mut f = BufWriter::new(
        File::create(path).with_context(|| format!("creating {}", path.display()))?,
    );

    // drop in reverse dependency order to avoid foreign key errors
    for table in [
        "datacheckErrors",
        "clinchedConnectedRoutes",
        "clinchedRoutes",
        "clinchedOverallMileageByRegion",
        "clinchedSystemMileageByRegion",
        "overallMileageByRegion",
        "systemMileageByRegion",
        "clinched",
        "segments",
        "waypoints",
        "connectedRouteRoots",
        "connectedRoutes",
        "routes",
        "systems",
        "updates",
        "systemUpdates",
        "regions",
        "countries",
        "continents",
    ] {
        writeln!(f, "DROP TABLE IF EXISTS {table};")?;
    }

    writeln!(
        f,
        "CREATE TABLE continents (code VARCHAR(3), name VARCHAR(15), PRIMARY KEY(code));"
    )?;
    let rows: Vec<String> = inputs
        .continents
        .iter()
        .map(|(code, name)| format!("('{}','{}')", q(code), q(name)))
        .collect();
    write_insert(&mut f, "continents", &rows)?;

    writeln!(
        f,
        "CREATE TABLE countries (code VARCHAR(3), name VARCHAR(32), PRIMARY KEY(code));"
    )?;
    let rows: Vec<String> = inputs
        .countries
        .iter()
        .map(|(code, name)| format!("('{}','{}')", q(code), q(name)))
        .collect();
    write_insert(&mut f, "countries", &rows)?;

    writeln!(
        f,
        "CREATE TABLE regions (code VARCHAR(8), name VARCHAR(48), country VARCHAR(3), continent VARCHAR(3), regiontype VARCHAR(32), PRIMARY KEY(code), FOREIGN KEY (country) REFERENCES countries(code), FOREIGN KEY (continent) REFERENCES continents(code));"
    )?;
    let rows: Vec<String> = inputs
        .regions
        .iter()
        .map(|r| {
            format!(
                "('{}','{}','{}','{}','{}')",
                q(&r.code),
                q(&r.name),
                q(&r.country),
                q(&r.continent),
                q(&r.regiontype)
            )
        })
        .collect();
    write_insert(&mut f, "regions", &rows)?;

    writeln!(
        f,
        "CREATE TABLE systems (systemName VARCHAR(10), countryCode CHAR(3), fullName VARCHAR(60), color VARCHAR(16), level VARCHAR(10), tier INTEGER, csvOrder INTEGER, PRIMARY KEY(systemName));"
    )?;
    let rows: Vec<String> = net
        .systems
        .iter()
        .enumerate()
        .map(|(csv_order, h)| {
            format!(
                "('{}','{}','{}','{}','{}','{}','{}')",
                q(&h.name),
                q(&h.country),
                q(&h.fullname),
                q(&h.color),
                h.level,
                h.tier,
                csv_order
            )
        })
        .collect();
    write_insert(&mut f, "systems", &rows)?;

    writeln!(
        f,
        "CREATE TABLE routes (systemName VARCHAR(10), region VARCHAR(8), route VARCHAR(16), banner VARCHAR(6), abbrev VARCHAR(3), city VARCHAR(100), root VARCHAR(32), mileage FLOAT, rootOrder INTEGER, csvOrder INTEGER, PRIMARY KEY(root), FOREIGN KEY (systemName) REFERENCES systems(systemName));"
    )?;
    let mut rows = Vec::new();
    let mut csv_order = 0;
    for h in &net.systems {
        for &rid in &h.routes {
            let r = net.route(rid);
            rows.push(format!(
                "('{}','{}','{}','{}','{}','{}','{}','{}','{}','{}')",
                q(&h.name),
                q(&r.region),
                q(&r.route),
                q(&r.banner),
                q(&r.abbrev),
                q(&r.city),
                q(&r.root),
                r.mileage,
                r.root_order,
                csv_order
            ));
            csv_order += 1;
        }
    }
    write_insert(&mut f, "routes", &rows)?;

    writeln!(
        f,
        "CREATE TABLE connectedRoutes (systemName VARCHAR(10), route VARCHAR(16), banner VARCHAR(6), groupName VARCHAR(100), firstRoot VARCHAR(32), mileage FLOAT, csvOrder INTEGER, PRIMARY KEY(firstRoot), FOREIGN KEY (firstRoot) REFERENCES routes(root));"
    )?;
    let mut rows = Vec::new();
    let mut csv_order = 0;
    for h in &net.systems {
        for cr in &h.con_routes {
            let first_root = cr
                .roots
                .first()
                .map(|&rid| net.route(rid).root.clone())
                .unwrap_or_default();
            rows.push(format!(
                "('{}','{}','{}','{}','{}','{}','{}')",
                q(&h.name),
                q(&cr.route),
                q(&cr.banner),
                q(&cr.groupname),
                q(&first_root),
                cr.mileage,
                csv_order
            ));
            csv_order += 1;
        }
    }
    write_insert(&mut f, "connectedRoutes", &rows)?;

    writeln!(
        f,
        "CREATE TABLE connectedRouteRoots (firstRoot VARCHAR(32), root VARCHAR(32), FOREIGN KEY (firstRoot) REFERENCES connectedRoutes(firstRoot));"
    )?;
    let mut rows = Vec::new();
    for h in &net.systems {
        for cr in &h.con_routes {
            if cr.roots.len() > 1 {
                let first = net.route(cr.roots[0]).root.clone();
                for &rid in &cr.roots[1..] {
                    rows.push(format!("('{}','{}')", q(&first), q(&net.route(rid).root)));
                }
            }
        }
    }
    if !rows.is_empty() {
        write_insert(&mut f, "connectedRouteRoots", &rows)?;
    }

    // waypoints are numbered in emission order; segments reference those ids
    writeln!(
        f,
        "CREATE TABLE waypoints (pointId INTEGER, pointName VARCHAR(20), latitude DOUBLE, longitude DOUBLE, root VARCHAR(32), PRIMARY KEY(pointId), FOREIGN KEY (root) REFERENCES routes(root));"
    )?;
    let mut point_num: usize = 0;
    let mut point_ids: BTreeMap<WaypointId, usize> = BTreeMap::new();
    for h in &net.systems {
        for &rid in &h.routes {
            let r = net.route(rid);
            let mut rows = Vec::new();
            for &wid in &r.points {
                let w = net.wp(wid);
                point_ids.insert(wid, point_num);
                rows.push(format!(
                    "('{}','{}','{}','{}','{}')",
                    point_num,
                    q(&w.label),
                    w.lat,
                    w.lng,
                    q(&r.root)
                ));
                point_num += 1;
            }
            if !rows.is_empty() {
                write_insert(&mut f, "waypoints", &rows)?;
            }
        }
    }
    writeln!(f, "CREATE INDEX `latitude` ON waypoints(`latitude`);")?;
    writeln!(f, "CREATE INDEX `longitude` ON waypoints(`longitude`);")?;

    writeln!(
        f,
        "CREATE TABLE segments (segmentId INTEGER, waypoint1 INTEGER, waypoint2 INTEGER, root VARCHAR(32), PRIMARY KEY (segmentId), FOREIGN KEY (waypoint1) REFERENCES waypoints(pointId), FOREIGN KEY (waypoint2) REFERENCES waypoints(pointId), FOREIGN KEY (root) REFERENCES routes(root));"
    )?;
    let mut segment_num: usize = 0;
    let mut clinched_rows = Vec::new();
    for h in &net.systems {
        for &rid in &h.routes {
            let r = net.route(rid);
            let mut rows = Vec::new();
            for &sid in &r.segments {
                let s = net.seg(sid);
                rows.push(format!(
                    "('{}','{}','{}','{}')",
                    segment_num,
                    point_ids.get(&s.waypoint1).copied().unwrap_or(0),
                    point_ids.get(&s.waypoint2).copied().unwrap_or(0),
                    q(&r.root)
                ));
                for &tid in &s.clinched_by {
                    clinched_rows.push(format!(
                        "('{}','{}')",
                        segment_num,
                        q(&inputs.travelers[tid.0].name)
                    ));
                }
                segment_num += 1;
            }
            if !rows.is_empty() {
                write_insert(&mut f, "segments", &rows)?;
            }
        }
    }

    writeln!(
        f,
        "CREATE TABLE clinched (segmentId INTEGER, traveler VARCHAR(48), FOREIGN KEY (segmentId) REFERENCES segments(segmentId));"
    )?;
    write_batched(&mut f, "clinched", &clinched_rows)?;

    writeln!(
        f,
        "CREATE TABLE overallMileageByRegion (region VARCHAR(8), activeMileage FLOAT, activePreviewMileage FLOAT);"
    )?;
    let rows: Vec<String> = inputs
        .totals
        .active_preview_by_region
        .iter()
        .map(|(region, &preview)| {
            let active = inputs
                .totals
                .active_only_by_region
                .get(region)
                .copied()
                .unwrap_or(0.0);
            format!("('{}','{}','{}')", q(region), active, preview)
        })
        .collect();
    write_insert(&mut f, "overallMileageByRegion", &rows)?;

    writeln!(
        f,
        "CREATE TABLE systemMileageByRegion (systemName VARCHAR(10), region VARCHAR(8), mileage FLOAT, FOREIGN KEY (systemName) REFERENCES systems(systemName));"
    )?;
    let mut rows = Vec::new();
    for h in &net.systems {
        if h.active_or_preview() {
            for (region, miles) in &h.mileage_by_region {
                rows.push(format!("('{}','{}','{}')", q(&h.name), q(region), miles));
            }
        }
    }
    write_insert(&mut f, "systemMileageByRegion", &rows)?;

    writeln!(
        f,
        "CREATE TABLE clinchedOverallMileageByRegion (region VARCHAR(8), traveler VARCHAR(48), activeMileage FLOAT, activePreviewMileage FLOAT);"
    )?;
    let mut rows = Vec::new();
    for t in inputs.travelers {
        for (region, preview) in &t.active_preview_mileage_by_region {
            let active = t
                .active_only_mileage_by_region
                .get(region)
                .copied()
                .unwrap_or(0.0);
            rows.push(format!(
                "('{}','{}','{}','{}')",
                q(region),
                q(&t.name),
                active,
                preview
            ));
        }
    }
    write_insert(&mut f, "clinchedOverallMileageByRegion", &rows)?;

    writeln!(
        f,
        "CREATE TABLE clinchedSystemMileageByRegion (systemName VARCHAR(10), region VARCHAR(8), traveler VARCHAR(48), mileage FLOAT, FOREIGN KEY (systemName) REFERENCES systems(systemName));"
    )?;
    let rows: Vec<String> = inputs
        .clinched_values
        .csmbr
        .iter()
        .map(|(system, region, traveler, miles)| {
            format!("('{}','{}','{}','{}')", q(system), q(region), q(traveler), miles)
        })
        .collect();
    write_insert(&mut f, "clinchedSystemMileageByRegion", &rows)?;

    writeln!(
        f,
        "CREATE TABLE clinchedConnectedRoutes (route VARCHAR(32), traveler VARCHAR(48), mileage FLOAT, clinched BOOLEAN, FOREIGN KEY (route) REFERENCES connectedRoutes(firstRoot));"
    )?;
    let rows: Vec<String> = inputs
        .clinched_values
        .ccr
        .iter()
        .map(|(root, traveler, miles, clinched)| {
            format!(
                "('{}','{}','{}','{}')",
                q(root),
                q(traveler),
                miles,
                if *clinched { '1' } else { '0' }
            )
        })
        .collect();
    write_batched(&mut f, "clinchedConnectedRoutes", &rows)?;

    writeln!(
        f,
        "CREATE TABLE clinchedRoutes (route VARCHAR(32), traveler VARCHAR(48), mileage FLOAT, clinched BOOLEAN, FOREIGN KEY (route) REFERENCES routes(root));"
    )?;
    let rows: Vec<String> = inputs
        .clinched_values
        .cr
        .iter()
        .map(|(root, traveler, miles, clinched)| {
            format!(
                "('{}','{}','{}','{}')",
                q(root),
                q(traveler),
                miles,
                if *clinched { '1' } else { '0' }
            )
        })
        .collect();
    write_batched(&mut f, "clinchedRoutes", &rows)?;

    writeln!(
        f,
        "CREATE TABLE updates (date VARCHAR(10), region VARCHAR(60), route VARCHAR(80), root VARCHAR(32), description VARCHAR(1024));"
    )?;
    let rows: Vec<String> = inputs
        .updates
        .iter()
        .map(|u| {
            format!(
                "('{}','{}','{}','{}','{}')",
                q(&u[0]),
                q(&u[1]),
                q(&u[2]),
                q(&u[3]),
                q(&u[4])
            )
        })
        .collect();
    write_insert(&mut f, "updates", &rows)?;

    writeln!(
        f,
        "CREATE TABLE systemUpdates (date VARCHAR(10), region VARCHAR(48), systemName VARCHAR(10), description VARCHAR(128), statusChange VARCHAR(16));"
    )?;
    let rows: Vec<String> = inputs
        .systemupdates
        .iter()
        .map(|u| {
            format!(
                "('{}','{}','{}','{}','{}')",
                q(&u[0]),
                q(&u[1]),
                q(&u[2]),
                q(&u[3]),
                q(&u[4])
            )
        })
        .collect();
    write_insert(&mut f, "systemUpdates", &rows)?;

    writeln!(
        f,
        "CREATE TABLE datacheckErrors (route VARCHAR(32), label1 VARCHAR(50), label2 VARCHAR(20), label3 VARCHAR(20), code VARCHAR(20), value VARCHAR(32), falsePositive BOOLEAN, FOREIGN KEY (route) REFERENCES routes(root));"
    )?;
    let rows: Vec<String> = inputs
        .datacheck
        .iter()
        .map(|d| {
            let l = |i: usize| d.labels.get(i).map(String::as_str).unwrap_or("");
            format!(
                "('{}','{}','{}','{}','{}','{}','{}')",
                q(&net.route(d.route).root),
                q(l(0)),
                q(l(1)),
                q(l(2)),
                d.code.as_str(),
                q(&d.info.render()),
                if d.fp { '1' } else { '0' }
            )
        })
        .collect();
    write_insert(&mut f, "datacheckErrors", &rows)?;

    if !inputs.skipgraphs {
        writeln!(f, "DROP TABLE IF EXISTS graphs;")?;
        writeln!(f, "DROP TABLE IF EXISTS graphTypes;")?;
        writeln!(
            f,
            "CREATE TABLE graphTypes (category VARCHAR(12), descr VARCHAR(100), longDescr TEXT, PRIMARY KEY(category));"
        )?;
        if !inputs.graph_types.is_empty() {
            let rows: Vec<String> = inputs
                .graph_types
                .iter()
                .map(|(category, descr, long_descr)| {
                    format!("('{}','{}','{}')", q(category), q(descr), q(long_descr))
                })
                .collect();
            write_insert(&mut f, "graphTypes", &rows)?;
        }
        writeln!(
            f,
            "CREATE TABLE graphs (filename VARCHAR(32), descr VARCHAR(100), vertices INTEGER, edges INTEGER, format VARCHAR(10), category VARCHAR(12), FOREIGN KEY (category) REFERENCES graphTypes(category));"
        )?;
        if !inputs.graphs.is_empty() {
            let rows: Vec<String> = inputs
                .graphs
                .iter()
                .map(|g| {
                    format!(
                        "('{}','{}','{}','{}','{}','{}')",
                        q(&g.filename),
                        q(&g.descr),
                        g.vertices,
                        g.edges,
                        q(&g.format),
                        q(&g.category)
                    )
                })
                .collect();
            write_insert(&mut f, "graphs", &rows)?;
        }
    }

    f.flush()?;
    Ok(())
}
