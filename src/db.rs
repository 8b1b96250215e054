//! Optional local SQLite materialization of the relational data, for
//! inspecting a run's output without loading the `.sql` script into a
//! server. Schema creation and bulk insert run inside one transaction.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction, params};

use crate::model::WaypointId;
use crate::sql::SqlInputs;

pub fn open_db(path: &Path) -> Result<Connection> {
    let con = Connection::open(path)
        .with_context(|| format!("Failed to open SQLite DB at {}", path.display()))?;
    Ok(con)
}

fn create_schema(con: &Connection, with_graphs: bool) -> Result<()> {
    con.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;

        DROP TABLE IF EXISTS datacheckErrors;
        DROP TABLE IF EXISTS clinchedConnectedRoutes;
        DROP TABLE IF EXISTS clinchedRoutes;
        DROP TABLE IF EXISTS clinchedOverallMileageByRegion;
        DROP TABLE IF EXISTS clinchedSystemMileageByRegion;
        DROP TABLE IF EXISTS overallMileageByRegion;
        DROP TABLE IF EXISTS systemMileageByRegion;
        DROP TABLE IF EXISTS clinched;
        DROP TABLE IF EXISTS segments;
        DROP TABLE IF EXISTS waypoints;
        DROP TABLE IF EXISTS connectedRouteRoots;
        DROP TABLE IF EXISTS connectedRoutes;
        DROP TABLE IF EXISTS routes;
        DROP TABLE IF EXISTS systems;
        DROP TABLE IF EXISTS updates;
        DROP TABLE IF EXISTS systemUpdates;
        DROP TABLE IF EXISTS regions;
        DROP TABLE IF EXISTS countries;
        DROP TABLE IF EXISTS continents;

        CREATE TABLE continents (code TEXT PRIMARY KEY, name TEXT NOT NULL);
        CREATE TABLE countries  (code TEXT PRIMARY KEY, name TEXT NOT NULL);
        CREATE TABLE regions (
            code       TEXT PRIMARY KEY,
            name       TEXT NOT NULL,
            country    TEXT REFERENCES countries(code),
            continent  TEXT REFERENCES continents(code),
            regiontype TEXT
        );
        CREATE TABLE systems (
            systemName  TEXT PRIMARY KEY,
            countryCode TEXT,
            fullName    TEXT,
            color       TEXT,
            level       TEXT,
            tier        INTEGER,
            csvOrder    INTEGER
        );
        CREATE TABLE routes (
            systemName TEXT REFERENCES systems(systemName),
            region     TEXT,
            route      TEXT,
            banner     TEXT,
            abbrev     TEXT,
            city       TEXT,
            root       TEXT PRIMARY KEY,
            mileage    REAL,
            rootOrder  INTEGER,
            csvOrder   INTEGER
        );
        CREATE TABLE connectedRoutes (
            systemName TEXT,
            route      TEXT,
            banner     TEXT,
            groupName  TEXT,
            firstRoot  TEXT PRIMARY KEY REFERENCES routes(root),
            mileage    REAL,
            csvOrder   INTEGER
        );
        CREATE TABLE connectedRouteRoots (
            firstRoot TEXT REFERENCES connectedRoutes(firstRoot),
            root      TEXT
        );
        CREATE TABLE waypoints (
            pointId   INTEGER PRIMARY KEY,
            pointName TEXT,
            latitude  REAL,
            longitude REAL,
            root      TEXT REFERENCES routes(root)
        );
        CREATE INDEX idx_waypoints_latitude  ON waypoints(latitude);
        CREATE INDEX idx_waypoints_longitude ON waypoints(longitude);
        CREATE TABLE segments (
            segmentId INTEGER PRIMARY KEY,
            waypoint1 INTEGER REFERENCES waypoints(pointId),
            waypoint2 INTEGER REFERENCES waypoints(pointId),
            root      TEXT REFERENCES routes(root)
        );
        CREATE TABLE clinched (
            segmentId INTEGER REFERENCES segments(segmentId),
            traveler  TEXT
        );
        CREATE TABLE overallMileageByRegion (
            region               TEXT,
            activeMileage        REAL,
            activePreviewMileage REAL
        );
        CREATE TABLE systemMileageByRegion (
            systemName TEXT REFERENCES systems(systemName),
            region     TEXT,
            mileage    REAL
        );
        CREATE TABLE clinchedOverallMileageByRegion (
            region               TEXT,
            traveler             TEXT,
            activeMileage        REAL,
            activePreviewMileage REAL
        );
        CREATE TABLE clinchedSystemMileageByRegion (
            systemName TEXT,
            region     TEXT,
            traveler   TEXT,
            mileage    REAL
        );
        CREATE TABLE clinchedConnectedRoutes (
            route    TEXT,
            traveler TEXT,
            mileage  REAL,
            clinched INTEGER
        );
        CREATE TABLE clinchedRoutes (
            route    TEXT,
            traveler TEXT,
            mileage  REAL,
            clinched INTEGER
        );
        CREATE TABLE updates (
            date        TEXT,
            region      TEXT,
            route       TEXT,
            root        TEXT,
            description TEXT
        );
        CREATE TABLE systemUpdates (
            date         TEXT,
            region       TEXT,
            systemName   TEXT,
            description  TEXT,
            statusChange TEXT
        );
        CREATE TABLE datacheckErrors (
            route         TEXT REFERENCES routes(root),
            label1        TEXT,
            label2        TEXT,
            label3        TEXT,
            code          TEXT,
            value         TEXT,
            falsePositive INTEGER
        );
        "#,
    )?;

    if with_graphs {
        con.execute_batch(
            r#"
            DROP TABLE IF EXISTS graphs;
            DROP TABLE IF EXISTS graphTypes;

            CREATE TABLE graphTypes (
                category  TEXT PRIMARY KEY,
                descr     TEXT,
                longDescr TEXT
            );
            CREATE TABLE graphs (
                filename TEXT,
                descr    TEXT,
                vertices INTEGER,
                edges    INTEGER,
                format   TEXT,
                category TEXT REFERENCES graphTypes(category)
            );
            "#,
        )?;
    }
    Ok(())
}

fn insert_all(tx: &Transaction<'_>, inputs: &SqlInputs<'_>) -> Result<()> {
    let net = inputs.net;

    {
        let mut stmt = tx.prepare("INSERT INTO continents(code, name) VALUES (?1, ?2)")?;
        for (code, name) in inputs.continents {
            stmt.execute(params![code, name])?;
        }
    }
    {
        let mut stmt = tx.prepare("INSERT INTO countries(code, name) VALUES (?1, ?2)")?;
        for (code, name) in inputs.countries {
            stmt.execute(params![code, name])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO regions(code, name, country, continent, regiontype) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for r in inputs.regions {
            stmt.execute(params![r.code, r.name, r.country, r.continent, r.regiontype])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO systems(systemName, countryCode, fullName, color, level, tier, csvOrder) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for (csv_order, h) in net.systems.iter().enumerate() {
            stmt.execute(params![
                h.name,
                h.country,
                h.fullname,
                h.color,
                h.level.to_string(),
                h.tier,
                csv_order as i64
            ])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO routes(systemName, region, route, banner, abbrev, city, root, mileage, rootOrder, csvOrder) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        let mut csv_order = 0i64;
        for h in &net.systems {
            for &rid in &h.routes {
                let r = net.route(rid);
                stmt.execute(params![
                    h.name, r.region, r.route, r.banner, r.abbrev, r.city, r.root,
                    r.mileage, r.root_order, csv_order
                ])?;
                csv_order += 1;
            }
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO connectedRoutes(systemName, route, banner, groupName, firstRoot, mileage, csvOrder) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        let mut root_stmt = tx
            .prepare("INSERT INTO connectedRouteRoots(firstRoot, root) VALUES (?1, ?2)")?;
        let mut csv_order = 0i64;
        for h in &net.systems {
            for cr in &h.con_routes {
                let Some(&first) = cr.roots.first() else {
                    continue;
                };
                let first_root = &net.route(first).root;
                stmt.execute(params![
                    h.name, cr.route, cr.banner, cr.groupname, first_root, cr.mileage,
                    csv_order
                ])?;
                for &rid in &cr.roots[1..] {
                    root_stmt.execute(params![first_root, net.route(rid).root])?;
                }
                csv_order += 1;
            }
        }
    }

    let mut point_ids = std::collections::BTreeMap::<WaypointId, i64>::new();
    {
        let mut stmt = tx.prepare(
            "INSERT INTO waypoints(pointId, pointName, latitude, longitude, root) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        let mut point_num = 0i64;
        for h in &net.systems {
            for &rid in &h.routes {
                let r = net.route(rid);
                for &wid in &r.points {
                    let w = net.wp(wid);
                    point_ids.insert(wid, point_num);
                    stmt.execute(params![point_num, w.label, w.lat, w.lng, r.root])?;
                    point_num += 1;
                }
            }
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO segments(segmentId, waypoint1, waypoint2, root) VALUES (?1, ?2, ?3, ?4)",
        )?;
        let mut clinched_stmt =
            tx.prepare("INSERT INTO clinched(segmentId, traveler) VALUES (?1, ?2)")?;
        let mut segment_num = 0i64;
        for h in &net.systems {
            for &rid in &h.routes {
                let r = net.route(rid);
                for &sid in &r.segments {
                    let s = net.seg(sid);
                    stmt.execute(params![
                        segment_num,
                        point_ids.get(&s.waypoint1),
                        point_ids.get(&s.waypoint2),
                        r.root
                    ])?;
                    for &tid in &s.clinched_by {
                        clinched_stmt
                            .execute(params![segment_num, inputs.travelers[tid.0].name])?;
                    }
                    segment_num += 1;
                }
            }
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO overallMileageByRegion(region, activeMileage, activePreviewMileage) VALUES (?1, ?2, ?3)",
        )?;
        for (region, &preview) in &inputs.totals.active_preview_by_region {
            let active = inputs
                .totals
                .active_only_by_region
                .get(region)
                .copied()
                .unwrap_or(0.0);
            stmt.execute(params![region, active, preview])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO systemMileageByRegion(systemName, region, mileage) VALUES (?1, ?2, ?3)",
        )?;
        for h in &net.systems {
            if h.active_or_preview() {
                for (region, miles) in &h.mileage_by_region {
                    stmt.execute(params![h.name, region, miles])?;
                }
            }
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO clinchedOverallMileageByRegion(region, traveler, activeMileage, activePreviewMileage) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for t in inputs.travelers {
            for (region, preview) in &t.active_preview_mileage_by_region {
                let active = t
                    .active_only_mileage_by_region
                    .get(region)
                    .copied()
                    .unwrap_or(0.0);
                stmt.execute(params![region, t.name, active, preview])?;
            }
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO clinchedSystemMileageByRegion(systemName, region, traveler, mileage) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (system, region, traveler, miles) in &inputs.clinched_values.csmbr {
            stmt.execute(params![system, region, traveler, miles])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO clinchedConnectedRoutes(route, traveler, mileage, clinched) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (root, traveler, miles, clinched) in &inputs.clinched_values.ccr {
            stmt.execute(params![root, traveler, miles, clinched])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO clinchedRoutes(route, traveler, mileage, clinched) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (root, traveler, miles, clinched) in &inputs.clinched_values.cr {
            stmt.execute(params![root, traveler, miles, clinched])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO updates(date, region, route, root, description) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for u in inputs.updates {
            stmt.execute(params![u[0], u[1], u[2], u[3], u[4]])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO systemUpdates(date, region, systemName, description, statusChange) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for u in inputs.systemupdates {
            stmt.execute(params![u[0], u[1], u[2], u[3], u[4]])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO datacheckErrors(route, label1, label2, label3, code, value, falsePositive) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for d in inputs.datacheck {
            let l = |i: usize| d.labels.get(i).map(String::as_str).unwrap_or("");
            stmt.execute(params![
                net.route(d.route).root,
                l(0),
                l(1),
                l(2),
                d.code.as_str(),
                d.info.render(),
                d.fp
            ])?;
        }
    }
    if !inputs.skipgraphs {
        let mut stmt = tx.prepare(
            "INSERT INTO graphTypes(category, descr, longDescr) VALUES (?1, ?2, ?3)",
        )?;
        for (category, descr, long_descr) in inputs.graph_types {
            stmt.execute(params![category, descr, long_descr])?;
        }
        let mut stmt = tx.prepare(
            "INSERT INTO graphs(filename, descr, vertices, edges, format, category) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for g in inputs.graphs {
            stmt.execute(params![
                g.filename,
                g.descr,
                g.vertices as i64,
                g.edges as i64,
                g.format,
                g.category
            ])?;
        }
    }
    Ok(())
}

/// Create (or replace) the tables in the database at `path` and load the
/// whole run's relational content in a single transaction.
pub fn build_sqlite(inputs: &SqlInputs<'_>, path: &Path) -> Result<()> {
    let mut con = open_db(path)?;
    create_schema(&con, !inputs.skipgraphs)?;
    let tx = con.transaction()?;
    insert_all(&tx, inputs)?;
    tx.commit()?;
    Ok(())
}
