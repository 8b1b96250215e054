//! Semicolon-separated catalog files: continents, countries, regions, the
//! systems list, per-system route lists, and connected-route lists.

use std::io::Write as _;
use std::path::Path;
use std::str::FromStr;

use crate::errors::ErrorList;
use crate::model::{
    ConnectedRoute, HighwaySystem, Network, Route, RouteId, SystemId, SystemLevel,
};
use crate::ui;

/// A region row joined against the country and continent catalogs.
#[derive(Clone, Debug)]
pub struct RegionRecord {
    pub code: String,
    pub name: String,
    pub country: String,
    pub continent: String,
    pub regiontype: String,
}

fn read_lines(path: &Path, el: &ErrorList) -> Option<Vec<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content.lines().map(str::to_string).collect()),
        Err(e) => {
            el.add_error(format!("{}: {}", path.display(), e));
            None
        }
    }
}

/// Two-field `code;name` catalogs (continents and countries).
pub fn read_code_name_csv(path: &Path, what: &str, el: &ErrorList) -> Vec<(String, String)> {
    let Some(lines) = read_lines(path, el) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for line in lines.iter().skip(1) {
        let fields: Vec<&str> = line.split(';').collect();
        if fields.len() != 2 {
            el.add_error(format!("Could not parse {what} line: {line}"));
            continue;
        }
        out.push((fields[0].to_string(), fields[1].to_string()));
    }
    out
}

/// `regions.csv`: code, name, country, continent, region type. Country and
/// continent must exist in their catalogs.
pub fn read_regions(
    path: &Path,
    countries: &[(String, String)],
    continents: &[(String, String)],
    el: &ErrorList,
) -> Vec<RegionRecord> {
    let Some(lines) = read_lines(path, el) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for line in lines.iter().skip(1) {
        let fields: Vec<&str> = line.split(';').collect();
        if fields.len() != 5 {
            el.add_error(format!("Could not parse regions.csv line: {line}"));
            continue;
        }
        if !countries.iter().any(|(code, _)| code == fields[2]) {
            el.add_error(format!("Could not find country matching regions.csv line: {line}"));
            continue;
        }
        if !continents.iter().any(|(code, _)| code == fields[3]) {
            el.add_error(format!(
                "Could not find continent matching regions.csv line: {line}"
            ));
            continue;
        }
        out.push(RegionRecord {
            code: fields[0].to_string(),
            name: fields[1].to_string(),
            country: fields[2].to_string(),
            continent: fields[3].to_string(),
            regiontype: fields[4].to_string(),
        });
    }
    out
}

/// Read the systems file and, for each system, its route list and
/// connected-route list. `#` lines in the systems file are comments,
/// reported after the read so the progress dots stay on one line.
pub fn read_systems(
    net: &mut Network,
    hwy_path: &Path,
    systemsfile: &str,
    el: &ErrorList,
) {
    let path = hwy_path.join(systemsfile);
    let Some(lines) = read_lines(&path, el) else {
        return;
    };

    let mut ignoring = Vec::new();
    for line in lines.iter().skip(1) {
        if line.starts_with('#') {
            ignoring.push(format!("Ignored comment in {systemsfile}: {line}"));
            continue;
        }
        let fields: Vec<&str> = line.split(';').collect();
        if fields.len() != 6 {
            el.add_error(format!("Could not parse {systemsfile} line: {line}"));
            continue;
        }
        print!("{}.", fields[0]);
        std::io::stdout().flush().ok();
        let tier = match fields[4].parse::<i64>() {
            Ok(t) => t,
            Err(_) => {
                el.add_error(format!("Invalid tier in {systemsfile} line: {line}"));
                continue;
            }
        };
        let level = match SystemLevel::from_str(fields[5]) {
            Ok(l) => l,
            Err(e) => {
                el.add_error(format!("{e} in {systemsfile} line: {line}"));
                continue;
            }
        };

        let sysid = SystemId(net.systems.len());
        net.systems.push(HighwaySystem::new(
            fields[0].to_string(),
            fields[1].to_string(),
            fields[2].to_string(),
            fields[3].to_string(),
            tier,
            level,
        ));
        let systems_dir = hwy_path.join("hwy_data").join("_systems");
        read_route_list(net, sysid, &systems_dir, el);
        read_con_routes(net, sysid, &systems_dir, el);
    }
    println!();
    for line in ignoring {
        ui::info(line);
    }
}

/// `<system>.csv`: one route per line, eight fields.
fn read_route_list(net: &mut Network, sysid: SystemId, systems_dir: &Path, el: &ErrorList) {
    let name = net.system(sysid).name.clone();
    let path = systems_dir.join(format!("{name}.csv"));
    let Some(lines) = read_lines(&path, el) else {
        return;
    };

    for line in lines.iter().skip(1) {
        let fields: Vec<&str> = line.split(';').collect();
        if fields.len() != 8 {
            el.add_error(format!(
                "Could not parse csv line: [{line}], expected 8 fields, found {}",
                fields.len()
            ));
            continue;
        }
        if fields[0] != name {
            el.add_error(format!("System mismatch parsing line [{line}], expected {name}"));
        }
        let alt_route_names = fields[7]
            .split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let rid = RouteId(net.routes.len());
        net.routes.push(Route::new(
            sysid,
            fields[1].to_string(),
            fields[2].to_string(),
            fields[3].to_string(),
            fields[4].to_string(),
            fields[5].to_string(),
            fields[6].to_string(),
            alt_route_names,
        ));
        net.system_mut(sysid).routes.push(rid);
    }
}

/// `<system>_con.csv`: five fields, the last a comma-separated list of roots
/// already defined in this system.
fn read_con_routes(net: &mut Network, sysid: SystemId, systems_dir: &Path, el: &ErrorList) {
    let name = net.system(sysid).name.clone();
    let path = systems_dir.join(format!("{name}_con.csv"));
    let Some(lines) = read_lines(&path, el) else {
        return;
    };

    for line in lines.iter().skip(1) {
        let fields: Vec<&str> = line.split(';').collect();
        if fields.len() != 5 {
            el.add_error(format!(
                "Could not parse _con.csv line: [{line}] expected 5 fields, found {}",
                fields.len()
            ));
            continue;
        }
        if fields[0] != name {
            el.add_error(format!("System mismatch parsing line [{line}], expected {name}"));
        }

        let mut roots = Vec::new();
        for (order, root) in fields[4].split(',').enumerate() {
            let found = net
                .system(sysid)
                .routes
                .iter()
                .copied()
                .find(|&rid| net.route(rid).root == root);
            match found {
                Some(rid) => {
                    net.route_mut(rid).root_order = order as i64;
                    roots.push(rid);
                }
                None => el.add_error(format!(
                    "Could not find Route matching root {root} in system {name}."
                )),
            }
        }
        if roots.is_empty() {
            el.add_error(format!("No roots in _con.csv line [{line}]"));
        }
        net.system_mut(sysid).con_routes.push(ConnectedRoute {
            system: sysid,
            route: fields[1].to_string(),
            banner: fields[2].to_string(),
            groupname: fields[3].to_string(),
            roots,
            mileage: 0.0,
        });
    }
}

/// Five-field update history files (`updates.csv`, `systemupdates.csv`),
/// kept as raw field arrays for the database emitters.
pub fn read_updates_csv(path: &Path, what: &str, el: &ErrorList) -> Vec<[String; 5]> {
    let Some(lines) = read_lines(path, el) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for line in lines.iter().skip(1) {
        let fields: Vec<&str> = line.split(';').collect();
        if fields.len() != 5 {
            ui::warning(format!("Could not parse {what} line: {line}"));
            continue;
        }
        out.push([
            fields[0].to_string(),
            fields[1].to_string(),
            fields[2].to_string(),
            fields[3].to_string(),
            fields[4].to_string(),
        ]);
    }
    out
}
