pub mod args;

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::correlate;
use crate::datacheck;
use crate::db;
use crate::errors::ErrorList;
use crate::graph::{GraphFilter, GraphListEntry, HighwayGraph, PlaceRadius};
use crate::mileage;
use crate::model::{Network, Traveler, TravelerId};
use crate::nmp;
use crate::parse::{catalog, list, wpt};
use crate::quadtree::WaypointQuadtree;
use crate::reports;
use crate::sql::{self, SqlInputs};
use crate::stats;
use crate::ui::{self, Stopwatch};

/// Drive the whole batch pipeline: parse, correlate, validate, match
/// travelers, aggregate mileage, and emit every artifact.
pub fn run() -> Result<()> {
    let args = args::Args::parse();
    let sw = Stopwatch::new();
    let el = ErrorList::new();
    let now = reports::now_string();

    // catalog files
    sw.status("Reading region, country, and continent descriptions.");
    let continents = catalog::read_code_name_csv(
        &args.highwaydatapath.join("continents.csv"),
        "continents.csv",
        &el,
    );
    let countries = catalog::read_code_name_csv(
        &args.highwaydatapath.join("countries.csv"),
        "countries.csv",
        &el,
    );
    let regions = catalog::read_regions(
        &args.highwaydatapath.join("regions.csv"),
        &countries,
        &continents,
        &el,
    );

    let mut net = Network::new();
    sw.status(format!(
        "Reading systems list in {}/{}.",
        args.highwaydatapath.display(),
        args.systemsfile
    ));
    catalog::read_systems(&mut net, &args.highwaydatapath, &args.systemsfile, &el);

    sw.status("Checking for duplicate list names in routes, roots in routes and connected routes.");
    check_route_roots(&net, &el);

    sw.status("Finding all .wpt files.");
    let hwy_data = args.highwaydatapath.join("hwy_data");
    let mut all_wpt_files: BTreeSet<PathBuf> =
        wpt::find_all_wpt_files(&hwy_data).into_iter().collect();
    println!("{} files found.", all_wpt_files.len());

    // waypoint reading drives colocation and near-miss detection through
    // the quadtree as each point is inserted
    let mut tree = WaypointQuadtree::master();
    let mut datacheck_entries = Vec::new();
    sw.status("Reading waypoints for all routes.");
    let mut processed_files = Vec::new();
    wpt::read_all_wpts(
        &mut net,
        &mut tree,
        &mut datacheck_entries,
        &el,
        &hwy_data,
        &mut processed_files,
    );
    for p in &processed_files {
        all_wpt_files.remove(p);
    }

    sw.status("Sorting waypoints in Quadtree.");
    tree.sort_points(&|wid| net.waypoint_key(wid));

    sw.status("Sorting colocated point lists.");
    for gidx in 0..net.colocations.len() {
        let mut group = net.colocations[gidx].clone();
        group.sort_by_key(|&w| net.waypoint_key(w));
        net.colocations[gidx] = group;
    }

    sw.status("Finding unprocessed wpt files.");
    let leftover: Vec<PathBuf> = all_wpt_files.into_iter().collect();
    if leftover.is_empty() {
        println!(
            "All .wpt files in {} processed.",
            hwy_data.display()
        );
    } else {
        println!(
            "{} .wpt files in {} not processed, see unprocessedwpts.log.",
            leftover.len(),
            hwy_data.display()
        );
    }
    reports::write_unprocessed_wpts(&leftover, &args.logfilepath)?;

    sw.status("Near-miss point log and tm-master.nmp file.");
    let nmp_fps = nmp::read_nmp_fps(&args.highwaydatapath.join("nmpfps.log"), &el);
    nmp::write_nmp_outputs(&mut net, &tree, nmp_fps, &args.logfilepath)?;
    if let Some(mergepath) = &args.nmpmergepath
        && !args.errorcheck
    {
        sw.status("Writing near-miss point merged wpt files.");
        nmp::write_nmp_merged(&net, mergepath)?;
    }

    sw.status("Creating route hash table for list processing.");
    let route_map = list::build_route_map(&net);

    sw.status("Processing traveler list files:");
    let mut travelers = read_travelers(&mut net, &route_map, &args)?;

    sw.status("Reading updates file.");
    let updates = catalog::read_updates_csv(
        &args.highwaydatapath.join("updates.csv"),
        "updates.csv",
        &el,
    );
    sw.status("Reading systemupdates file.");
    let systemupdates = catalog::read_updates_csv(
        &args.highwaydatapath.join("systemupdates.csv"),
        "systemupdates.csv",
        &el,
    );

    sw.status("Writing points in use log.");
    reports::write_points_in_use(&net, &args.logfilepath, &now)?;
    sw.status("Writing unused alt labels log.");
    reports::write_unused_alt_labels(&net, &args.logfilepath, &now)?;

    sw.status("Concurrent segment detection.");
    let mut concurrency_log = Vec::new();
    correlate::detect_concurrencies(&mut net, &mut concurrency_log);
    sw.status("Augmenting travelers for detected concurrent segments.");
    correlate::augment_travelers(&mut net, &mut travelers, &mut concurrency_log);
    reports::write_lines_log(
        &concurrency_log,
        &args.logfilepath.join("concurrencies.log"),
        Some(&format!("Log file created at: {now}")),
    )?;

    sw.status("Computing stats.");
    let totals = mileage::compute_mileage(&mut net, &mut travelers);

    sw.status("Writing highway data stats log file (highwaydatastats.log).");
    stats::write_highwaydata_stats(&mut net, &totals, &args.logfilepath, &now)?;

    sw.status("Creating per-traveler stats log entries and augmenting data structure.");
    let clinched_values = stats::build_traveler_stats(&net, &mut travelers, &totals);

    sw.status("Writing traveler list logs.");
    reports::write_traveler_logs(&travelers, &args.logfilepath, &now)?;

    sw.status("Writing stats csv files.");
    stats::write_csv_stats(&net, &travelers, &totals, &args.csvstatfilepath)?;

    sw.status("Reading datacheckfps.csv.");
    let mut datacheck_fps =
        datacheck::read_datacheck_fps(&args.highwaydatapath.join("datacheckfps.csv"), &el);

    // the fatal gate: everything before this only collected errors
    if !el.is_empty() {
        ui::error(format!("ABORTING due to {} errors:", el.len()));
        for line in el.dump() {
            ui::error(line);
        }
        std::process::exit(1);
    }

    sw.status("Setting up for graphs of highway data.");
    let graph_data = HighwayGraph::build(&net, &tree);
    sw.status("Writing graph waypoint simplification log.");
    reports::write_lines_log(
        &graph_data.naming_log,
        &args.logfilepath.join("waypointsimplification.log"),
        None,
    )?;

    let mut graph_list: Vec<GraphListEntry> = Vec::new();
    let mut graph_types: Vec<(String, String, String)> = Vec::new();
    if args.skipgraphs || args.errorcheck {
        sw.status("SKIPPING generation of subgraphs.");
    } else {
        let dir = &args.graphfilepath;
        sw.status("Writing master simple graph file, tm-master-simple.tmg.");
        let (sv, se) = graph_data
            .write_subgraph_simple(&dir.join("tm-master-simple.tmg"), &GraphFilter::All)?;
        graph_list.push(GraphListEntry {
            filename: "tm-master-simple.tmg".to_string(),
            descr: "All Travel Mapping Data".to_string(),
            vertices: sv,
            edges: se,
            format: "simple".to_string(),
            category: "master".to_string(),
        });
        sw.status("Writing master collapsed graph file, tm-master.tmg.");
        let (cv, ce) =
            graph_data.write_subgraph_collapsed(&dir.join("tm-master.tmg"), &GraphFilter::All)?;
        graph_list.push(GraphListEntry {
            filename: "tm-master.tmg".to_string(),
            descr: "All Travel Mapping Data".to_string(),
            vertices: cv,
            edges: ce,
            format: "collapsed".to_string(),
            category: "master".to_string(),
        });
        sw.status("Writing master graph JSON file, tm-master.json.");
        let (jv, je) = graph_data.write_json(&dir.join("tm-master.json"))?;
        graph_list.push(GraphListEntry {
            filename: "tm-master.json".to_string(),
            descr: "All Travel Mapping Data".to_string(),
            vertices: jv,
            edges: je,
            format: "json".to_string(),
            category: "master".to_string(),
        });
        graph_types.push((
            "master".to_string(),
            "All Travel Mapping Data".to_string(),
            "These graphs contain all routes currently plotted in the project.".to_string(),
        ));

        // graphs restricted by place/area, from areagraphs.csv
        sw.status("Creating area data graphs.");
        let graphs_dir = args.highwaydatapath.join("graphs");
        if let Some(rows) = read_graph_csv(&graphs_dir.join("areagraphs.csv"), "area") {
            for fields in &rows {
                if fields.len() != 5 {
                    ui::warning(format!(
                        "Could not parse areagraphs.csv line: {}",
                        fields.join(";")
                    ));
                    continue;
                }
                let (Ok(lat), Ok(lng), Ok(r)) = (
                    fields[2].parse::<f64>(),
                    fields[3].parse::<f64>(),
                    fields[4].parse::<f64>(),
                ) else {
                    ui::warning(format!(
                        "Could not parse areagraphs.csv line: {}",
                        fields.join(";")
                    ));
                    continue;
                };
                let a = PlaceRadius {
                    place: fields[0].clone(),
                    base: fields[1].clone(),
                    lat,
                    lng,
                    r,
                };
                print!("{}({}) ", a.base, a.r);
                std::io::stdout().flush().ok();
                graph_data.write_subgraphs_tmg(
                    &mut graph_list,
                    dir,
                    &format!("{}{}-area", a.base, a.r),
                    &format!("{} ({} mi radius)", a.place, a.r),
                    "area",
                    &GraphFilter::Place(&a),
                )?;
            }
            graph_types.push((
                "area".to_string(),
                "Routes Within a Given Radius of a Place".to_string(),
                "These graphs contain all routes currently plotted within the given distance radius of the given place.".to_string(),
            ));
            println!("!");
        }

        // one graph per region with any clinchable mileage
        sw.status("Creating regional data graphs.");
        for r in &regions {
            if !totals.active_preview_by_region.contains_key(&r.code) {
                continue;
            }
            print!("{} ", r.code);
            std::io::stdout().flush().ok();
            let wanted = [r.code.clone()];
            graph_data.write_subgraphs_tmg(
                &mut graph_list,
                dir,
                &format!("{}-region", r.code),
                &format!("{} ({})", r.name, r.regiontype),
                "region",
                &GraphFilter::Regions(&wanted),
            )?;
        }
        graph_types.push((
            "region".to_string(),
            "Routes Within a Single Region".to_string(),
            "These graphs contain all routes currently plotted within the given region.".to_string(),
        ));
        println!("!");

        // only the systems named in systemgraphs.csv, as many are not
        // useful on their own
        sw.status("Creating system data graphs.");
        if let Some(rows) = read_graph_csv(&graphs_dir.join("systemgraphs.csv"), "system") {
            let mut wrote_any = false;
            for fields in &rows {
                let hname = fields[0].trim();
                let Some(h) = net.systems.iter().find(|h| h.name == hname) else {
                    continue;
                };
                print!("{} ", h.name);
                std::io::stdout().flush().ok();
                wrote_any = true;
                let wanted = [h.name.clone()];
                graph_data.write_subgraphs_tmg(
                    &mut graph_list,
                    dir,
                    &format!("{}-system", h.name),
                    &format!("{} ({})", h.name, h.fullname),
                    "system",
                    &GraphFilter::Systems(&wanted),
                )?;
            }
            if wrote_any {
                graph_types.push((
                    "system".to_string(),
                    "Routes Within a Single Highway System".to_string(),
                    "These graphs contain the routes within a single highway system and are not restricted by region.".to_string(),
                ));
            }
            println!("!");
        }

        sw.status("Creating multisystem graphs.");
        if let Some(rows) = read_graph_csv(&graphs_dir.join("multisystem.csv"), "multisystem") {
            for fields in &rows {
                if fields.len() != 3 {
                    ui::warning(format!(
                        "Could not parse multisystem.csv line: {}",
                        fields.join(";")
                    ));
                    continue;
                }
                print!("{} ", fields[1]);
                std::io::stdout().flush().ok();
                let selected: Vec<&str> = fields[2].split(',').collect();
                let wanted: Vec<String> = net
                    .systems
                    .iter()
                    .filter(|h| selected.contains(&h.name.as_str()))
                    .map(|h| h.name.clone())
                    .collect();
                graph_data.write_subgraphs_tmg(
                    &mut graph_list,
                    dir,
                    &fields[1],
                    &fields[0],
                    "multisystem",
                    &GraphFilter::Systems(&wanted),
                )?;
            }
            graph_types.push((
                "multisystem".to_string(),
                "Routes Within Multiple Highway Systems".to_string(),
                "These graphs contain the routes within a set of highway systems.".to_string(),
            ));
            println!("!");
        }

        sw.status("Creating multiregion graphs.");
        if let Some(rows) = read_graph_csv(&graphs_dir.join("multiregion.csv"), "multiregion") {
            for fields in &rows {
                if fields.len() != 3 {
                    ui::warning(format!(
                        "Could not parse multiregion.csv line: {}",
                        fields.join(";")
                    ));
                    continue;
                }
                print!("{} ", fields[1]);
                std::io::stdout().flush().ok();
                let selected: Vec<&str> = fields[2].split(',').collect();
                let wanted: Vec<String> = regions
                    .iter()
                    .filter(|r| {
                        selected.contains(&r.code.as_str())
                            && totals.active_preview_by_region.contains_key(&r.code)
                    })
                    .map(|r| r.code.clone())
                    .collect();
                graph_data.write_subgraphs_tmg(
                    &mut graph_list,
                    dir,
                    &fields[1],
                    &fields[0],
                    "multiregion",
                    &GraphFilter::Regions(&wanted),
                )?;
            }
            graph_types.push((
                "multiregion".to_string(),
                "Routes Within Multiple Regions".to_string(),
                "These graphs contain the routes within a set of regions.".to_string(),
            ));
            println!("!");
        }

        // one graph per country whose clinchable regions number at least
        // two; single-region countries are covered by their region graph
        sw.status("Creating country graphs.");
        for (code, cname) in &countries {
            let region_list: Vec<String> = regions
                .iter()
                .filter(|r| {
                    r.country == *code
                        && totals.active_preview_by_region.contains_key(&r.code)
                })
                .map(|r| r.code.clone())
                .collect();
            if region_list.len() >= 2 {
                print!("{code} ");
                std::io::stdout().flush().ok();
                graph_data.write_subgraphs_tmg(
                    &mut graph_list,
                    dir,
                    &format!("{code}-country"),
                    &format!("{cname} All Routes in Country"),
                    "country",
                    &GraphFilter::Regions(&region_list),
                )?;
            }
        }
        graph_types.push((
            "country".to_string(),
            "Routes Within a Single Multi-Region Country".to_string(),
            "These graphs contain the routes within a single country that is composed of multiple regions that contain plotted routes.  Countries consisting of a single region are represented by their regional graph.".to_string(),
        ));
        println!("!");

        sw.status("Creating continent graphs.");
        for (code, cname) in &continents {
            let region_list: Vec<String> = regions
                .iter()
                .filter(|r| {
                    r.continent == *code
                        && totals.active_preview_by_region.contains_key(&r.code)
                })
                .map(|r| r.code.clone())
                .collect();
            if !region_list.is_empty() {
                print!("{code} ");
                std::io::stdout().flush().ok();
                graph_data.write_subgraphs_tmg(
                    &mut graph_list,
                    dir,
                    &format!("{code}-continent"),
                    &format!("{cname} All Routes on Continent"),
                    "continent",
                    &GraphFilter::Regions(&region_list),
                )?;
            }
        }
        graph_types.push((
            "continent".to_string(),
            "Routes Within a Continent".to_string(),
            "These graphs contain the routes on a continent.".to_string(),
        ));
        println!("!");
    }

    sw.status("Performing data checks.");
    datacheck::run_datachecks(&net, &mut datacheck_entries);
    sw.status(format!(
        "Found {} datacheck errors.",
        datacheck_entries.len()
    ));
    datacheck_entries.sort_by_key(|d| d.string_form(&net));

    sw.status("Marking datacheck false positives.");
    let (fpcount, near_match_lines) =
        datacheck::mark_false_positives(&net, &mut datacheck_entries, &mut datacheck_fps);
    reports::write_lines_log(
        &near_match_lines,
        &args.logfilepath.join("nearmatchfps.log"),
        Some(&format!("Log file created at: {now}")),
    )?;
    sw.status(format!("Matched {fpcount} FP entries."));

    sw.status("Writing log of unmatched datacheck FP entries.");
    write_unmatched_fps(&datacheck_fps, &args.logfilepath, &now)?;

    sw.status("Writing datacheck.log");
    write_datacheck_log(&net, &datacheck_entries, &args.logfilepath, &now)?;

    if args.errorcheck {
        sw.status("SKIPPING database file.");
    } else {
        sw.status(format!("Writing database file {}.sql.", args.databasename));
        let inputs = SqlInputs {
            net: &net,
            travelers: &travelers,
            totals: &totals,
            clinched_values: &clinched_values,
            datacheck: &datacheck_entries,
            regions: &regions,
            countries: &countries,
            continents: &continents,
            updates: &updates,
            systemupdates: &systemupdates,
            graph_types: &graph_types,
            graphs: &graph_list,
            skipgraphs: args.skipgraphs,
        };
        sql::write_sql_file(&inputs, &PathBuf::from(format!("{}.sql", args.databasename)))?;

        if let Some(dbpath) = &args.sqlite {
            sw.status(format!(
                "Building local SQLite database {}.",
                dbpath.display()
            ));
            db::build_sqlite(&inputs, dbpath)?;
        }
    }

    sw.status("Complete.");
    Ok(())
}

/// Every route root must be globally unique, every root must be covered by
/// exactly one connected route, and duplicate list names are reported.
fn check_route_roots(net: &Network, el: &ErrorList) {
    let mut roots = BTreeSet::new();
    let mut list_names = BTreeSet::new();
    let mut duplicate_list_names = BTreeSet::new();
    for h in &net.systems {
        for &rid in &h.routes {
            let r = net.route(rid);
            if !roots.insert(r.root.clone()) {
                el.add_error(format!("Duplicate root in route lists: {}", r.root));
            }
            let list_name = format!("{} {}", r.region, r.list_entry_name());
            if !list_names.insert(list_name.clone()) {
                duplicate_list_names.insert(list_name);
            }
        }
    }

    let mut con_roots = BTreeSet::new();
    for h in &net.systems {
        for cr in &h.con_routes {
            for &rid in &cr.roots {
                let root = net.route(rid).root.clone();
                if !con_roots.insert(root.clone()) {
                    el.add_error(format!("Duplicate root in con_route lists: {root}"));
                }
            }
        }
    }

    if roots.len() == con_roots.len() {
        println!(
            "Check passed: same number of routes as connected route roots. {}",
            roots.len()
        );
    } else {
        el.add_error(format!(
            "Check FAILED: {} routes != {} connected route roots.",
            roots.len(),
            con_roots.len()
        ));
        let mut num_found = 0;
        for root in roots.difference(&con_roots) {
            el.add_error(format!(
                "route {root} not matched by any connected route root."
            ));
            num_found += 1;
        }
        println!("Added {num_found} ROUTE_NOT_IN_CONNECTED error entries.");
    }

    if duplicate_list_names.is_empty() {
        println!("No duplicate list names found.");
    } else {
        println!(
            "Found {} DUPLICATE_LIST_NAME case(s).",
            duplicate_list_names.len()
        );
        for d in &duplicate_list_names {
            el.add_error(format!("Duplicate list name: {d}"));
        }
    }
}

/// Read every traveler list, either the users named on the command line or
/// every `.list` file in the directory, in sorted name order.
fn read_travelers(
    net: &mut Network,
    route_map: &std::collections::BTreeMap<String, crate::model::RouteId>,
    args: &args::Args,
) -> Result<Vec<Traveler>> {
    let mut names: Vec<String> = match &args.userlist {
        Some(users) => users.clone(),
        None => {
            let dir = std::fs::read_dir(&args.userlistfilepath).with_context(|| {
                format!("reading list directory {}", args.userlistfilepath.display())
            })?;
            let mut names = Vec::new();
            for entry in dir {
                let path = entry?.path();
                if path.extension().is_some_and(|e| e == "list")
                    && let Some(stem) = path.file_stem()
                {
                    names.push(stem.to_string_lossy().into_owned());
                }
            }
            names
        }
    };
    // sorted name order keeps traveler ids, and every log derived from
    // them, deterministic
    names.sort();

    let mut travelers = Vec::new();
    for name in names {
        print!(" {name}");
        std::io::stdout().flush().ok();
        let tid = TravelerId(travelers.len());
        let mut t = Traveler::new(name);
        list::read_traveler_list(net, tid, &mut t, route_map, &args.userlistfilepath)?;
        travelers.push(t);
    }
    println!(" processed {} traveler list files.", travelers.len());
    Ok(travelers)
}

/// Read one of the semicolon graph-definition files under
/// `hwy_data/graphs/`, header discarded. A missing file skips that graph
/// family with a warning rather than aborting the run.
fn read_graph_csv(path: &std::path::Path, what: &str) -> Option<Vec<Vec<String>>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(
            content
                .lines()
                .skip(1)
                .map(|l| l.split(';').map(str::to_string).collect())
                .collect(),
        ),
        Err(e) => {
            ui::warning(format!(
                "{}: {e}; skipping {what} graphs",
                path.display()
            ));
            None
        }
    }
}

fn write_unmatched_fps(
    fps: &[datacheck::FpEntry],
    logpath: &std::path::Path,
    now: &str,
) -> Result<()> {
    let path = logpath.join("unmatchedfps.log");
    let mut f = BufWriter::new(
        File::create(&path).with_context(|| format!("creating {}", path.display()))?,
    );
    writeln!(f, "Log file created at: {now}")?;
    if fps.is_empty() {
        writeln!(f, "No unmatched FP entries.")?;
    } else {
        for fp in fps {
            writeln!(f, "{}", fp.line())?;
        }
    }
    f.flush()?;
    Ok(())
}

/// `datacheck.log`: entries not flagged as false positives, in a format
/// ready to paste into `datacheckfps.csv`.
fn write_datacheck_log(
    net: &Network,
    entries: &[datacheck::DatacheckEntry],
    logpath: &std::path::Path,
    now: &str,
) -> Result<()> {
    let path = logpath.join("datacheck.log");
    let mut f = BufWriter::new(
        File::create(&path).with_context(|| format!("creating {}", path.display()))?,
    );
    writeln!(f, "Log file created at: {now}")?;
    writeln!(
        f,
        "Datacheck errors that have been flagged as false positives are not included."
    )?;
    writeln!(
        f,
        "These entries should be in a format ready to paste into datacheckfps.csv."
    )?;
    writeln!(f, "Root;Waypoint1;Waypoint2;Waypoint3;Error;Info")?;
    if entries.is_empty() {
        writeln!(f, "No datacheck errors found.")?;
    } else {
        for d in entries {
            if !d.fp {
                writeln!(f, "{}", d.string_form(net))?;
            }
        }
    }
    f.flush()?;
    Ok(())
}
