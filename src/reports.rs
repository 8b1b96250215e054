//! Diagnostic log files: labels in use, unused alternate labels,
//! unprocessed waypoint files, and the per-traveler logs.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::{Network, Traveler};

/// Timestamp used in log-file headers.
pub fn now_string() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn create_log(path: &Path, now: &str) -> Result<BufWriter<File>> {
    let mut f = BufWriter::new(
        File::create(path).with_context(|| format!("creating {}", path.display()))?,
    );
    writeln!(f, "Log file created at: {now}")?;
    Ok(f)
}

/// `pointsinuse.log`: for each route, the labels some traveler referenced.
pub fn write_points_in_use(net: &Network, logpath: &Path, now: &str) -> Result<()> {
    let mut f = create_log(&logpath.join("pointsinuse.log"), now)?;
    for h in &net.systems {
        for &rid in &h.routes {
            let r = net.route(rid);
            if r.labels_in_use.is_empty() {
                continue;
            }
            write!(f, "{}({}):", r.root, r.points.len())?;
            for label in &r.labels_in_use {
                write!(f, " {label}")?;
            }
            writeln!(f)?;
        }
    }
    f.flush()?;
    Ok(())
}

/// `unusedaltlabels.log`: alternate labels no traveler ever referenced,
/// with a grand total at the end.
pub fn write_unused_alt_labels(net: &Network, logpath: &Path, now: &str) -> Result<()> {
    let mut f = create_log(&logpath.join("unusedaltlabels.log"), now)?;
    let mut total = 0;
    for h in &net.systems {
        for &rid in &h.routes {
            let r = net.route(rid);
            if r.unused_alt_labels.is_empty() {
                continue;
            }
            total += r.unused_alt_labels.len();
            write!(f, "{}({}):", r.root, r.unused_alt_labels.len())?;
            for label in &r.unused_alt_labels {
                write!(f, " {label}")?;
            }
            writeln!(f)?;
        }
    }
    writeln!(f, "Total: {total}")?;
    f.flush()?;
    Ok(())
}

/// `unprocessedwpts.log`: waypoint files present on disk that no route's
/// catalog entry caused to be read. Paths are reported relative to the
/// `hwy_data` component.
pub fn write_unprocessed_wpts(
    leftover: &[PathBuf],
    logpath: &Path,
) -> Result<()> {
    let path = logpath.join("unprocessedwpts.log");
    let mut f = BufWriter::new(
        File::create(&path).with_context(|| format!("creating {}", path.display()))?,
    );
    for file in leftover {
        let display = file.to_string_lossy();
        let trimmed = match display.find("hwy_data") {
            Some(pos) => &display[pos..],
            None => &display,
        };
        writeln!(f, "{trimmed}")?;
    }
    f.flush()?;
    Ok(())
}

/// One `users/<name>.log` file per traveler.
pub fn write_traveler_logs(travelers: &[Traveler], logpath: &Path, now: &str) -> Result<()> {
    let dir = logpath.join("users");
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    for t in travelers {
        let mut f = create_log(&dir.join(format!("{}.log", t.name)), now)?;
        for line in &t.log_entries {
            writeln!(f, "{line}")?;
        }
        f.flush()?;
    }
    Ok(())
}

/// Generic sorted-line log writer (concurrency and naming logs).
pub fn write_lines_log(lines: &[String], path: &Path, header: Option<&str>) -> Result<()> {
    let mut f = BufWriter::new(
        File::create(path).with_context(|| format!("creating {}", path.display()))?,
    );
    if let Some(h) = header {
        writeln!(f, "{h}")?;
    }
    for line in lines {
        writeln!(f, "{line}")?;
    }
    f.flush()?;
    Ok(())
}
