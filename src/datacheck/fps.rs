use std::path::Path;

use crate::datacheck::{DatacheckCode, DatacheckEntry};
use crate::errors::ErrorList;
use crate::model::Network;
use crate::ui;

/// One persisted false-positive record from `datacheckfps.csv`.
#[derive(Clone, Debug, PartialEq)]
pub struct FpEntry {
    pub root: String,
    pub labels: [String; 3],
    /// Code field kept verbatim; unknown codes simply never match.
    pub code: String,
    pub info: String,
}

impl FpEntry {
    pub fn line(&self) -> String {
        format!(
            "{};{};{};{};{};{}",
            self.root, self.labels[0], self.labels[1], self.labels[2], self.code, self.info
        )
    }
}

/// Read the false-positive list. Records carrying an always-error code are
/// rejected with a console message; malformed lines are fatal.
pub fn read_datacheck_fps(path: &Path, el: &ErrorList) -> Vec<FpEntry> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            el.add_error(format!("{}: {}", path.display(), e));
            return Vec::new();
        }
    };

    let mut fps = Vec::new();
    for line in content.lines().skip(1) {
        let fields: Vec<&str> = line.split(';').collect();
        if fields.len() != 6 {
            el.add_error(format!("Could not parse datacheckfps.csv line: {line}"));
            continue;
        }
        if let Some(code) = DatacheckCode::parse(fields[4])
            && code.always_error()
        {
            ui::warning(format!(
                "datacheckfps.csv line not allowed (always error): {line}"
            ));
            continue;
        }
        fps.push(FpEntry {
            root: fields[0].to_string(),
            labels: [
                fields[1].to_string(),
                fields[2].to_string(),
                fields[3].to_string(),
            ],
            code: fields[4].to_string(),
            info: fields[5].to_string(),
        });
    }
    fps
}

/// Does the persisted record match this entry in every field but info?
fn match_except_info(net: &Network, entry: &DatacheckEntry, fp: &FpEntry) -> bool {
    if net.route(entry.route).root != fp.root || entry.code.as_str() != fp.code {
        return false;
    }
    for (i, label) in entry.labels.iter().enumerate().take(3) {
        if *label != fp.labels[i] {
            return false;
        }
    }
    true
}

/// Join the current entries against the persisted list. An exact match
/// (including info) flags the entry as a false positive and consumes the
/// record; a match in everything but info is logged as a changed candidate.
/// Returns the number of entries flagged and the near-match log lines.
pub fn mark_false_positives(
    net: &Network,
    entries: &mut [DatacheckEntry],
    fps: &mut Vec<FpEntry>,
) -> (usize, Vec<String>) {
    let mut fpcount = 0;
    let mut near_match_lines = Vec::new();

    for entry in entries.iter_mut() {
        let mut matched = None;
        for (i, fp) in fps.iter().enumerate() {
            if !match_except_info(net, entry, fp) {
                continue;
            }
            if entry.info.render() == fp.info {
                matched = Some(i);
                break;
            }
            near_match_lines.push(format!("FP_ENTRY: {}", fp.line()));
            near_match_lines.push(format!(
                "CHANGETO: {};{};{};{};{};{}",
                fp.root,
                fp.labels[0],
                fp.labels[1],
                fp.labels[2],
                fp.code,
                entry.info.render()
            ));
        }
        if let Some(i) = matched {
            entry.fp = true;
            fpcount += 1;
            fps.remove(i);
        }
    }

    (fpcount, near_match_lines)
}
