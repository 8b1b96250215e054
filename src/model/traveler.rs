use std::collections::{BTreeMap, BTreeSet};

use crate::model::SegmentId;

/// One user's travels, read from a `.list` file, plus the per-region and
/// per-system mileage credited to them during aggregation.
#[derive(Debug, Default)]
pub struct Traveler {
    pub name: String,
    pub clinched_segments: BTreeSet<SegmentId>,
    /// Per-traveler diagnostics, written to `users/<name>.log`.
    pub log_entries: Vec<String>,
    /// Count of list lines that resolved to a route and two labels.
    pub good_lines: usize,
    pub active_preview_mileage_by_region: BTreeMap<String, f64>,
    pub active_only_mileage_by_region: BTreeMap<String, f64>,
    /// System name -> region -> clinched mileage, active/preview only.
    pub system_region_mileages: BTreeMap<String, BTreeMap<String, f64>>,
    pub active_systems_traveled: usize,
    pub active_systems_clinched: usize,
    pub preview_systems_traveled: usize,
    pub preview_systems_clinched: usize,
}

impl Traveler {
    pub fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }
}
