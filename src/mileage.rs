//! Mileage aggregation with concurrency discounting: each segment credits
//! its full length to its own route, but only a fractional share to region
//! and system totals, so regional sums equal the physical pavement mileage.

use std::collections::BTreeMap;

use crate::model::{Network, SegmentId, Traveler};

/// Region-keyed totals at the three clinchability tiers.
#[derive(Debug, Default)]
pub struct MileageTotals {
    pub overall_by_region: BTreeMap<String, f64>,
    pub active_preview_by_region: BTreeMap<String, f64>,
    pub active_only_by_region: BTreeMap<String, f64>,
}

/// Concurrency multiplicities of one segment, counting the segment itself.
struct ConcurrencyCounts {
    overall: usize,
    active_preview: usize,
    active_only: usize,
    system: usize,
}

fn concurrency_counts(net: &Network, sid: SegmentId) -> ConcurrencyCounts {
    let mut counts = ConcurrencyCounts {
        overall: 1,
        active_preview: 1,
        active_only: 1,
        system: 1,
    };
    let s = net.seg(sid);
    let own_system = net.route(s.route).system;
    if let Some(group) = s.concurrent {
        for &other in &net.concurrencies[group.0] {
            if other == sid {
                continue;
            }
            counts.overall += 1;
            let other_system_id = net.route(net.seg(other).route).system;
            let other_system = net.system(other_system_id);
            if other_system.active_or_preview() {
                counts.active_preview += 1;
                if other_system.active() {
                    counts.active_only += 1;
                }
            }
            if other_system_id == own_system {
                counts.system += 1;
            }
        }
    }
    counts
}

/// Walk every segment once, crediting routes, regions, systems, and every
/// traveler who clinched it, each at the appropriate concurrency discount.
pub fn compute_mileage(net: &mut Network, travelers: &mut [Traveler]) -> MileageTotals {
    let mut totals = MileageTotals::default();

    for sidx in 0..net.systems.len() {
        for rid in net.systems[sidx].routes.clone() {
            let region = net.route(rid).region.clone();
            let is_active_or_preview = net.systems[sidx].active_or_preview();
            let is_active = net.systems[sidx].active();
            let system_name = net.systems[sidx].name.clone();

            for sid in net.route(rid).segments.clone() {
                let length = net.segment_length(sid);
                // the route's own total is never discounted
                net.route_mut(rid).mileage += length;

                let counts = concurrency_counts(net, sid);

                *totals.overall_by_region.entry(region.clone()).or_insert(0.0) +=
                    length / counts.overall as f64;
                if is_active_or_preview {
                    *totals
                        .active_preview_by_region
                        .entry(region.clone())
                        .or_insert(0.0) += length / counts.active_preview as f64;
                }
                if is_active {
                    *totals
                        .active_only_by_region
                        .entry(region.clone())
                        .or_insert(0.0) += length / counts.active_only as f64;
                }
                *net.systems[sidx]
                    .mileage_by_region
                    .entry(region.clone())
                    .or_insert(0.0) += length / counts.system as f64;

                for tid in net.seg(sid).clinched_by.iter().copied().collect::<Vec<_>>() {
                    let t = &mut travelers[tid.0];
                    // a concurrency detection could otherwise credit a
                    // traveler with miles in a devel system
                    if is_active_or_preview {
                        *t.active_preview_mileage_by_region
                            .entry(region.clone())
                            .or_insert(0.0) += length / counts.active_preview as f64;
                    }
                    if is_active {
                        *t.active_only_mileage_by_region
                            .entry(region.clone())
                            .or_insert(0.0) += length / counts.active_only as f64;
                    }
                    if is_active_or_preview {
                        *t.system_region_mileages
                            .entry(system_name.clone())
                            .or_default()
                            .entry(region.clone())
                            .or_insert(0.0) += length / counts.system as f64;
                    }
                }
            }
        }
    }

    totals
}
