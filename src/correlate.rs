//! Concurrency detection: segments of different routes whose endpoints are
//! pairwise colocated share pavement and are merged into concurrency
//! groups. Travelers are then augmented with credit across each group.

use crate::model::{ConcurrencyId, Network, SegmentId, Traveler, TravelerId};

/// Walk every segment of every route; whenever both endpoints belong to
/// colocation groups, look for a matching segment on each other route
/// passing through both groups and merge the two into one concurrency
/// group. Appends one log line per new or extended group.
pub fn detect_concurrencies(net: &mut Network, log: &mut Vec<String>) {
    for sidx in 0..net.systems.len() {
        for rid in net.systems[sidx].routes.clone() {
            for sid in net.route(rid).segments.clone() {
                let (w1, w2) = {
                    let s = net.seg(sid);
                    (s.waypoint1, s.waypoint2)
                };
                let (Some(c1), Some(c2)) = (net.wp(w1).colocated, net.wp(w2).colocated)
                else {
                    continue;
                };
                for a in net.colocations[c1.0].clone() {
                    if net.wp(a).route == rid {
                        continue;
                    }
                    for b in net.colocations[c2.0].clone() {
                        if net.wp(a).route != net.wp(b).route {
                            continue;
                        }
                        let Some(other) =
                            net.find_segment_by_waypoints(net.wp(a).route, a, b)
                        else {
                            continue;
                        };
                        merge_concurrency(net, sid, other, log);
                    }
                }
            }
        }
    }
}

fn merge_concurrency(
    net: &mut Network,
    sid: SegmentId,
    other: SegmentId,
    log: &mut Vec<String>,
) {
    let existing = net.seg(sid).concurrent;
    match existing {
        None => {
            let group = ConcurrencyId(net.concurrencies.len());
            net.concurrencies.push(vec![sid, other]);
            net.seg_mut(sid).concurrent = Some(group);
            net.seg_mut(other).concurrent = Some(group);
            log.push(format!(
                "New concurrency [{}][{}] (2)",
                net.segment_str(sid),
                net.segment_str(other)
            ));
        }
        Some(group) => {
            net.seg_mut(other).concurrent = Some(group);
            if !net.concurrencies[group.0].contains(&other) {
                net.concurrencies[group.0].push(other);
                let members = net.concurrencies[group.0]
                    .iter()
                    .map(|&m| format!("[{}]", net.segment_str(m)))
                    .collect::<String>();
                log.push(format!(
                    "Extended concurrency {} ({})",
                    members,
                    net.concurrencies[group.0].len()
                ));
            }
        }
    }
}

/// Credit each traveler with every concurrency-group mate of a segment they
/// clinched, provided the mate's system is active or preview. One log line
/// per newly credited segment.
pub fn augment_travelers(
    net: &mut Network,
    travelers: &mut [Traveler],
    log: &mut Vec<String>,
) {
    for (t_idx, t) in travelers.iter_mut().enumerate() {
        let tid = TravelerId(t_idx);
        for sid in t.clinched_segments.iter().copied().collect::<Vec<_>>() {
            let Some(group) = net.seg(sid).concurrent else {
                continue;
            };
            for other in net.concurrencies[group.0].clone() {
                let qualifies = net.route_system(net.seg(other).route).active_or_preview();
                if qualifies && net.seg_mut(other).add_clinched_by(tid) {
                    log.push(format!(
                        "Concurrency augment for traveler {}: [{}] based on [{}]",
                        t.name,
                        net.segment_str(other),
                        net.segment_str(sid)
                    ));
                }
            }
        }
    }
}
