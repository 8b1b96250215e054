use std::collections::BTreeSet;

use regex::Regex;

use crate::datacheck::{CheckInfo, DatacheckCode, DatacheckEntry};
use crate::geo;
use crate::model::{Network, RouteId, Waypoint};

const LONG_SEGMENT_MILES: f64 = 20.0;
const VISIBLE_DISTANCE_MILES: f64 = 10.0;
const SHARP_ANGLE_DEGREES: f64 = 135.0;

/// Run the whole check catalog over every route, appending violations to
/// `datacheck`. One walk of the point list per route covers the label and
/// distance checks; a second indexed walk covers the angle checks.
pub fn run_datachecks(net: &Network, datacheck: &mut Vec<DatacheckEntry>) {
    let valid_chars = Regex::new(r"^[a-zA-Z0-9()/+*_\-.]+$").expect("label charset pattern");
    let bus_with_i = Regex::new(r"^I-[0-9]*Bus$").expect("bus pattern");
    let looks_hidden = Regex::new(r"^X[0-9]{6}$").expect("hidden-label pattern");

    for h in &net.systems {
        for &rid in &h.routes {
            let r = net.route(rid);
            if r.points.is_empty() {
                continue;
            }

            let mut all_route_labels: BTreeSet<String> = BTreeSet::new();
            let mut coords_used: BTreeSet<(u64, u64)> = BTreeSet::new();

            let mut visible_distance = 0.0;
            // the first point of a route is expected to be visible; the
            // fallback below covers files that violate that
            let mut last_visible_label: Option<&str> = None;
            let mut prev: Option<&Waypoint> = None;

            let first = net.wp(r.points[0]);
            let last = net.wp(r.points[r.points.len() - 1]);
            if first.is_hidden() {
                datacheck.push(DatacheckEntry::new(
                    rid,
                    vec![first.label.clone()],
                    DatacheckCode::HiddenTerminus,
                ));
            }
            if last.is_hidden() {
                datacheck.push(DatacheckEntry::new(
                    rid,
                    vec![last.label.clone()],
                    DatacheckCode::HiddenTerminus,
                ));
            }

            for (idx, &wid) in r.points.iter().enumerate() {
                let w = net.wp(wid);

                // duplicate labels, case-folded with +/* markers stripped
                for label in w.alt_labels.iter().chain(std::iter::once(&w.label)) {
                    let folded = label
                        .to_lowercase()
                        .trim_matches(|c| c == '+' || c == '*')
                        .to_string();
                    if !all_route_labels.insert(folded.clone()) {
                        datacheck.push(DatacheckEntry::new(
                            rid,
                            vec![folded],
                            DatacheckCode::DuplicateLabel,
                        ));
                    }
                }

                if w.lat > 90.0 || w.lat < -90.0 || w.lng > 180.0 || w.lng < -180.0 {
                    datacheck.push(DatacheckEntry::with_info(
                        rid,
                        vec![w.label.clone()],
                        DatacheckCode::OutOfBounds,
                        CheckInfo::Coords(w.lat, w.lng),
                    ));
                }

                // duplicate coordinates within the route
                if !coords_used.insert((w.lat.to_bits(), w.lng.to_bits())) {
                    for &other_id in &r.points[..idx] {
                        let other = net.wp(other_id);
                        if w.same_coords(other) && w.label != other.label {
                            datacheck.push(DatacheckEntry::with_info(
                                rid,
                                vec![other.label.clone(), w.label.clone()],
                                DatacheckCode::DuplicateCoords,
                                CheckInfo::Coords(w.lat, w.lng),
                            ));
                        }
                    }
                }

                if let Some(p) = prev {
                    let last_distance = geo::distance_miles(p.lat, p.lng, w.lat, w.lng);
                    visible_distance += last_distance;
                    if last_distance > LONG_SEGMENT_MILES {
                        datacheck.push(DatacheckEntry::with_info(
                            rid,
                            vec![p.label.clone(), w.label.clone()],
                            DatacheckCode::LongSegment,
                            CheckInfo::Miles(last_distance),
                        ));
                    }
                }

                if !w.is_hidden() {
                    // omitted for active systems to reduce clutter
                    if visible_distance > VISIBLE_DISTANCE_MILES && !h.active() {
                        let from = last_visible_label.unwrap_or(&net.wp(r.points[0]).label);
                        datacheck.push(DatacheckEntry::with_info(
                            rid,
                            vec![from.to_string(), w.label.clone()],
                            DatacheckCode::VisibleDistance,
                            CheckInfo::Miles(visible_distance),
                        ));
                    }
                    last_visible_label = Some(&w.label);
                    visible_distance = 0.0;

                    check_visible_label(net, rid, w, &valid_chars, &bus_with_i, &looks_hidden, datacheck);
                } else {
                    for a in &w.alt_labels {
                        if !valid_chars.is_match(a) {
                            datacheck.push(DatacheckEntry::new(
                                rid,
                                vec![a.clone()],
                                DatacheckCode::LabelInvalidChar,
                            ));
                        }
                    }
                }

                prev = Some(w);
            }

            // interior angles need index triples
            for i in 1..r.points.len().saturating_sub(1) {
                let p = net.wp(r.points[i - 1]);
                let m = net.wp(r.points[i]);
                let s = net.wp(r.points[i + 1]);
                let labels = vec![p.label.clone(), m.label.clone(), s.label.clone()];
                if p.same_coords(m) || s.same_coords(m) {
                    datacheck.push(DatacheckEntry::new(rid, labels, DatacheckCode::BadAngle));
                } else {
                    let angle =
                        geo::angle_degrees((p.lat, p.lng), (m.lat, m.lng), (s.lat, s.lng));
                    if angle > SHARP_ANGLE_DEGREES {
                        datacheck.push(DatacheckEntry::with_info(
                            rid,
                            labels,
                            DatacheckCode::SharpAngle,
                            CheckInfo::Degrees(angle),
                        ));
                    }
                }
            }
        }
    }
}

/// Label checks that apply only to visible points.
fn check_visible_label(
    net: &Network,
    rid: RouteId,
    w: &Waypoint,
    valid_chars: &Regex,
    bus_with_i: &Regex,
    looks_hidden: &Regex,
    datacheck: &mut Vec<DatacheckEntry>,
) {
    let r = net.route(rid);
    let label = &w.label;

    if label_references_own_route(label, &r.route, &r.banner) {
        datacheck.push(DatacheckEntry::new(
            rid,
            vec![label.clone()],
            DatacheckCode::LabelSelfref,
        ));
    }

    if label.matches('_').count() > 1 {
        datacheck.push(DatacheckEntry::new(
            rid,
            vec![label.clone()],
            DatacheckCode::LabelUnderscores,
        ));
    }

    if let Some(u) = label.find('_')
        && u + 5 < label.len()
    {
        datacheck.push(DatacheckEntry::new(
            rid,
            vec![label.clone()],
            DatacheckCode::LongUnderscore,
        ));
    }

    if label.matches('/').count() > 1 {
        datacheck.push(DatacheckEntry::new(
            rid,
            vec![label.clone()],
            DatacheckCode::LabelSlashes,
        ));
    }

    if label.matches('(').count() != label.matches(')').count() {
        datacheck.push(DatacheckEntry::new(
            rid,
            vec![label.clone()],
            DatacheckCode::LabelParens,
        ));
    }

    if !valid_chars.is_match(label) {
        datacheck.push(DatacheckEntry::new(
            rid,
            vec![label.clone()],
            DatacheckCode::LabelInvalidChar,
        ));
    }
    for a in &w.alt_labels {
        if !valid_chars.is_match(a) {
            datacheck.push(DatacheckEntry::new(
                rid,
                vec![a.clone()],
                DatacheckCode::LabelInvalidChar,
            ));
        }
    }

    if let (Some(u), Some(s)) = (label.find('_'), label.find('/'))
        && s > u
    {
        datacheck.push(DatacheckEntry::new(
            rid,
            vec![label.clone()],
            DatacheckCode::NonterminalUnderscore,
        ));
    }

    if bus_with_i.is_match(label) {
        datacheck.push(DatacheckEntry::new(
            rid,
            vec![label.clone()],
            DatacheckCode::BusWithI,
        ));
    }

    if looks_hidden.is_match(label) {
        datacheck.push(DatacheckEntry::new(
            rid,
            vec![label.clone()],
            DatacheckCode::LabelLooksHidden,
        ));
    }
}

/// Whether a visible label names its own route: plain equality with
/// name+banner, name+banner followed by `_` or `/`, or (when the route name
/// ends in digits) a slash followed by the route name or just its trailing
/// number, each optionally with a `_suffix`.
fn label_references_own_route(label: &str, route_name: &str, banner: &str) -> bool {
    if let Some(slash) = label.find('/')
        && route_name.ends_with(|c: char| c.is_ascii_digit())
    {
        let digits_len = route_name
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .count();
        let number_part = &route_name[route_name.len() - digits_len..];
        let after_slash = &label[slash + 1..];
        if after_slash == number_part || after_slash == route_name {
            return true;
        }
        if let Some(u) = after_slash.rfind('_') {
            let between = &after_slash[..u];
            if between == number_part || between == route_name {
                return true;
            }
        }
    }

    let name_banner = format!("{route_name}{banner}");
    if *label == name_banner {
        return true;
    }
    let pattern = format!("^{}[_/].*$", regex::escape(&name_banner));
    Regex::new(&pattern)
        .map(|re| re.is_match(label))
        .unwrap_or(false)
}
