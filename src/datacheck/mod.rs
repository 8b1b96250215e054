//! The data-quality check catalog: check codes, log entries, the per-route
//! check walk, and false-positive reconciliation.

mod checks;
mod fps;

pub use checks::run_datachecks;
pub use fps::{FpEntry, mark_false_positives, read_datacheck_fps};

use crate::model::{Network, RouteId};

/// Closed set of data-check codes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum DatacheckCode {
    BadAngle,
    BusWithI,
    DuplicateCoords,
    DuplicateLabel,
    HiddenTerminus,
    LabelInvalidChar,
    LabelLooksHidden,
    LabelParens,
    LabelSelfref,
    LabelSlashes,
    LabelUnderscores,
    LongSegment,
    LongUnderscore,
    MalformedUrl,
    NonterminalUnderscore,
    OutOfBounds,
    SharpAngle,
    VisibleDistance,
}

impl DatacheckCode {
    pub fn as_str(self) -> &'static str {
        use DatacheckCode::*;
        match self {
            BadAngle => "BAD_ANGLE",
            BusWithI => "BUS_WITH_I",
            DuplicateCoords => "DUPLICATE_COORDS",
            DuplicateLabel => "DUPLICATE_LABEL",
            HiddenTerminus => "HIDDEN_TERMINUS",
            LabelInvalidChar => "LABEL_INVALID_CHAR",
            LabelLooksHidden => "LABEL_LOOKS_HIDDEN",
            LabelParens => "LABEL_PARENS",
            LabelSelfref => "LABEL_SELFREF",
            LabelSlashes => "LABEL_SLASHES",
            LabelUnderscores => "LABEL_UNDERSCORES",
            LongSegment => "LONG_SEGMENT",
            LongUnderscore => "LONG_UNDERSCORE",
            MalformedUrl => "MALFORMED_URL",
            NonterminalUnderscore => "NONTERMINAL_UNDERSCORE",
            OutOfBounds => "OUT_OF_BOUNDS",
            SharpAngle => "SHARP_ANGLE",
            VisibleDistance => "VISIBLE_DISTANCE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        use DatacheckCode::*;
        Some(match s {
            "BAD_ANGLE" => BadAngle,
            "BUS_WITH_I" => BusWithI,
            "DUPLICATE_COORDS" => DuplicateCoords,
            "DUPLICATE_LABEL" => DuplicateLabel,
            "HIDDEN_TERMINUS" => HiddenTerminus,
            "LABEL_INVALID_CHAR" => LabelInvalidChar,
            "LABEL_LOOKS_HIDDEN" => LabelLooksHidden,
            "LABEL_PARENS" => LabelParens,
            "LABEL_SELFREF" => LabelSelfref,
            "LABEL_SLASHES" => LabelSlashes,
            "LABEL_UNDERSCORES" => LabelUnderscores,
            "LONG_SEGMENT" => LongSegment,
            "LONG_UNDERSCORE" => LongUnderscore,
            "MALFORMED_URL" => MalformedUrl,
            "NONTERMINAL_UNDERSCORE" => NonterminalUnderscore,
            "OUT_OF_BOUNDS" => OutOfBounds,
            "SHARP_ANGLE" => SharpAngle,
            "VISIBLE_DISTANCE" => VisibleDistance,
            _ => return None,
        })
    }

    /// Codes that always indicate a real error and may never be declared
    /// false positives.
    pub fn always_error(self) -> bool {
        use DatacheckCode::*;
        matches!(
            self,
            DuplicateLabel
                | HiddenTerminus
                | LabelInvalidChar
                | LabelSlashes
                | LongUnderscore
                | MalformedUrl
                | NonterminalUnderscore
        )
    }
}

/// Info payload attached to an entry, rendered canonically for the log and
/// for false-positive matching.
#[derive(Clone, Debug, PartialEq)]
pub enum CheckInfo {
    None,
    /// A distance in miles, rendered with two decimals.
    Miles(f64),
    /// An angle in degrees, rendered with two decimals.
    Degrees(f64),
    /// A coordinate pair, rendered as `(lat,lng)`.
    Coords(f64, f64),
    /// Verbatim text, e.g. the offending URL token.
    Text(String),
}

impl CheckInfo {
    pub fn render(&self) -> String {
        match self {
            CheckInfo::None => String::new(),
            CheckInfo::Miles(m) => format!("{m:.2}"),
            CheckInfo::Degrees(d) => format!("{d:.2}"),
            CheckInfo::Coords(lat, lng) => format!("({lat},{lng})"),
            CheckInfo::Text(t) => t.clone(),
        }
    }
}

/// One data-check log entry: the route, up to three related labels, the
/// code, and its info payload.
#[derive(Clone, Debug)]
pub struct DatacheckEntry {
    pub route: RouteId,
    pub labels: Vec<String>,
    pub code: DatacheckCode,
    pub info: CheckInfo,
    /// Set during reconciliation when a persisted false-positive record
    /// matches this entry exactly.
    pub fp: bool,
}

impl DatacheckEntry {
    pub fn new(route: RouteId, labels: Vec<String>, code: DatacheckCode) -> Self {
        Self {
            route,
            labels,
            code,
            info: CheckInfo::None,
            fp: false,
        }
    }

    pub fn with_info(
        route: RouteId,
        labels: Vec<String>,
        code: DatacheckCode,
        info: CheckInfo,
    ) -> Self {
        Self {
            route,
            labels,
            code,
            info,
            fp: false,
        }
    }

    /// Canonical semicolon form: `root;label0;label1;label2;code;info` with
    /// unused label positions left empty.
    pub fn string_form(&self, net: &Network) -> String {
        let root = &net.route(self.route).root;
        let l = |i: usize| self.labels.get(i).map(String::as_str).unwrap_or("");
        format!(
            "{};{};{};{};{};{}",
            root,
            l(0),
            l(1),
            l(2),
            self.code.as_str(),
            self.info.render()
        )
    }
}
