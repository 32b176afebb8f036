use crate::pipeline::buckets::{BucketStats, CourtGrid};
use crate::pipeline::landing::detect_landings;
use crate::pipeline::rules::RuleSet;
use crate::pipeline::scoring::{evaluate, ScoreReport};
use crate::pipeline::trajectory::TrajectoryPoint;
use crate::pipeline::types::Point;
use crate::pipeline::zones::ZoneSet;
use serde::Serialize;

/// The current zone/rule/court configuration, passed explicitly into every
/// analysis so edits take effect on the next recompute.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInputs<'a> {
    pub zones: &'a ZoneSet,
    pub rules: &'a RuleSet,
    /// Two-corner boundary or perspective court
    pub boundary: Option<&'a dyn CourtGrid>,
    pub target_cells: &'a [usize],
}

/// Everything derived from one trajectory snapshot
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Analysis {
    pub report: ScoreReport,
    pub landings: Vec<Point>,
    /// Only available when a court is configured
    pub buckets: Option<BucketStats>,
}

/// Full, from-scratch analysis of `points`
pub fn analyze(points: &[TrajectoryPoint], inputs: &AnalysisInputs) -> Analysis {
    let report = evaluate(points, inputs.zones, inputs.rules);
    let landings = detect_landings(points, inputs.boundary);
    let buckets = inputs
        .boundary
        .map(|b| BucketStats::compute(b, &landings, inputs.target_cells));

    Analysis {
        report,
        landings,
        buckets,
    }
}
