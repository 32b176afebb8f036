use crate::pipeline::buckets::CourtGrid;
use crate::pipeline::trajectory::{sorted_by_time, TrajectoryPoint};
use crate::pipeline::types::Point;

/// Samples on each side of a landing candidate
const HALF_WINDOW: usize = 2;

/// Finds landing points for placement statistics.
///
/// A sample is a landing when its y is strictly greater than the y of the two
/// samples before and the two after it (lowest point on screen over a
/// 5-sample window). This is stricter than the rule engine's 3-sample bounce
/// check and lags two samples behind; the two are intentionally separate.
/// With a court, landings off the court are discarded.
pub fn detect_landings(points: &[TrajectoryPoint], court: Option<&dyn CourtGrid>) -> Vec<Point> {
    let trajectory = sorted_by_time(points);
    if trajectory.len() < 2 * HALF_WINDOW + 1 {
        return Vec::new();
    }

    let mut landings = Vec::new();
    for i in HALF_WINDOW..trajectory.len() - HALF_WINDOW {
        if !is_strict_local_max(&trajectory, i) {
            continue;
        }

        let center = trajectory[i].center;
        if court.map_or(true, |c| c.contains(center)) {
            landings.push(center);
        }
    }

    landings
}

fn is_strict_local_max(trajectory: &[TrajectoryPoint], i: usize) -> bool {
    let y = trajectory[i].center.y;
    (i - HALF_WINDOW..=i + HALF_WINDOW)
        .filter(|&j| j != i)
        .all(|j| y > trajectory[j].center.y)
}
