use crate::pipeline::buckets::{cell_label, CourtGrid};
use crate::pipeline::trajectory::TrajectoryPoint;
use crate::pipeline::types::Point;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

/// Detections at or below this confidence are treated as not visible
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.5;

#[derive(Serialize)]
struct TrajectoryRow {
    index: usize,
    time: f64,
    x: f64,
    y: f64,
    confidence: f64,
}

#[derive(Serialize)]
struct ServeRow<'a> {
    index: usize,
    time: f64,
    visibility: u8,
    x: f64,
    y: f64,
    confidence: f64,
    is_landing: u8,
    zone: String,
    hit_target: &'a str,
}

/// Writes one row per trajectory point: `index,time,x,y,confidence`.
pub fn write_trajectory_csv<W: Write>(writer: W, points: &[TrajectoryPoint]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (index, p) in points.iter().enumerate() {
        wtr.serialize(TrajectoryRow {
            index,
            time: p.time,
            x: p.center.x,
            y: p.center.y,
            confidence: p.confidence,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Whether the sample is one of the landings. Matches on exact coordinate
/// equality, so a landing only maps back to the sample it was taken from.
fn is_landing_sample(point: &TrajectoryPoint, landings: &[Point]) -> bool {
    landings
        .iter()
        .any(|l| l.x == point.center.x && l.y == point.center.y)
}

/// Court placement settings for the serve report
#[derive(Debug, Clone, Copy)]
pub struct ServeExport<'a> {
    pub court: Option<&'a dyn CourtGrid>,
    pub target_cells: &'a [usize],
    /// Confidence a sample must exceed to be placed on the grid
    pub visibility_threshold: f64,
}

impl<'a> ServeExport<'a> {
    pub fn new(court: Option<&'a dyn CourtGrid>, target_cells: &'a [usize]) -> Self {
        Self {
            court,
            target_cells,
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
        }
    }
}

/// Serve report with one row per sampled frame:
/// `index,time,visibility,x,y,confidence,is_landing,zone,hit_target`.
///
/// Sample times without a trajectory point are written as not visible with
/// zeroed coordinates. Only visible samples get a grid cell and target hit.
/// With no `sample_times` the rows are the trajectory points alone.
pub fn write_serve_csv<W: Write>(
    writer: W,
    sample_times: &[f64],
    points: &[TrajectoryPoint],
    landings: &[Point],
    export: &ServeExport,
) -> Result<()> {
    let mut rows: Vec<(f64, Option<&TrajectoryPoint>)> =
        points.iter().map(|p| (p.time, Some(p))).collect();
    rows.extend(
        sample_times
            .iter()
            .filter(|&&t| !points.iter().any(|p| p.time == t))
            .map(|&t| (t, None)),
    );
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut wtr = csv::Writer::from_writer(writer);
    for (index, (time, point)) in rows.into_iter().enumerate() {
        let row = match point.filter(|p| p.confidence > export.visibility_threshold) {
            Some(p) => {
                let cell = export.court.and_then(|c| c.cell_index(p.center));
                let hit = cell.is_some_and(|c| export.target_cells.contains(&c));
                ServeRow {
                    index,
                    time,
                    visibility: 1,
                    x: p.center.x,
                    y: p.center.y,
                    confidence: p.confidence,
                    is_landing: u8::from(is_landing_sample(p, landings)),
                    zone: cell.map(cell_label).unwrap_or_else(|| "-".to_string()),
                    hit_target: if hit { "Yes" } else { "No" },
                }
            }
            None => ServeRow {
                index,
                time,
                visibility: 0,
                x: 0.0,
                y: 0.0,
                confidence: point.map_or(0.0, |p| p.confidence),
                is_landing: 0,
                zone: "-".to_string(),
                hit_target: "No",
            },
        };
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
