use crate::pipeline::types::Point;
use crate::pipeline::zones::Boundary;
use serde::Serialize;
use std::fmt;

/// Cells per side of the placement grid
pub const GRID_SIZE: usize = 3;
pub const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// `Zone1`..`Zone9`, left-to-right then top-to-bottom
pub fn cell_label(index: usize) -> String {
    format!("Zone{}", index + 1)
}

/// A court region the placement grid can be laid over
pub trait CourtGrid: fmt::Debug {
    /// Grid cell (row-major, 0-8) containing `p`, if any
    fn cell_index(&self, p: Point) -> Option<usize>;

    /// Whether `p` lies on the court
    fn contains(&self, p: Point) -> bool;
}

impl CourtGrid for Boundary {
    fn cell_index(&self, p: Point) -> Option<usize> {
        cell_index(self, p)
    }

    fn contains(&self, p: Point) -> bool {
        Boundary::contains(self, p)
    }
}

/// Grid cell (row-major, 0-8) containing `p`, if any. The far edges of the
/// boundary are outside the grid.
pub fn cell_index(boundary: &Boundary, p: Point) -> Option<usize> {
    let (origin, width, height) = boundary.extent();
    if width <= 0.0 || height <= 0.0 {
        return None;
    }

    let cell_w = width / GRID_SIZE as f64;
    let cell_h = height / GRID_SIZE as f64;
    let col = ((p.x - origin.x) / cell_w).floor();
    let row = ((p.y - origin.y) / cell_h).floor();

    let range = 0.0..GRID_SIZE as f64;
    if range.contains(&col) && range.contains(&row) {
        Some(row as usize * GRID_SIZE + col as usize)
    } else {
        None
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CellStats {
    pub index: usize,
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

/// Landing placement over a 3x3 grid laid on the court
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BucketStats {
    pub cells: Vec<CellStats>,
    /// Landings that fell inside the grid
    pub total_landings: usize,
    pub target_cells: Vec<usize>,
    pub target_hits: usize,
    /// Percentage of landings inside the target cells
    pub efficiency: f64,
}

impl BucketStats {
    /// Recomputes all statistics from scratch. Landings outside the grid are
    /// not counted anywhere; unknown target indices are ignored.
    pub fn compute(court: &dyn CourtGrid, landings: &[Point], target_cells: &[usize]) -> Self {
        let mut counts = [0usize; CELL_COUNT];
        let mut total_landings = 0;
        for &p in landings {
            if let Some(idx) = court.cell_index(p) {
                counts[idx] += 1;
                total_landings += 1;
            }
        }

        let mut targets: Vec<usize> = target_cells
            .iter()
            .copied()
            .filter(|&i| i < CELL_COUNT)
            .collect();
        targets.sort_unstable();
        targets.dedup();

        let target_hits = targets.iter().map(|&i| counts[i]).sum();

        let cells = counts
            .iter()
            .enumerate()
            .map(|(index, &count)| CellStats {
                index,
                label: cell_label(index),
                count,
                percentage: percentage(count, total_landings),
            })
            .collect();

        Self {
            cells,
            total_landings,
            efficiency: percentage(target_hits, total_landings),
            target_cells: targets,
            target_hits,
        }
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
