// Perspective court: four court corners as seen by the camera, mapped onto a
// square top-down court before the placement grid is applied.

use crate::pipeline::buckets::{CourtGrid, GRID_SIZE};
use crate::pipeline::error::ValidationError;
use crate::pipeline::geometry::{orientation, Orientation};
use crate::pipeline::types::Point;
use serde::{Deserialize, Serialize};

/// Side of the virtual top-down court, in top-down pixels
pub const TOP_DOWN_SIZE: f64 = 900.0;

/// Slack for solver rounding on the court edges, in top-down pixels
const EDGE_TOLERANCE: f64 = 1e-6;

/// Court corners in video coordinates: top-left, top-right, bottom-right,
/// bottom-left
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CourtQuad {
    pub corners: [Point; 4],
}

impl CourtQuad {
    pub fn new(top_left: Point, top_right: Point, bottom_right: Point, bottom_left: Point) -> Self {
        Self {
            corners: [top_left, top_right, bottom_right, bottom_left],
        }
    }

    /// Every corner turns the same way and no three are collinear
    pub fn is_convex(&self) -> bool {
        let c = &self.corners;
        let turns: Vec<Orientation> = (0..4)
            .map(|i| orientation(c[i], c[(i + 1) % 4], c[(i + 2) % 4]))
            .collect();
        turns[0] != Orientation::Collinear && turns.iter().all(|&t| t == turns[0])
    }
}

/// 3x3 projective transform, row-major with the last entry fixed at 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    m: [f64; 9],
}

impl Homography {
    /// Transform taking each `src[i]` to `dst[i]`. None when the points are
    /// degenerate (three of them collinear).
    pub fn from_correspondences(src: &[Point; 4], dst: &[Point; 4]) -> Option<Self> {
        // Two equations per correspondence in the eight unknowns h0..h7:
        // u = (h0 x + h1 y + h2) / (h6 x + h7 y + 1)
        // v = (h3 x + h4 y + h5) / (h6 x + h7 y + 1)
        let mut a = [[0.0; 9]; 8];
        for (i, (s, d)) in src.iter().zip(dst).enumerate() {
            a[2 * i] = [s.x, s.y, 1.0, 0.0, 0.0, 0.0, -d.x * s.x, -d.x * s.y, d.x];
            a[2 * i + 1] = [0.0, 0.0, 0.0, s.x, s.y, 1.0, -d.y * s.x, -d.y * s.y, d.y];
        }
        let h = solve_8x8(a)?;
        Some(Self {
            m: [h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0],
        })
    }

    /// Maps `p`; None for points on the vanishing line.
    pub fn apply(&self, p: Point) -> Option<Point> {
        let m = &self.m;
        let w = m[6] * p.x + m[7] * p.y + m[8];
        if w.abs() < 1e-12 {
            return None;
        }
        let x = (m[0] * p.x + m[1] * p.y + m[2]) / w;
        let y = (m[3] * p.x + m[4] * p.y + m[5]) / w;
        Some(Point::new(x, y))
    }
}

/// Solves an 8x8 system given as an augmented matrix, using Gaussian
/// elimination with partial pivoting. None if singular.
fn solve_8x8(mut m: [[f64; 9]; 8]) -> Option<[f64; 8]> {
    const N: usize = 8;

    for col in 0..N {
        let pivot = (col..N).max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))?;
        if m[pivot][col].abs() < 1e-12 {
            return None;
        }
        m.swap(col, pivot);

        for row in (col + 1)..N {
            let factor = m[row][col] / m[col][col];
            for j in col..=N {
                m[row][j] -= factor * m[col][j];
            }
        }
    }

    let mut x = [0.0; N];
    for row in (0..N).rev() {
        let tail: f64 = ((row + 1)..N).map(|j| m[row][j] * x[j]).sum();
        x[row] = (m[row][N] - tail) / m[row][row];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}

/// Court given by four corners in perspective. Points are mapped to a
/// `TOP_DOWN_SIZE` square where the 3x3 grid is laid out; the square's edges
/// belong to the court.
#[derive(Debug, Clone)]
pub struct PerspectiveCourt {
    quad: CourtQuad,
    to_top_down: Homography,
}

impl PerspectiveCourt {
    pub fn new(quad: CourtQuad) -> Result<Self, ValidationError> {
        if !quad.is_convex() {
            return Err(ValidationError::InvalidCourt);
        }
        let square = [
            Point::new(0.0, 0.0),
            Point::new(TOP_DOWN_SIZE, 0.0),
            Point::new(TOP_DOWN_SIZE, TOP_DOWN_SIZE),
            Point::new(0.0, TOP_DOWN_SIZE),
        ];
        let to_top_down = Homography::from_correspondences(&quad.corners, &square)
            .ok_or(ValidationError::InvalidCourt)?;
        Ok(Self { quad, to_top_down })
    }

    pub fn quad(&self) -> &CourtQuad {
        &self.quad
    }

    /// Top-down position of a video point
    pub fn to_top_down(&self, p: Point) -> Option<Point> {
        self.to_top_down.apply(p)
    }

    fn on_court(t: Point) -> bool {
        let range = -EDGE_TOLERANCE..=TOP_DOWN_SIZE + EDGE_TOLERANCE;
        range.contains(&t.x) && range.contains(&t.y)
    }
}

impl CourtGrid for PerspectiveCourt {
    fn cell_index(&self, p: Point) -> Option<usize> {
        let t = self.to_top_down(p).filter(|&t| Self::on_court(t))?;
        let cell = TOP_DOWN_SIZE / GRID_SIZE as f64;
        // the far edges fold into the last row/column
        let col = ((t.x / cell) as usize).min(GRID_SIZE - 1);
        let row = ((t.y / cell) as usize).min(GRID_SIZE - 1);
        Some(row * GRID_SIZE + col)
    }

    fn contains(&self, p: Point) -> bool {
        self.to_top_down(p).is_some_and(Self::on_court)
    }
}
