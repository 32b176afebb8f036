use crate::pipeline::types::Point;
use geo_types::Rect;

/// Euclidean distance between two points
pub fn distance(p1: Point, p2: Point) -> f64 {
    (p1.x - p2.x).hypot(p1.y - p2.y)
}

/// Circle given by its center and any point on the circumference.
/// The boundary counts as inside.
pub fn point_in_circle(p: Point, center: Point, edge_point: Point) -> bool {
    let radius = distance(center, edge_point);
    distance(p, center) <= radius
}

/// Axis-aligned rectangle given by two opposite corners in any order.
/// The boundary counts as inside.
pub fn point_in_rect(p: Point, corner1: Point, corner2: Point) -> bool {
    // Rect::new normalizes the corners into min/max
    let rect: Rect<f64> = Rect::new(corner1, corner2);
    let (min, max) = (rect.min(), rect.max());
    p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
}

/// Turn direction of the ordered triple (a, b, c)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

pub fn orientation(a: Point, b: Point, c: Point) -> Orientation {
    let val = (b.y - a.y) * (c.x - b.x) - (b.x - a.x) * (c.y - b.y);
    if val == 0.0 {
        Orientation::Collinear
    } else if val > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// For collinear p, q, r: whether q lies within the bounding box of segment pr
fn on_segment(p: Point, q: Point, r: Point) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// Whether segment p1-q1 and segment p2-q2 share at least one point,
/// including touching endpoints and collinear overlap.
pub fn segments_intersect(p1: Point, q1: Point, p2: Point, q2: Point) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == Orientation::Collinear && on_segment(p1, p2, q1))
        || (o2 == Orientation::Collinear && on_segment(p1, q2, q1))
        || (o3 == Orientation::Collinear && on_segment(p2, p1, q2))
        || (o4 == Orientation::Collinear && on_segment(p2, q1, q2))
}
