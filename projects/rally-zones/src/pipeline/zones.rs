use crate::pipeline::error::ValidationError;
use crate::pipeline::geometry::{point_in_circle, point_in_rect, segments_intersect};
use crate::pipeline::types::Point;
use serde::{Deserialize, Serialize};

/// How a zone's two reference points are interpreted
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    /// Segment endpoints
    Line,
    /// Center, then a point on the circumference
    Circle,
    /// Two opposite corners
    Rectangle,
}

/// A user-drawn region used as trigger geometry for rules
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: String,
    pub kind: ZoneKind,
    pub points: [Point; 2],
    pub label: String,
    pub color: String,
}

impl Zone {
    pub fn new(
        id: impl Into<String>,
        kind: ZoneKind,
        points: [Point; 2],
        label: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            points,
            label: label.into(),
            color: color.into(),
        }
    }

    /// Label for event messages, falling back to the id for unnamed zones
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

/// Whether `point` lies in the zone's interior (boundary included).
/// Lines have no interior.
pub fn is_inside(point: Point, zone: &Zone) -> bool {
    let [a, b] = zone.points;
    match zone.kind {
        ZoneKind::Circle => point_in_circle(point, a, b),
        ZoneKind::Rectangle => point_in_rect(point, a, b),
        ZoneKind::Line => false,
    }
}

/// Whether the straight path `prev -> curr` crosses the zone.
/// Only lines can be crossed.
pub fn crosses(prev: Point, curr: Point, zone: &Zone) -> bool {
    let [a, b] = zone.points;
    match zone.kind {
        ZoneKind::Line => segments_intersect(prev, curr, a, b),
        ZoneKind::Circle | ZoneKind::Rectangle => false,
    }
}

/// Court (or target area) rectangle used for landing filtering and grid stats
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    pub corners: [Point; 2],
}

impl Boundary {
    pub fn new(corner1: Point, corner2: Point) -> Self {
        Self {
            corners: [corner1, corner2],
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        point_in_rect(p, self.corners[0], self.corners[1])
    }

    /// Normalized (min corner, width, height)
    pub fn extent(&self) -> (Point, f64, f64) {
        let rect: geo_types::Rect<f64> = geo_types::Rect::new(self.corners[0], self.corners[1]);
        let min = rect.min();
        (Point::new(min.x, min.y), rect.width(), rect.height())
    }
}

/// Zones keyed by id, kept in creation order
#[derive(Debug, Clone, Default)]
pub struct ZoneSet {
    zones: Vec<Zone>,
}

impl ZoneSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, zone: Zone) -> Result<(), ValidationError> {
        if self.get(&zone.id).is_some() {
            return Err(ValidationError::DuplicateZone(zone.id));
        }
        self.zones.push(zone);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }

    /// Removes a zone. Rules that still reference it stop firing; call
    /// `RuleSet::retain_zones` to drop them.
    pub fn remove(&mut self, id: &str) -> Option<Zone> {
        let idx = self.zones.iter().position(|z| z.id == id)?;
        Some(self.zones.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_is_inside_dispatch() {
        let circle = Zone::new("c", ZoneKind::Circle, [pt(0.0, 0.0), pt(5.0, 0.0)], "C", "red");
        assert!(is_inside(pt(5.0, 0.0), &circle));
        assert!(!is_inside(pt(5.0001, 0.0), &circle));

        let rect = Zone::new(
            "r",
            ZoneKind::Rectangle,
            [pt(0.0, 0.0), pt(10.0, 10.0)],
            "R",
            "green",
        );
        assert!(is_inside(pt(0.0, 0.0), &rect));
        assert!(is_inside(pt(10.0, 10.0), &rect));
        assert!(!is_inside(pt(10.1, 5.0), &rect));

        let line = Zone::new("l", ZoneKind::Line, [pt(0.0, 0.0), pt(10.0, 0.0)], "L", "blue");
        assert!(!is_inside(pt(5.0, 0.0), &line));
    }

    #[test]
    fn test_crosses_only_lines() {
        let line = Zone::new("l", ZoneKind::Line, [pt(0.0, 0.0), pt(10.0, 0.0)], "L", "blue");
        assert!(crosses(pt(5.0, -1.0), pt(5.0, 1.0), &line));
        assert!(!crosses(pt(5.0, 1.0), pt(5.0, 2.0), &line));

        let rect = Zone::new(
            "r",
            ZoneKind::Rectangle,
            [pt(0.0, -5.0), pt(10.0, 5.0)],
            "R",
            "green",
        );
        assert!(!crosses(pt(5.0, -10.0), pt(5.0, 10.0), &rect));
    }

    #[test]
    fn test_zone_set_unique_ids_and_removal() {
        let mut zones = ZoneSet::new();
        let z = Zone::new("a", ZoneKind::Circle, [pt(0.0, 0.0), pt(1.0, 0.0)], "", "red");
        zones.insert(z.clone()).unwrap();
        assert_eq!(
            zones.insert(z),
            Err(ValidationError::DuplicateZone("a".to_string()))
        );
        assert_eq!(zones.get("a").unwrap().display_name(), "a");

        assert!(zones.remove("a").is_some());
        assert!(zones.remove("a").is_none());
        assert!(zones.is_empty());
    }

    #[test]
    fn test_boundary_extent_normalizes() {
        let b = Boundary::new(pt(90.0, 60.0), pt(0.0, 0.0));
        let (min, w, h) = b.extent();
        assert_eq!(min, pt(0.0, 0.0));
        assert_eq!(w, 90.0);
        assert_eq!(h, 60.0);
        assert!(b.contains(pt(90.0, 60.0)));
        assert!(!b.contains(pt(-0.5, 10.0)));
    }
}
