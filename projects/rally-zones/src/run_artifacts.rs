// Run artifact struct definitions
//
// This module contains the struct definitions for files read at the start of
// a run (session configuration, recorded detections) and the value types
// shared with the pipeline.

use crate::pipeline::buckets::CourtGrid;
use crate::pipeline::court::{CourtQuad, PerspectiveCourt};
use crate::pipeline::error::ValidationError;
use crate::pipeline::export::DEFAULT_VISIBILITY_THRESHOLD;
use crate::pipeline::rules::{Rule, RuleSet};
use crate::pipeline::trajectory::{Detection, DetectionSelector};
use crate::pipeline::zones::{Boundary, Zone, ZoneSet};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A 2D point in source-video pixel coordinates
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Point> for geo_types::Coord<f64> {
    fn from(p: Point) -> Self {
        geo_types::coord! { x: p.x, y: p.y }
    }
}

/// Corner-form bounding box as reported by the detector
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BBox {
    pub fn center(&self) -> Point {
        Point {
            x: (self.x1 + self.x2) / 2.0,
            y: (self.y1 + self.y2) / 2.0,
        }
    }
}

/// Batch sampling parameters
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SamplingConfig {
    /// Seconds between sampled frames
    pub interval: f64,
    /// Concurrent detection requests
    pub workers: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval: 0.1,
            workers: 3,
        }
    }
}

/// Everything the user configures for a session, as stored in session.json
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionConfig {
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Axis-aligned court from two corners
    #[serde(default)]
    pub boundary: Option<Boundary>,
    /// Court from four corners seen in perspective
    #[serde(default)]
    pub court: Option<CourtQuad>,
    #[serde(default)]
    pub target_cells: Vec<usize>,
    /// Confidence a sample must exceed to be placed in the serve report
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f64,
    #[serde(default)]
    pub selector: DetectionSelector,
    #[serde(default)]
    pub sampling: SamplingConfig,
}

fn default_visibility_threshold() -> f64 {
    DEFAULT_VISIBILITY_THRESHOLD
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            zones: Vec::new(),
            rules: Vec::new(),
            boundary: None,
            court: None,
            target_cells: Vec::new(),
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            selector: DetectionSelector::default(),
            sampling: SamplingConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session config at {:?}", path))?;
        let config: SessionConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid session config at {:?}", path))?;
        Ok(config)
    }

    /// Builds the zone and rule sets, running every rule through the same
    /// validation the interactive editor applies.
    pub fn build(&self) -> Result<(ZoneSet, RuleSet), ValidationError> {
        let mut zones = ZoneSet::new();
        for zone in &self.zones {
            zones.insert(zone.clone())?;
        }

        let mut rules = RuleSet::new();
        for rule in &self.rules {
            rules.add(rule.clone(), &zones)?;
        }

        Ok((zones, rules))
    }

    /// The court placement grid, if one is configured. Boundary and corners
    /// are mutually exclusive.
    pub fn court_grid(&self) -> Result<Option<Box<dyn CourtGrid>>, ValidationError> {
        match (&self.boundary, &self.court) {
            (Some(_), Some(_)) => Err(ValidationError::ConflictingCourt),
            (Some(boundary), None) => Ok(Some(Box::new(*boundary))),
            (None, Some(quad)) => Ok(Some(Box::new(PerspectiveCourt::new(*quad)?))),
            (None, None) => Ok(None),
        }
    }
}

/// One sampled frame of a detections recording
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RecordedFrame {
    pub time: f64,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// Detector output captured for a whole video, replayed in place of live
/// inference.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Recording {
    /// Total video duration in seconds
    pub duration: f64,
    pub frames: Vec<RecordedFrame>,
}

impl Recording {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read recording at {:?}", path))?;
        let recording: Recording = serde_json::from_str(&content)
            .with_context(|| format!("Invalid recording at {:?}", path))?;
        Ok(recording)
    }

    /// Frame answering the sample at `time` on an `interval` grid.
    ///
    /// Every recorded frame belongs to exactly one sample slot (the nearest
    /// grid index, halfway frames rounding up), so a frame is never returned
    /// for two samples. If several frames share a slot the one closest to
    /// `time` wins.
    pub fn frame_for_sample(&self, time: f64, interval: f64) -> Option<&RecordedFrame> {
        let slot = (time / interval).round();
        self.frames
            .iter()
            .filter(|f| sample_slot(f.time, interval) == slot)
            .min_by(|a, b| (a.time - time).abs().total_cmp(&(b.time - time).abs()))
    }
}

/// Absorbs division noise so frames recorded exactly halfway between two
/// samples round the same way.
const SLOT_EPSILON: f64 = 1e-9;

fn sample_slot(time: f64, interval: f64) -> f64 {
    (time / interval + 0.5 + SLOT_EPSILON).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::rules::{Action, Condition};
    use crate::pipeline::zones::ZoneKind;

    #[test]
    fn test_session_config_builds_sets() {
        let json = r##"{
            "zones": [
                {"id": "net", "kind": "line", "points": [{"x": 0, "y": 0}, {"x": 10, "y": 0}], "label": "Net", "color": "#ff0000"},
                {"id": "deep", "kind": "rectangle", "points": [{"x": 0, "y": 0}, {"x": 10, "y": 10}], "label": "Deep", "color": "#00ff00"}
            ],
            "rules": [
                {"id": "r1", "zone_id": "net", "condition": "cross", "action": "add", "points": 5},
                {"id": "r2", "zone_id": "deep", "condition": "inside", "action": "deduct", "points": 1}
            ],
            "target_cells": [0, 4]
        }"##;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.sampling.workers, 3);
        assert!(config.boundary.is_none());

        let (zones, rules) = config.build().unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones.get("deep").unwrap().kind, ZoneKind::Rectangle);
        assert_eq!(rules.len(), 2);
        let r2 = rules.iter().nth(1).unwrap();
        assert_eq!(r2.condition, Condition::Inside);
        assert_eq!(r2.action, Action::Deduct);
    }

    #[test]
    fn test_session_config_rejects_invalid_rule() {
        let json = r##"{
            "zones": [
                {"id": "c", "kind": "circle", "points": [{"x": 0, "y": 0}, {"x": 5, "y": 0}], "label": "Ring", "color": "blue"}
            ],
            "rules": [
                {"id": "r1", "zone_id": "c", "condition": "cross", "action": "add", "points": 5}
            ]
        }"##;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        let err = config.build().unwrap_err();
        assert!(matches!(err, ValidationError::CrossRequiresLine { .. }));
    }

    #[test]
    fn test_court_grid_selection() {
        let config = SessionConfig::default();
        assert!(config.court_grid().unwrap().is_none());
        assert_eq!(config.visibility_threshold, 0.5);

        let json = r#"{
            "court": {"corners": [{"x": 100, "y": 100}, {"x": 800, "y": 100},
                                  {"x": 900, "y": 500}, {"x": 0, "y": 500}]},
            "target_cells": [4],
            "visibility_threshold": 0.3
        }"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.visibility_threshold, 0.3);
        let court = config.court_grid().unwrap().unwrap();
        assert_eq!(court.cell_index(Point::new(450.0, 275.0)), Some(4));

        let both = SessionConfig {
            boundary: Some(Boundary::new(Point::new(0.0, 0.0), Point::new(90.0, 90.0))),
            ..config.clone()
        };
        assert_eq!(
            both.court_grid().unwrap_err(),
            ValidationError::ConflictingCourt
        );

        let boundary_only = SessionConfig {
            court: None,
            ..both
        };
        let court = boundary_only.court_grid().unwrap().unwrap();
        assert_eq!(court.cell_index(Point::new(90.0, 45.0)), None);
        assert!(court.contains(Point::new(90.0, 45.0)));
    }

    #[test]
    fn test_bow_tie_court_rejected() {
        let config = SessionConfig {
            court: Some(CourtQuad::new(
                Point::new(0.0, 0.0),
                Point::new(100.0, 100.0),
                Point::new(100.0, 0.0),
                Point::new(0.0, 100.0),
            )),
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.court_grid(),
            Err(ValidationError::InvalidCourt)
        ));
    }

    fn frames_at(times: &[f64]) -> Recording {
        Recording {
            duration: 1.0,
            frames: times
                .iter()
                .map(|&time| RecordedFrame {
                    time,
                    detections: vec![],
                })
                .collect(),
        }
    }

    #[test]
    fn test_frame_for_sample_nearest_slot() {
        let recording = frames_at(&[0.0, 0.31]);
        assert_eq!(recording.frame_for_sample(0.3, 0.1).unwrap().time, 0.31);
        assert_eq!(recording.frame_for_sample(0.0, 0.1).unwrap().time, 0.0);
        assert!(recording.frame_for_sample(0.1, 0.1).is_none());
        assert!(recording.frame_for_sample(0.2, 0.1).is_none());
    }

    #[test]
    fn test_halfway_frames_used_once() {
        let times = [0.05, 0.15, 0.25, 0.35, 0.45, 0.55];
        let recording = frames_at(&times);

        let matched: Vec<f64> = (0..7)
            .filter_map(|k| recording.frame_for_sample(k as f64 * 0.1, 0.1))
            .map(|f| f.time)
            .collect();
        // each frame answers exactly one sample, in order
        assert_eq!(matched, times.to_vec());
    }

    #[test]
    fn test_shared_slot_keeps_closest_frame() {
        let recording = frames_at(&[0.06, 0.1, 0.12]);
        assert_eq!(recording.frame_for_sample(0.1, 0.1).unwrap().time, 0.1);
        assert!(recording.frame_for_sample(0.0, 0.1).is_none());
    }

    #[test]
    fn test_bbox_center() {
        let b = BBox {
            x1: 10.0,
            y1: 20.0,
            x2: 30.0,
            y2: 60.0,
        };
        assert_eq!(b.center(), Point::new(20.0, 40.0));
    }
}
