use crate::pipeline::types::{BBox, Point};
use serde::{Deserialize, Serialize};

/// A single detector hit for one frame
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Detection {
    #[serde(alias = "name", alias = "className")]
    pub class_name: String,
    #[serde(alias = "class", alias = "classId")]
    pub class_id: i64,
    #[serde(alias = "confidenceScore")]
    pub confidence: f64,
    #[serde(rename = "box")]
    pub bbox: BBox,
}

/// Picks the tracked object out of a frame's detections.
///
/// A detection qualifies when its class name is one of the accepted synonyms
/// or its numeric class id is one of the accepted ids. Among qualifying
/// detections the most confident one wins.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DetectionSelector {
    pub class_names: Vec<String>,
    pub class_ids: Vec<i64>,
    #[serde(default)]
    pub min_confidence: f64,
}

impl Default for DetectionSelector {
    fn default() -> Self {
        Self {
            class_names: vec![
                "volleyball".to_string(),
                "sports ball".to_string(),
                "ball".to_string(),
            ],
            class_ids: vec![0, 32],
            min_confidence: 0.0,
        }
    }
}

impl DetectionSelector {
    pub fn matches(&self, detection: &Detection) -> bool {
        let class_ok = self.class_names.iter().any(|n| *n == detection.class_name)
            || self.class_ids.contains(&detection.class_id);
        class_ok && detection.confidence >= self.min_confidence
    }

    /// Best single detection for a frame, if any qualifies.
    /// Ties keep the earlier detection.
    pub fn select<'a>(&self, detections: &'a [Detection]) -> Option<&'a Detection> {
        let mut candidates: Vec<&Detection> =
            detections.iter().filter(|d| self.matches(d)).collect();
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        candidates.into_iter().next()
    }
}

/// One observed position of the tracked object
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrajectoryPoint {
    /// Seconds from the start of the video or live session
    pub time: f64,
    pub bbox: BBox,
    /// Midpoint of `bbox`
    pub center: Point,
    pub confidence: f64,
    pub class_name: String,
}

impl TrajectoryPoint {
    pub fn new(time: f64, bbox: BBox, confidence: f64, class_name: impl Into<String>) -> Self {
        Self {
            time,
            bbox,
            center: bbox.center(),
            confidence,
            class_name: class_name.into(),
        }
    }

    pub fn from_detection(time: f64, detection: &Detection) -> Self {
        Self::new(
            time,
            detection.bbox,
            detection.confidence,
            detection.class_name.clone(),
        )
    }
}

/// Stable ascending sort by time
pub fn sort_by_time(points: &mut [TrajectoryPoint]) {
    points.sort_by(|a, b| a.time.total_cmp(&b.time));
}

/// Time-sorted copy of `points`
pub fn sorted_by_time(points: &[TrajectoryPoint]) -> Vec<TrajectoryPoint> {
    let mut sorted = points.to_vec();
    sort_by_time(&mut sorted);
    sorted
}

/// Append-only sequence of observations. Points may arrive out of order
/// (concurrent detection requests); `finalize` restores time order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: TrajectoryPoint) {
        self.points.push(point);
    }

    /// Selects the best detection for the frame at `time` and appends it.
    /// Frames with no qualifying detection leave a gap and return false.
    pub fn push_frame(
        &mut self,
        time: f64,
        detections: &[Detection],
        selector: &DetectionSelector,
    ) -> bool {
        match selector.select(detections) {
            Some(best) => {
                self.push(TrajectoryPoint::from_detection(time, best));
                true
            }
            None => false,
        }
    }

    pub fn finalize(&mut self) {
        sort_by_time(&mut self.points);
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<TrajectoryPoint> for Trajectory {
    fn from_iter<I: IntoIterator<Item = TrajectoryPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// Zero-size box at (x, y) so the center is exact
#[cfg(test)]
pub(crate) fn sample_point(time: f64, x: f64, y: f64) -> TrajectoryPoint {
    TrajectoryPoint::new(
        time,
        BBox {
            x1: x,
            y1: y,
            x2: x,
            y2: y,
        },
        0.9,
        "ball",
    )
}
