use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

pub use crate::run_artifacts::{BBox, Point};

pub const STAGE_DETECT: &str = "detect";
pub const STAGE_ANALYZE: &str = "analyze";

#[derive(Debug, Serialize, Clone)]
pub struct StageProgress {
    pub current: usize,
    pub total: usize,
    pub ms_per_frame: f64,
}

/// Processing state shared between sampling workers and whoever reports progress
#[derive(Debug)]
pub struct ProcessingState {
    pub run_id: String,
    pub total_samples: usize,
    pub is_active: AtomicBool,
    pub is_complete: AtomicBool,
    /// Progress per stage ("detect", "analyze")
    pub stages: RwLock<BTreeMap<String, StageProgress>>,
    /// Number of samples that produced a trajectory point
    pub points_found: AtomicUsize,
    /// Number of samples whose detection call failed
    pub failed_samples: AtomicUsize,
    pub start_time: std::time::Instant,
}

impl ProcessingState {
    pub fn new(run_id: String, total_samples: usize) -> Self {
        let mut stages = BTreeMap::new();
        for stage in [STAGE_DETECT, STAGE_ANALYZE] {
            stages.insert(
                stage.to_string(),
                StageProgress {
                    current: 0,
                    total: total_samples,
                    ms_per_frame: 0.0,
                },
            );
        }

        Self {
            run_id,
            total_samples,
            is_active: AtomicBool::new(true),
            is_complete: AtomicBool::new(false),
            stages: RwLock::new(stages),
            points_found: AtomicUsize::new(0),
            failed_samples: AtomicUsize::new(0),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn update_stage(&self, stage: &str, current: usize, ms_per_frame: f64) {
        if let Ok(mut stages) = self.stages.write() {
            if let Some(progress) = stages.get_mut(stage) {
                progress.current = current;
                // Simple exponential moving average for smoothing durations
                if progress.ms_per_frame == 0.0 {
                    progress.ms_per_frame = ms_per_frame;
                } else {
                    progress.ms_per_frame = progress.ms_per_frame * 0.9 + ms_per_frame * 0.1;
                }
            }
        }
    }

    pub fn stage_current(&self, stage: &str) -> usize {
        self.stages
            .read()
            .ok()
            .and_then(|stages| stages.get(stage).map(|s| s.current))
            .unwrap_or(0)
    }

    pub fn to_progress_json(&self) -> serde_json::Value {
        let stages = self
            .stages
            .read()
            .map(|s| s.clone())
            .unwrap_or_default();

        let detected = stages.get(STAGE_DETECT).map(|s| s.current).unwrap_or(0);
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let effective_fps = if elapsed > 0.0 {
            detected as f64 / elapsed
        } else {
            0.0
        };

        let stages_json: BTreeMap<String, serde_json::Value> = stages
            .iter()
            .map(|(k, v)| {
                (
                    k.clone(),
                    serde_json::json!({
                        "current": v.current,
                        "total": v.total,
                        "ms_per_frame": v.ms_per_frame,
                        "fps": if v.ms_per_frame > 0.0 { 1000.0 / v.ms_per_frame } else { 0.0 }
                    }),
                )
            })
            .collect();

        serde_json::json!({
            "run_id": self.run_id,
            "total_samples": self.total_samples,
            "is_active": self.is_active.load(Ordering::Relaxed),
            "is_complete": self.is_complete.load(Ordering::Relaxed),
            "stages": stages_json,
            "points_found": self.points_found.load(Ordering::Relaxed),
            "failed_samples": self.failed_samples.load(Ordering::Relaxed),
            "effective_fps": effective_fps,
        })
    }
}
