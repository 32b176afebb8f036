// Live session: points arrive one at a time from a running feed and every
// arrival re-runs the full analysis over everything collected so far.

use crate::pipeline::analysis::{analyze, Analysis, AnalysisInputs};
use crate::pipeline::trajectory::{Detection, DetectionSelector, Trajectory, TrajectoryPoint};
use crossbeam::channel::Receiver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub struct LiveSession {
    trajectory: Trajectory,
    is_active: Arc<AtomicBool>,
    start_time: Instant,
}

impl Default for LiveSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveSession {
    pub fn new() -> Self {
        Self {
            trajectory: Trajectory::new(),
            is_active: Arc::new(AtomicBool::new(true)),
            start_time: Instant::now(),
        }
    }

    /// Flag shared with whoever may stop the session from another thread
    pub fn active_flag(&self) -> Arc<AtomicBool> {
        self.is_active.clone()
    }

    pub fn is_active(&self) -> bool {
        self.is_active.load(Ordering::Relaxed)
    }

    /// Stops accepting points. Points already appended stay.
    pub fn stop(&self) {
        self.is_active.store(false, Ordering::Relaxed);
    }

    /// Seconds since the session started; used as the time of live samples
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Stamps the frame's best detection with the session clock.
    /// Returns None when nothing qualifies.
    pub fn point_from_detections(
        &self,
        detections: &[Detection],
        selector: &DetectionSelector,
    ) -> Option<TrajectoryPoint> {
        selector
            .select(detections)
            .map(|best| TrajectoryPoint::from_detection(self.elapsed_secs(), best))
    }

    /// Appends a point and returns a fresh analysis of the whole trajectory,
    /// or None if the session has been stopped.
    pub fn push(&mut self, point: TrajectoryPoint, inputs: &AnalysisInputs) -> Option<Analysis> {
        if !self.is_active() {
            tracing::debug!("Ignoring point at {:.2}s: session stopped", point.time);
            return None;
        }
        self.trajectory.push(point);
        Some(self.snapshot(inputs))
    }

    /// Full recompute over the current trajectory
    pub fn snapshot(&self, inputs: &AnalysisInputs) -> Analysis {
        analyze(self.trajectory.points(), inputs)
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }
}

/// Feeds points from `rx` into the session until the channel closes or the
/// session is stopped, handing each recomputed analysis to `on_update`.
/// Returns the number of points appended.
pub fn run_live<F>(
    rx: Receiver<TrajectoryPoint>,
    session: &mut LiveSession,
    inputs: &AnalysisInputs,
    mut on_update: F,
) -> usize
where
    F: FnMut(&Analysis),
{
    let mut appended = 0;
    for point in rx {
        match session.push(point, inputs) {
            Some(analysis) => {
                appended += 1;
                on_update(&analysis);
            }
            None => break,
        }
    }
    tracing::info!(
        "Live session ended after {} points (score {})",
        appended,
        session.snapshot(inputs).report.score
    );
    appended
}
