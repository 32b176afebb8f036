// Batch sampler: walks a video's duration at a fixed interval, asks the
// detection source about each sampled frame on a small worker pool, and
// assembles the finalized trajectory.

use crate::pipeline::trajectory::{Detection, DetectionSelector, Trajectory};
use crate::pipeline::types::{ProcessingState, STAGE_DETECT};
use crate::run_artifacts::Recording;
use anyhow::{bail, Result};
use crossbeam::channel;
use std::sync::atomic::Ordering;
use std::time::Instant;

/// Produces the detections for the frame at a given time. This separates
/// "where detections come from" (remote API, local model, recording) from the
/// sampling and scoring logic.
pub trait DetectionSource: Send + Sync {
    fn detect(&self, time: f64) -> Result<Vec<Detection>>;
}

/// Blanket implementation so any closure with the right signature
/// automatically implements DetectionSource.
impl<F> DetectionSource for F
where
    F: Fn(f64) -> Result<Vec<Detection>> + Send + Sync,
{
    fn detect(&self, time: f64) -> Result<Vec<Detection>> {
        self(time)
    }
}

/// Replays a recording on a fixed sampling grid. Each recorded frame answers
/// at most one sample; samples with no frame in their slot come back empty.
pub struct RecordedDetections {
    recording: Recording,
    interval: f64,
}

impl RecordedDetections {
    pub fn new(recording: Recording, interval: f64) -> Self {
        Self {
            recording,
            interval,
        }
    }

    pub fn duration(&self) -> f64 {
        self.recording.duration
    }
}

impl DetectionSource for RecordedDetections {
    fn detect(&self, time: f64) -> Result<Vec<Detection>> {
        Ok(self
            .recording
            .frame_for_sample(time, self.interval)
            .map(|f| f.detections.clone())
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Seconds of video to cover
    pub duration: f64,
    /// Seconds between samples
    pub interval: f64,
    /// Concurrent detection requests
    pub workers: usize,
}

/// Upper bound on samples per run
pub const MAX_SAMPLES: usize = 1_000_000;

/// Sample times `0, interval, 2*interval, ...` strictly below `duration`.
/// Each time is computed from its index so rounding does not accumulate.
/// Fails when the grid would exceed `MAX_SAMPLES`.
pub fn sample_times(duration: f64, interval: f64) -> Result<Vec<f64>> {
    if interval.is_nan() || interval <= 0.0 || duration.is_nan() || duration <= 0.0 {
        return Ok(Vec::new());
    }
    let count = (duration / interval).ceil();
    if count > MAX_SAMPLES as f64 {
        bail!(
            "Sampling {:.3}s every {}s needs {} samples (limit {})",
            duration,
            interval,
            count,
            MAX_SAMPLES
        );
    }
    // one extra index covers rounding in the division
    Ok((0..=count as usize)
        .map(|k| k as f64 * interval)
        .take_while(|&t| t < duration)
        .collect())
}

/// Runs the detection source over every sample time and builds the
/// trajectory.
///
/// Requests run on `config.workers` threads and complete in any order; the
/// trajectory is time-sorted before it is returned. A failed request or a
/// frame without a qualifying detection leaves a gap instead of aborting.
/// Clearing `state.is_active` stops the run early with whatever was
/// collected so far.
pub fn sample_trajectory<S: DetectionSource>(
    source: &S,
    config: &SamplerConfig,
    selector: &DetectionSelector,
    state: &ProcessingState,
) -> Result<Trajectory> {
    if config.workers == 0 {
        bail!("At least one sampling worker is required");
    }

    let times = sample_times(config.duration, config.interval)?;
    tracing::info!(
        "Sampling {} frames every {:.3}s with {} workers",
        times.len(),
        config.interval,
        config.workers
    );

    let (job_tx, job_rx) = channel::unbounded::<f64>();
    for &t in &times {
        job_tx.send(t)?;
    }
    drop(job_tx);

    let (result_tx, result_rx) = channel::unbounded::<(f64, Result<Vec<Detection>>, f64)>();
    let mut trajectory = Trajectory::new();

    std::thread::scope(|scope| {
        for worker_id in 0..config.workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                tracing::debug!("Detection worker {} started", worker_id);
                for time in job_rx {
                    if !state.is_active.load(Ordering::Relaxed) {
                        break;
                    }
                    let start_inst = Instant::now();
                    let result = source.detect(time);
                    let duration_ms = start_inst.elapsed().as_secs_f64() * 1000.0;
                    if result_tx.send((time, result, duration_ms)).is_err() {
                        break; // Receiver closed
                    }
                }
                tracing::debug!("Detection worker {} finished", worker_id);
            });
        }
        drop(result_tx);

        let mut completed = 0;
        for (time, result, duration_ms) in result_rx {
            completed += 1;
            match result {
                Ok(detections) => {
                    if trajectory.push_frame(time, &detections, selector) {
                        state.points_found.fetch_add(1, Ordering::Relaxed);
                    } else {
                        tracing::debug!("No tracked object at {:.2}s", time);
                    }
                }
                Err(e) => {
                    state.failed_samples.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("Detection failed at {:.2}s: {}", time, e);
                }
            }
            state.update_stage(STAGE_DETECT, completed, duration_ms);
        }
    });

    trajectory.finalize();
    tracing::info!(
        "Sampling finished: {} points from {} frames ({} failed)",
        trajectory.len(),
        times.len(),
        state.failed_samples.load(Ordering::Relaxed)
    );

    Ok(trajectory)
}
