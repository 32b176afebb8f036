mod cli;

use anyhow::{anyhow, bail, Context, Result};
use cli::Args;
use indicatif::{ProgressBar, ProgressStyle};
use rally_zones::pipeline::analysis::{analyze, Analysis, AnalysisInputs};
use rally_zones::pipeline::export::{write_serve_csv, write_trajectory_csv, ServeExport};
use rally_zones::pipeline::sampler::{
    sample_times, sample_trajectory, RecordedDetections, SamplerConfig,
};
use rally_zones::pipeline::trajectory::Trajectory;
use rally_zones::pipeline::types::{ProcessingState, STAGE_ANALYZE, STAGE_DETECT};
use rally_zones::run_artifacts::{Recording, SamplingConfig, SessionConfig};
use rally_zones::run_context::{
    create_run, create_run_artifact_file, discard_run, list_recordings, list_runs, run_id_for,
    write_json_artifact, RunMetadata,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse_args();

    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let session = SessionConfig::load(&args.session)?;
    let (zones, rules) = session
        .build()
        .context("Invalid session configuration")?;
    let court = session
        .court_grid()
        .context("Invalid court configuration")?;
    tracing::info!(
        "Loaded session with {} zones and {} rules",
        zones.len(),
        rules.len()
    );

    let sampling = SamplingConfig {
        interval: args.interval.unwrap_or(session.sampling.interval),
        workers: args.workers.unwrap_or(session.sampling.workers),
    };

    let recordings = list_recordings(&args.input);
    if recordings.is_empty() {
        bail!("No recordings found under {:?}", args.input);
    }

    let existing: HashSet<String> = list_runs(&args.output_root)?
        .into_iter()
        .map(|run| run.run_id)
        .collect();

    let inputs = AnalysisInputs {
        zones: &zones,
        rules: &rules,
        boundary: court.as_deref(),
        target_cells: &session.target_cells,
    };

    let mut processed = 0;
    let mut failures = 0;
    for path in &recordings {
        let run_id = match run_id_for(path) {
            Ok(id) => id,
            Err(e) => {
                failures += 1;
                processed += 1;
                tracing::error!("Failed to process {:?}: {:#}", path, e);
                continue;
            }
        };
        if existing.contains(&run_id) {
            tracing::info!("Skipping {:?}: run {} already exists", path, run_id);
            continue;
        }

        processed += 1;
        if let Err(e) = process_recording(path, &run_id, args, &session, &inputs, &sampling) {
            failures += 1;
            tracing::error!("Failed to process {:?}: {:#}", path, e);
        }
    }

    if processed > 0 && failures == processed {
        bail!("All {} recordings failed", failures);
    }

    Ok(())
}

fn progress_bar(len: usize, hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec:.1.yellow} samples, {eta})")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn process_recording(
    path: &Path,
    run_id: &str,
    args: &Args,
    session: &SessionConfig,
    inputs: &AnalysisInputs,
    sampling: &SamplingConfig,
) -> Result<()> {
    let recording = Recording::load(path)?;

    let source = RecordedDetections::new(recording, sampling.interval);
    let config = SamplerConfig {
        duration: source.duration(),
        interval: sampling.interval,
        workers: sampling.workers,
    };
    let times = sample_times(config.duration, config.interval)?;
    let state = ProcessingState::new(run_id.to_string(), times.len());
    let pb = progress_bar(times.len(), args.no_progress)?;

    let trajectory = std::thread::scope(|scope| {
        let handle =
            scope.spawn(|| sample_trajectory(&source, &config, &session.selector, &state));
        while !handle.is_finished() {
            pb.set_position(state.stage_current(STAGE_DETECT) as u64);
            std::thread::sleep(Duration::from_millis(100));
        }
        handle
            .join()
            .map_err(|_| anyhow!("Sampling thread panicked"))?
    })?;
    pb.set_position(state.stage_current(STAGE_DETECT) as u64);
    pb.finish_with_message("Done");

    let start_inst = Instant::now();
    let analysis = analyze(trajectory.points(), inputs);
    let duration_ms = start_inst.elapsed().as_secs_f64() * 1000.0;
    state.update_stage(STAGE_ANALYZE, trajectory.len(), duration_ms);
    state.is_complete.store(true, Ordering::Relaxed);
    state.is_active.store(false, Ordering::Relaxed);

    // Only a fully analyzed recording gets a run directory
    let run = create_run(&args.output_root, path)?;
    let export = ServeExport {
        court: inputs.boundary,
        target_cells: inputs.target_cells,
        visibility_threshold: session.visibility_threshold,
    };
    if let Err(e) = write_artifacts(&run, &times, &trajectory, &analysis, &export, &state) {
        if let Err(cleanup) = discard_run(&run) {
            tracing::warn!("Could not remove {:?}: {}", run.output_dir, cleanup);
        }
        return Err(e);
    }

    tracing::info!(
        "{}: score {} from {} events, {} landings{}",
        run.run_id,
        analysis.report.score,
        analysis.report.events.len(),
        analysis.landings.len(),
        analysis
            .buckets
            .as_ref()
            .map(|b| format!(", target efficiency {:.1}%", b.efficiency))
            .unwrap_or_default()
    );

    Ok(())
}

fn write_artifacts(
    run: &RunMetadata,
    times: &[f64],
    trajectory: &Trajectory,
    analysis: &Analysis,
    export: &ServeExport,
    state: &ProcessingState,
) -> Result<()> {
    write_trajectory_csv(
        create_run_artifact_file(run, "trajectory.csv")?,
        trajectory.points(),
    )?;
    write_serve_csv(
        create_run_artifact_file(run, "serve_analysis.csv")?,
        times,
        trajectory.points(),
        &analysis.landings,
        export,
    )?;
    write_json_artifact(run, "score.json", &analysis.report)?;
    write_json_artifact(run, "landings.json", &analysis.landings)?;
    if let Some(buckets) = &analysis.buckets {
        write_json_artifact(run, "buckets.json", buckets)?;
    }
    write_json_artifact(run, "progress.json", &state.to_progress_json())?;
    Ok(())
}
