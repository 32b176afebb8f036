use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Recorded detections file, or a directory of them
    #[arg(long, env = "RALLY_ZONES_INPUT")]
    pub input: PathBuf,

    /// Session configuration (zones, rules, court boundary, target cells)
    #[arg(long, env = "RALLY_ZONES_SESSION")]
    pub session: PathBuf,

    /// Root directory for output artifacts
    #[arg(long, env = "RALLY_ZONES_OUTPUT_ROOT")]
    pub output_root: PathBuf,

    /// Seconds between sampled frames (overrides the session file)
    #[arg(long)]
    pub interval: Option<f64>,

    /// Concurrent detection requests (overrides the session file)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Disable the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
