use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "drivesim",
    about = "An arcade circuit driving simulator written in Rust"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug printing (only for non-GUI mode)
    #[clap(short, long)]
    pub debug: bool,

    /// Activate GUI - the session runs in real-time with visualization and keyboard control
    #[clap(short, long)]
    pub gui: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set number of scripted runs for the cruise-factor sweep (only for non-GUI mode)
    #[clap(short, long, default_value = "1")]
    pub no_sim_runs: u32,

    /// Set path to the simulation parameter file (OPTIONAL: if not set, uses the built-in circuit)
    #[clap(short, long)]
    pub parfile_path: Option<PathBuf>,

    /// Set path to an obstacle layout CSV merged into the track before construction
    #[clap(short, long)]
    pub layout_path: Option<PathBuf>,

    /// Set real-time factor (only relevant in GUI mode)
    #[clap(short, long, default_value = "1.0")]
    pub realtime_factor: f64,

    /// Set simulation timestep size in seconds, should be in the range [0.001, 0.05]
    #[clap(short, long, default_value = "0.0167")]
    pub timestep_size: f64,

    /// Set session duration in simulated seconds (0 keeps a GUI session open until the window is
    /// closed; non-GUI runs fall back to 90s)
    #[clap(long, default_value = "0.0")]
    pub duration: f64,
}
