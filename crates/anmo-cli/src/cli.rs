use anmo::core::enm::springs::Spring;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "ANMO - anisotropic elastic network mode analysis across molecular trajectories.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output and progress bars
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare elastic network spectra across the frames of a trajectory.
    Traj(TrajArgs),
    /// Show which atoms of a model a selection picks.
    Select(SelectArgs),
    /// List the available spring functions and their default parameters.
    Springs,
}

/// Arguments for the `traj` subcommand.
///
/// Options left unset fall back to the configuration file, then to the
/// built-in defaults.
#[derive(Args, Debug)]
pub struct TrajArgs {
    /// Model structure (.pdb or Tinker .xyz) defining atoms and connectivity.
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Tinker ARC trajectory whose frames match the model's atom order.
    #[arg(value_name = "TRAJ")]
    pub traj: PathBuf,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Which atoms to build the network from [default: name == 'CA'].
    #[arg(short, long, value_name = "EXPR")]
    pub selection: Option<String>,

    /// Spring function for contacts, e.g. 'exponential,-1.3' [default: distance].
    #[arg(short = 'S', long, value_name = "NAME[,PARAMS]")]
    pub spring: Option<Spring>,

    /// Spring function for bonded atoms; requires model connectivity.
    #[arg(short, long = "bound", value_name = "NAME[,PARAMS]")]
    pub bound: Option<Spring>,

    /// Compare frames by covariance overlap instead of dominant-mode dot products.
    #[arg(short = 'O', long)]
    pub coverlap: bool,

    /// Worker threads for the covariance overlap matrix [default: 2].
    #[arg(short, long, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Number of internal modes for covariance overlap, 0 for all [default: 0].
    #[arg(short, long, value_name = "NUM")]
    pub partial: Option<usize>,

    /// Output prefix for <PREFIX>_s.asc and <PREFIX>_D.asc / <PREFIX>_O.asc [default: anmo_traj].
    #[arg(short = 'o', long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Number of frames to skip from the start of the trajectory [default: 0].
    #[arg(short = 'k', long, value_name = "NUM")]
    pub skip: Option<usize>,

    /// Disable the periodic time estimates while the overlap matrix is computed.
    #[arg(long)]
    pub no_eta: bool,
}

/// How `select` groups the selected atoms.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitBy {
    Residue,
    Name,
    Molecule,
}

/// Arguments for the `select` subcommand.
#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Model structure (.pdb or Tinker .xyz).
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Selection expression.
    #[arg(short, long, value_name = "EXPR", default_value = "all")]
    pub selection: String,

    /// Print the selected atoms in groups.
    #[arg(long, value_enum, value_name = "MODE")]
    pub split_by: Option<SplitBy>,
}
