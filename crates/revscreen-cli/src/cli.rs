use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan",
    version,
    about = "revscreen - reverse screening of query molecules against a database of protein pharmacophore models.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank every pharmacophore model in a database against one or more query molecules.
    Screen(ScreenArgs),
    /// Summarize a screening results table and write a text report.
    Analyze(AnalyzeArgs),
}

/// Arguments for the `screen` subcommand.
#[derive(Args, Debug)]
pub struct ScreenArgs {
    // --- Queries ---
    /// Single query: a SMILES string or the path to a structure file (.sdf, .mol2, .pdb).
    #[arg(short = 'm', long, value_name = "SMILES_OR_PATH", conflicts_with = "query_csv")]
    pub query_molecule: Option<String>,

    /// Batch query: CSV file with columns 'Name,SMILES' or 'Name,File'.
    #[arg(long, value_name = "PATH")]
    pub query_csv: Option<PathBuf>,

    // --- Locations ---
    /// Directory containing the .pm pharmacophore model database.
    #[arg(short = 'd', long, value_name = "DIR")]
    pub model_database_dir: Option<PathBuf>,

    /// Output CSV file for the ranked results.
    #[arg(short, long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Run parameters ---
    /// Number of worker threads used to score models in parallel.
    #[arg(long, value_name = "NUM")]
    pub cpus: Option<usize>,

    /// Number of conformers to generate for SMILES queries.
    #[arg(long, value_name = "INT")]
    pub num_conformers: Option<usize>,

    /// Keep only the top N results per query (default: all).
    #[arg(long, value_name = "INT")]
    pub top_n: Option<usize>,

    /// Minimum score threshold for retained results.
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub min_score: Option<f64>,

    /// Abandon a single (query, model) scoring task after this many seconds.
    ///
    /// An abandoned task keeps its thread busy until the scorer returns; later
    /// queries run with correspondingly fewer workers.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Seed for conformer generation.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub weights: WeightArgs,
}

/// Pharmacophore feature weights.
#[derive(Args, Debug, Default, Clone, Copy)]
pub struct WeightArgs {
    /// Weight for hydrophobic features.
    #[arg(long, value_name = "FLOAT")]
    pub hydrophobic: Option<f64>,
    /// Weight for aromatic ring features.
    #[arg(long, value_name = "FLOAT")]
    pub aromatic: Option<f64>,
    /// Weight for H-bond acceptor features.
    #[arg(long, value_name = "FLOAT")]
    pub hba: Option<f64>,
    /// Weight for H-bond donor features.
    #[arg(long, value_name = "FLOAT")]
    pub hbd: Option<f64>,
    /// Weight for halogen bond features.
    #[arg(long, value_name = "FLOAT")]
    pub halogen: Option<f64>,
    /// Weight for anionic features.
    #[arg(long, value_name = "FLOAT")]
    pub anion: Option<f64>,
    /// Weight for cationic features.
    #[arg(long, value_name = "FLOAT")]
    pub cation: Option<f64>,
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Path to the screening results CSV file.
    #[arg(value_name = "RESULTS_CSV")]
    pub results_csv: PathBuf,

    /// Directory for the analysis report.
    #[arg(long, value_name = "DIR", default_value = revscreen::workflows::analyze::DEFAULT_ANALYSIS_DIR)]
    pub output_dir: PathBuf,

    /// Score threshold for strong hits.
    #[arg(long, value_name = "FLOAT", default_value_t = revscreen::workflows::analyze::DEFAULT_SCORE_THRESHOLD)]
    pub score_threshold: f64,
}
