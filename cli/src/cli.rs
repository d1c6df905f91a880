//! Command-line argument definitions (spec.md §6), mirroring the flags,
//! defaults and help text of `param_setting` in
//! `examples/original_source/param_parser.h`/`main.cpp`, with the
//! hand-rolled parser replaced by `clap` derive.
//!
//! `-h` is free for clap's own `--help` here, so `max_height` loses the
//! short alias the original gave it; every other short flag matches the
//! original one-for-one.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Which kind of test sequence to generate from the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Sequential sliding window over the (unshuffled) file.
    #[value(name = "S", alias = "SLIDING")]
    Sliding,
    /// Random unordered sampling of the file's rows.
    #[value(name = "R", alias = "RANDOM")]
    Random,
}

/// Runs the dynamic decision tree classifier against a labelled dataset.
///
/// The input file must have a header line of `l|n|b|c` tokens (one per
/// column, exactly one `l`) and may have one throwaway line before it if
/// `--skip` is given.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the input data file.
    pub file_name: PathBuf,

    /// Value of the label that is considered "true".
    #[arg(short = 'v', long = "true_value", default_value = "1")]
    pub label_true_value: String,

    /// Character that separates fields in the file.
    #[arg(short = 'd', long, default_value_t = ';')]
    pub delimiter: char,

    /// Indicates that the file has a header line before the schema line.
    #[arg(short = 's', long = "skip")]
    pub skip_first_line: bool,

    /// Epsilon of the algorithm, determining when to rebuild a vertex. If
    /// absent, computed as `min(min_split_gini/6, 1/(min_split_points+2))`.
    #[arg(short = 'e', long)]
    pub epsilon: Option<f32>,

    /// Size of the window in sliding mode, or of the initial dataset in
    /// random mode.
    #[arg(short = 'b', long, default_value_t = 3000)]
    pub dataset_size: usize,

    /// Probability of a point after the window to be an evaluation point.
    #[arg(short = 'a', long = "proba", default_value_t = 0.01)]
    pub eval_proba: f64,

    /// Seed for the random operations. If absent, chosen at random.
    #[arg(short = 'r', long)]
    pub seed: Option<u64>,

    /// Max number of vertices between root and leaf (included).
    #[arg(long, default_value_t = 5)]
    pub max_height: u32,

    /// Type of test to run.
    #[arg(short = 't', long = "type", value_enum, default_value = "S")]
    pub test_type: Mode,

    /// Number of updates (add and delete) to include in random mode.
    #[arg(short = 'u', long, default_value_t = 1000)]
    pub nb_updates: usize,

    /// Probability of each event in random mode being an insertion.
    #[arg(short = 'i', long, default_value_t = 0.5)]
    pub insert_proba: f64,

    /// Format the output as CSV instead of human-readable text.
    #[arg(short = 'c', long = "csv")]
    pub is_output_csv: bool,

    /// Minimal number of points in a vertex to make it have children.
    #[arg(short = 'm', long, default_value_t = 0)]
    pub min_split_points: u64,

    /// Minimal gini value of a vertex's point set to make it have children.
    #[arg(short = 'g', long, default_value_t = 0.0)]
    pub min_split_gini: f64,

    /// Epsilon to use when choosing which ancestor to recompute. If
    /// absent, equal to `epsilon`.
    #[arg(short = 'w', long)]
    pub epsilon_transmission: Option<f32>,

    /// For sweeping over several runs, the max epsilon to test. If absent,
    /// equal to `epsilon` (a single run).
    #[arg(short = 'f', long)]
    pub epsilon_max: Option<f32>,

    /// Step between swept epsilon values.
    #[arg(short = 'j', long, default_value_t = 0.1)]
    pub epsilon_step: f32,
}
