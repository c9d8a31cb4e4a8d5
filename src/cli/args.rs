//! Command line argument parsing for the sentivote CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::classifier::AlgorithmId;

/// Sentivote - ensemble sentiment classification for text streams
#[derive(Parser, Debug, Clone)]
#[command(name = "sentivote")]
#[command(about = "Ensemble sentiment classification for keyword-filtered text streams")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct SentivoteArgs {
    /// Configuration file (JSON)
    #[arg(short, long, env = "SENTIVOTE_CONFIG", value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the corpus and model artifacts
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Minimum vote fraction for a confident classification
    #[arg(short, long, value_name = "FRACTION")]
    pub threshold: Option<f64>,

    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl SentivoteArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Load the corpus and train (or load) every configured model
    Train(TrainArgs),

    /// Report held-out accuracy of every model and of the ensemble
    Evaluate(EvaluateArgs),

    /// Classify texts given on the command line
    Classify(ClassifyArgs),

    /// Classify lines read from standard input as a stream
    Stream(StreamArgs),
}

/// Arguments shared by commands that build an ensemble.
#[derive(Parser, Debug, Clone, Default)]
pub struct EnsembleArgs {
    /// Algorithms to use, in voting order (default: from the config)
    #[arg(short, long, value_delimiter = ',', value_name = "ALGORITHMS")]
    pub algorithms: Vec<AlgorithmId>,

    /// Train independent algorithms concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Accept an ensemble missing algorithms that failed to train
    #[arg(long)]
    pub allow_partial: bool,
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub ensemble: EnsembleArgs,
}

/// Arguments for evaluation
#[derive(Parser, Debug, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub ensemble: EnsembleArgs,
}

/// Arguments for classifying texts
#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    /// Texts to classify
    #[arg(value_name = "TEXT", required = true)]
    pub texts: Vec<String>,

    /// Show every member's vote
    #[arg(long)]
    pub votes: bool,

    #[command(flatten)]
    pub ensemble: EnsembleArgs,
}

/// Arguments for stream classification
#[derive(Parser, Debug, Clone)]
pub struct StreamArgs {
    /// Only lines containing this keyword are classified (case-insensitive)
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Seconds between trend reports
    #[arg(long, default_value = "3")]
    pub report_interval: u64,

    /// Number of frequent words in each trend report
    #[arg(long, default_value = "10")]
    pub top_words: usize,

    /// Capacity of the outbound queue
    #[arg(long, default_value = "1000")]
    pub queue_capacity: usize,

    #[command(flatten)]
    pub ensemble: EnsembleArgs,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classify() {
        let args = SentivoteArgs::try_parse_from([
            "sentivote",
            "-vv",
            "--threshold",
            "0.8",
            "classify",
            "-a",
            "linear_svc,bernoulli_nb",
            "what a great day",
        ])
        .unwrap();

        assert_eq!(args.verbosity(), 2);
        assert_eq!(args.threshold, Some(0.8));
        match args.command {
            Command::Classify(classify) => {
                assert_eq!(classify.texts, vec!["what a great day"]);
                assert_eq!(
                    classify.ensemble.algorithms,
                    vec![AlgorithmId::LinearSvc, AlgorithmId::BernoulliNb]
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        let args = SentivoteArgs::try_parse_from(["sentivote", "-v", "-q", "train"]).unwrap();
        assert_eq!(args.verbosity(), 0);
        assert_eq!(args.output_format, OutputFormat::Human);
    }

    #[test]
    fn test_stream_defaults() {
        let args =
            SentivoteArgs::try_parse_from(["sentivote", "-f", "json", "stream", "-k", "rust"])
                .unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
        let Command::Stream(stream) = args.command else {
            panic!("expected stream");
        };
        assert_eq!(stream.keyword.as_deref(), Some("rust"));
        assert_eq!(stream.report_interval, 3);
        assert!(stream.ensemble.algorithms.is_empty());
    }
}
