//! Output formatting for CLI commands.

use serde::Serialize;

use crate::cli::args::{OutputFormat, SentivoteArgs};
use crate::classifier::AlgorithmId;
use crate::corpus::Label;
use crate::ensemble::Evaluation;
use crate::error::Result;
use crate::pipeline::{ClassifiedText, TrendSnapshot, Verdict, WorkerStats};
use crate::trainer::{ModelSource, TrainingFailure};

/// Result structure for the train command.
#[derive(Debug, Serialize)]
pub struct TrainingSummary {
    pub documents: usize,
    pub training_documents: usize,
    pub test_documents: usize,
    pub vocabulary_size: usize,
    pub models: Vec<ModelSummary>,
    pub failures: Vec<TrainingFailure>,
    pub duration_ms: u64,
}

/// One model in a [`TrainingSummary`].
#[derive(Debug, Serialize)]
pub struct ModelSummary {
    pub algorithm: AlgorithmId,
    pub source: ModelSource,
    pub training_examples: usize,
    pub trained_at: String,
}

/// Result structure for the classify command.
#[derive(Debug, Serialize)]
pub struct ClassificationOutput {
    pub text: String,
    pub label: Label,
    pub confidence: f64,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes: Option<Vec<(String, Label)>>,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + HumanOutput>(
    message: &str,
    result: &T,
    args: &SentivoteArgs,
) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 1 {
                println!("{message}");
                println!();
            }
            result.print_human();
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output a single JSON document (one line unless `--pretty`).
pub fn output_json<T: Serialize>(result: &T, args: &SentivoteArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}

/// Human-readable rendering of a command result.
pub trait HumanOutput {
    fn print_human(&self);
}

impl HumanOutput for TrainingSummary {
    fn print_human(&self) {
        println!("Corpus:");
        println!("  Documents:  {}", self.documents);
        println!("  Training:   {}", self.training_documents);
        println!("  Test:       {}", self.test_documents);
        println!("  Vocabulary: {}", self.vocabulary_size);
        println!();
        println!("Models:");
        for model in &self.models {
            let source = match model.source {
                ModelSource::Cache => "cached",
                ModelSource::Trained => "trained",
            };
            println!(
                "  {:<20} {:<8} {} examples, {}",
                model.algorithm.name(),
                source,
                model.training_examples,
                model.trained_at
            );
        }
        for failure in &self.failures {
            println!("  {:<20} FAILED   {}", failure.algorithm.name(), failure.reason);
        }
        println!();
        println!("Done in {} ms", self.duration_ms);
    }
}

impl HumanOutput for Evaluation {
    fn print_human(&self) {
        println!("Held-out examples: {}", self.examples);
        println!();
        for member in &self.members {
            println!("  {:<20} {:>6.2}%", member.name, member.accuracy * 100.0);
        }
        println!("  {:<20} {:>6.2}%", "ensemble", self.ensemble_accuracy * 100.0);
        println!();
        println!("Ensemble confusion (gold \\ predicted):");
        println!("         pos    neg");
        for gold in Label::ALL {
            println!(
                "  {:<4} {:>5}  {:>5}",
                gold.as_str(),
                self.confusion.get(gold, Label::Pos),
                self.confusion.get(gold, Label::Neg)
            );
        }
        for label in Label::ALL {
            println!(
                "  {}: precision {:.3}, recall {:.3}",
                label,
                self.confusion.precision(label),
                self.confusion.recall(label)
            );
        }
    }
}

impl HumanOutput for Vec<ClassificationOutput> {
    fn print_human(&self) {
        for output in self {
            println!(
                "{:<8} {:>5.1}%  {}",
                output.verdict.to_string(),
                output.confidence * 100.0,
                output.text
            );
            if let Some(votes) = &output.votes {
                for (name, label) in votes {
                    println!("           {name}: {label}");
                }
            }
        }
    }
}

impl HumanOutput for ClassifiedText {
    fn print_human(&self) {
        println!(
            "{} {:>5.1}%  {}",
            self.label,
            self.confidence * 100.0,
            self.text
        );
    }
}

impl HumanOutput for TrendSnapshot {
    fn print_human(&self) {
        let words: Vec<String> = self
            .top_words
            .iter()
            .map(|(word, count)| format!("{word}({count})"))
            .collect();
        println!(
            "-- {}: {:.1}% positive | {}",
            if self.keyword.is_empty() { "*" } else { &self.keyword },
            self.positive_fraction * 100.0,
            words.join(" ")
        );
    }
}

impl HumanOutput for WorkerStats {
    fn print_human(&self) {
        println!(
            "Received {}, skipped {}, classified {} ({} unsure), forwarded {}, dropped {} (backlog) / {} (queue full), errors {}",
            self.received,
            self.skipped,
            self.classified,
            self.unsure,
            self.forwarded,
            self.dropped_backlog,
            self.dropped_full,
            self.errors
        );
    }
}
