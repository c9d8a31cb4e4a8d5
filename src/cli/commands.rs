//! Command implementations for the sentivote CLI.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use crossbeam_channel::{bounded, unbounded};
use log::{debug, info};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::SentivoteConfig;
use crate::corpus::CorpusStore;
use crate::ensemble::VotingEnsemble;
use crate::error::SentivoteError;
use crate::features::FeatureExtractor;
use crate::pipeline::{
    SentimentPipeline, SentimentTrend, Throttle, TrendSnapshot, WorkerOptions, run_classifier,
};
use crate::trainer::ModelTrainer;

/// Execute a CLI command.
pub fn execute_command(args: SentivoteArgs) -> anyhow::Result<()> {
    match &args.command {
        Command::Train(train_args) => train(train_args, &args),
        Command::Evaluate(evaluate_args) => evaluate(evaluate_args, &args),
        Command::Classify(classify_args) => classify(classify_args, &args),
        Command::Stream(stream_args) => stream(stream_args, &args),
    }
}

/// Load the config file (or defaults) and apply command line overrides.
pub fn load_config(
    cli_args: &SentivoteArgs,
    ensemble: &EnsembleArgs,
) -> anyhow::Result<SentivoteConfig> {
    let mut config = match &cli_args.config {
        Some(path) => SentivoteConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SentivoteConfig::default(),
    };

    if let Some(cache_dir) = &cli_args.cache_dir {
        config.cache_dir = cache_dir.clone();
    }
    if let Some(threshold) = cli_args.threshold {
        config.confidence_threshold = threshold;
    }
    if !ensemble.algorithms.is_empty() {
        config.algorithms = ensemble.algorithms.clone();
    }
    if ensemble.parallel {
        config.parallel_training = true;
    }
    if ensemble.allow_partial {
        config.allow_partial_ensemble = true;
    }

    config.validate().context("Invalid configuration")?;
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Load the corpus and produce every configured model.
fn train(args: &TrainArgs, cli_args: &SentivoteArgs) -> anyhow::Result<()> {
    let config = load_config(cli_args, &args.ensemble)?;
    let start = Instant::now();

    let store = Arc::new(CorpusStore::from_config(&config));
    let corpus = store.load_corpus().context("Failed to load corpus")?;
    let trainer = ModelTrainer::from_config(store.clone(), &config);
    let report = trainer
        .get_trained_models(&config.algorithms)
        .context("Failed to train models")?;

    let summary = TrainingSummary {
        documents: corpus.len(),
        training_documents: corpus.training_documents().len(),
        test_documents: corpus.test_documents().len(),
        vocabulary_size: corpus.vocabulary().len(),
        models: report
            .models()
            .iter()
            .zip(report.sources())
            .map(|(model, source)| ModelSummary {
                algorithm: model.algorithm(),
                source: *source,
                training_examples: model.metadata().training_examples,
                trained_at: model.metadata().trained_at.to_rfc3339(),
            })
            .collect(),
        failures: report.failures().to_vec(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    output_result("Training complete", &summary, cli_args)?;

    if !report.is_complete() && !config.allow_partial_ensemble {
        bail!(
            "{} of {} algorithms failed to train",
            report.failures().len(),
            config.algorithms.len()
        );
    }
    Ok(())
}

/// Score every member and the ensemble on the held-out documents.
fn evaluate(args: &EvaluateArgs, cli_args: &SentivoteArgs) -> anyhow::Result<()> {
    let config = load_config(cli_args, &args.ensemble)?;

    let store = Arc::new(CorpusStore::from_config(&config));
    let trainer = ModelTrainer::from_config(store.clone(), &config);
    let mut ensemble = VotingEnsemble::untrained(config.algorithms.clone())
        .allow_partial(config.allow_partial_ensemble);
    ensemble.train(&trainer).context("Failed to build the ensemble")?;

    let corpus = store.load_corpus()?;
    if corpus.test_documents().is_empty() {
        bail!("the corpus has no held-out documents (corpus.test_size is 0)");
    }
    let extractor =
        FeatureExtractor::with_analyzer(corpus.vocabulary().clone(), store.analyzer().clone());
    let examples = extractor.extract_examples(corpus.test_documents())?;

    let evaluation = ensemble.evaluate(&examples)?;
    output_result("Evaluation complete", &evaluation, cli_args)?;
    Ok(())
}

/// Classify each text given on the command line.
fn classify(args: &ClassifyArgs, cli_args: &SentivoteArgs) -> anyhow::Result<()> {
    let config = load_config(cli_args, &args.ensemble)?;
    let pipeline = SentimentPipeline::open(&config).context("Failed to open pipeline")?;

    let mut outputs = Vec::with_capacity(args.texts.len());
    for text in &args.texts {
        let classification = pipeline.classify_text(text)?;
        let votes = if args.votes {
            let features = pipeline.extractor().extract(text)?;
            let names = pipeline.ensemble().member_names();
            let votes = pipeline.ensemble().votes(&features)?;
            Some(
                names
                    .into_iter()
                    .map(String::from)
                    .zip(votes)
                    .collect(),
            )
        } else {
            None
        };
        outputs.push(ClassificationOutput {
            text: text.clone(),
            label: classification.label,
            confidence: classification.confidence,
            verdict: classification.verdict,
            votes,
        });
    }

    output_result("Classification complete", &outputs, cli_args)?;
    Ok(())
}

/// Classify standard input line by line, reporting a rolling trend.
fn stream(args: &StreamArgs, cli_args: &SentivoteArgs) -> anyhow::Result<()> {
    let config = load_config(cli_args, &args.ensemble)?;
    let pipeline = SentimentPipeline::open(&config).context("Failed to open pipeline")?;
    let options = WorkerOptions::from(&config);
    let keyword = args.keyword.as_ref().map(|k| k.to_lowercase());

    let (in_tx, in_rx) = unbounded::<String>();
    let (out_tx, out_rx) = bounded(args.queue_capacity.max(1));

    let mut trend = SentimentTrend::new(keyword.clone().unwrap_or_default());
    let mut throttle = Throttle::new(Duration::from_secs(args.report_interval));
    let analyzer = pipeline.extractor().analyzer().clone();

    let stats = thread::scope(|scope| -> anyhow::Result<_> {
        scope.spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if let Some(keyword) = &keyword
                    && !line.to_lowercase().contains(keyword.as_str())
                {
                    continue;
                }
                if in_tx.send(line.to_string()).is_err() {
                    break;
                }
            }
            debug!("Input exhausted");
        });

        let worker = scope.spawn(|| run_classifier(&pipeline, in_rx, out_tx, options));

        for item in out_rx.iter() {
            match cli_args.output_format {
                OutputFormat::Human => item.print_human(),
                OutputFormat::Json => output_json(&item, cli_args)?,
            }
            trend.record(&item);
            if throttle.ready() {
                let snapshot = TrendSnapshot {
                    keyword: trend.keyword().to_string(),
                    positive_fraction: trend.update_average(),
                    top_words: trend.word_frequencies(&analyzer, args.top_words)?,
                };
                match cli_args.output_format {
                    OutputFormat::Human => snapshot.print_human(),
                    OutputFormat::Json => info!("Trend: {:?}", snapshot),
                }
            }
        }

        worker.join().map_err(|_| {
            anyhow::Error::from(SentivoteError::ThreadJoin(
                "classifier worker panicked".to_string(),
            ))
        })
    })?;

    if cli_args.verbosity() > 0 {
        output_result("Stream finished", &stats, cli_args)?;
    }
    Ok(())
}
