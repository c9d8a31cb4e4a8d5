use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, unbounded};
use sentivote::classifier::{AlgorithmId, SentimentModel};
use sentivote::config::{CorpusConfig, SentivoteConfig};
use sentivote::corpus::Label;
use sentivote::ensemble::{Member, VotingEnsemble};
use sentivote::error::{Result, SentivoteError};
use sentivote::features::{FeatureExtractor, Vocabulary};
use sentivote::pipeline::{SentimentPipeline, Verdict, WorkerOptions, run_classifier};
use tempfile::TempDir;

// Vocabulary words are sorted: ["awful", "great"].
const GREAT: usize = 1;

/// Votes positive when "great" is present, otherwise `fallback`.
struct KeywordModel {
    fallback: Label,
}

impl SentimentModel for KeywordModel {
    fn classify_active(&self, active: &[usize]) -> Label {
        if active.contains(&GREAT) {
            Label::Pos
        } else {
            self.fallback
        }
    }
}

struct Constant(Label);

impl SentimentModel for Constant {
    fn classify_active(&self, _active: &[usize]) -> Label {
        self.0
    }
}

fn pipeline(members: Vec<Member>, threshold: f64) -> Result<SentimentPipeline> {
    let vocabulary = Arc::new(Vocabulary::new(["great", "awful"]));
    let ensemble = VotingEnsemble::from_members(members)?;
    SentimentPipeline::new(FeatureExtractor::new(vocabulary), ensemble, threshold)
}

fn constant_members(labels: &[Label]) -> Vec<Member> {
    labels
        .iter()
        .enumerate()
        .map(|(i, &label)| Member::new(format!("m{i}"), Arc::new(Constant(label))))
        .collect()
}

#[test]
fn test_majority_below_threshold_is_unsure() -> Result<()> {
    use Label::{Neg, Pos};
    let pipeline = pipeline(constant_members(&[Pos, Pos, Pos, Pos, Neg, Neg, Neg]), 0.8)?;

    let classification = pipeline.classify_text("anything")?;
    assert_eq!(classification.label, Pos);
    assert!((classification.confidence - 4.0 / 7.0).abs() < 1e-12);
    assert_eq!(classification.verdict, Verdict::Unsure);
    assert!(pipeline.classify_confident("anything".to_string())?.is_none());
    Ok(())
}

#[test]
fn test_confidence_equal_to_threshold_is_forwarded() -> Result<()> {
    use Label::{Neg, Pos};
    let pipeline = pipeline(constant_members(&[Neg, Neg, Neg, Pos]), 0.75)?;

    let forwarded = pipeline.process(["first", "second"])?;
    assert_eq!(forwarded.len(), 2);
    assert!(forwarded.iter().all(|c| c.label == Neg && c.confidence == 0.75));
    assert_eq!(forwarded[0].text, "first");
    Ok(())
}

#[test]
fn test_tie_resolves_to_first_voted_label() -> Result<()> {
    use Label::{Neg, Pos};
    let pipeline = pipeline(constant_members(&[Neg, Pos, Pos, Neg]), 0.5)?;

    let classification = pipeline.classify_text("split decision")?;
    assert_eq!(classification.label, Neg);
    assert_eq!(classification.confidence, 0.5);
    assert_eq!(classification.verdict, Verdict::Negative);
    Ok(())
}

#[test]
fn test_members_see_extracted_features() -> Result<()> {
    let members = vec![
        Member::new("a", Arc::new(KeywordModel { fallback: Label::Neg })),
        Member::new("b", Arc::new(KeywordModel { fallback: Label::Neg })),
        Member::new("c", Arc::new(Constant(Label::Neg))),
    ];
    let pipeline = pipeline(members, 0.6)?;

    let positive = pipeline.classify_text("What a GREAT day")?;
    assert_eq!(positive.label, Label::Pos);
    assert_eq!(positive.verdict, Verdict::Positive);

    let negative = pipeline.classify_text("nothing to see")?;
    assert_eq!(negative.label, Label::Neg);
    assert_eq!(negative.confidence, 1.0);
    Ok(())
}

#[test]
fn test_invalid_threshold_is_rejected() {
    let result = pipeline(constant_members(&[Label::Pos]), 1.5);
    assert!(matches!(result, Err(SentivoteError::Configuration(_))));
}

#[test]
fn test_worker_forwards_confident_items_in_order() -> Result<()> {
    use Label::{Neg, Pos};
    let pipeline = pipeline(constant_members(&[Pos, Pos, Neg]), 0.6)?;

    let (in_tx, in_rx) = unbounded();
    let (out_tx, out_rx) = bounded(16);
    for text in ["one", "RT @someone: two", "three"] {
        in_tx.send(text.to_string()).unwrap();
    }
    drop(in_tx);

    let stats = thread::scope(|scope| {
        scope
            .spawn(|| run_classifier(&pipeline, in_rx, out_tx, WorkerOptions::default()))
            .join()
            .unwrap()
    });

    let texts: Vec<String> = out_rx.iter().map(|c| c.text).collect();
    assert_eq!(texts, vec!["one", "three"]);
    assert_eq!(stats.received, 3);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.forwarded, 2);
    Ok(())
}

fn write_corpus(dir: &Path) -> CorpusConfig {
    let pos = dir.join("positive.txt");
    let neg = dir.join("negative.txt");
    fs::write(
        &pos,
        "lovely sunny morning\nwonderful friendly people\nlovely wonderful evening\n\
         happy lovely weekend\nwonderful happy news\nsunny happy afternoon\n",
    )
    .unwrap();
    fs::write(
        &neg,
        "horrible rainy morning\nterrible rude people\nhorrible terrible evening\n\
         miserable horrible weekend\nterrible miserable news\nrainy miserable afternoon\n",
    )
    .unwrap();

    let mut config = CorpusConfig::empty();
    config.positive_path = Some(pos);
    config.negative_path = Some(neg);
    config.test_size = 0;
    config.shuffle_seed = Some(11);
    config.pos_filter = None;
    config
}

#[test]
fn test_open_trains_and_classifies() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let config = SentivoteConfig {
        corpus: write_corpus(dir.path()),
        cache_dir: dir.path().join("cache"),
        algorithms: vec![
            AlgorithmId::MultinomialNb,
            AlgorithmId::BernoulliNb,
            AlgorithmId::LogisticRegression,
        ],
        confidence_threshold: 0.6,
        ..Default::default()
    };

    let pipeline = SentimentPipeline::open(&config)?;
    assert!(pipeline.ensemble().is_ready());
    assert_eq!(
        pipeline.ensemble().member_names(),
        vec!["multinomial_nb", "bernoulli_nb", "logistic_regression"]
    );

    let positive = pipeline.classify_text("a lovely wonderful day")?;
    assert_eq!(positive.label, Label::Pos);
    let negative = pipeline.classify_text("a horrible terrible day")?;
    assert_eq!(negative.label, Label::Neg);

    // The second open is served from the artifacts.
    let reopened = SentimentPipeline::open(&config)?;
    assert_eq!(
        reopened.classify_text("a lovely wonderful day")?.label,
        Label::Pos
    );
    Ok(())
}
