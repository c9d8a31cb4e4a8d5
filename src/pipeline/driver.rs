//! Text in, thresholded sentiment out.

use std::fmt;
use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::config::SentivoteConfig;
use crate::corpus::{CorpusStore, Label};
use crate::ensemble::VotingEnsemble;
use crate::error::{Result, SentivoteError};
use crate::features::FeatureExtractor;
use crate::trainer::ModelTrainer;

/// Reported sentiment after applying the confidence threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Positive,
    Negative,
    Unsure,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Verdict::Positive => "positive",
            Verdict::Negative => "negative",
            Verdict::Unsure => "unsure",
        };
        f.write_str(name)
    }
}

/// Ensemble decision for one text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    /// Majority label, reported even when unsure.
    pub label: Label,
    pub confidence: f64,
    pub verdict: Verdict,
}

/// A text that cleared the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedText {
    pub text: String,
    pub label: Label,
    pub confidence: f64,
}

/// Validate a confidence threshold.
pub fn check_threshold(threshold: f64) -> Result<f64> {
    if threshold.is_finite() && (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(SentivoteError::configuration(format!(
            "confidence threshold must be within [0, 1], got {threshold}"
        )))
    }
}

/// Feature extraction, voting and thresholding.
#[derive(Debug)]
pub struct SentimentPipeline {
    extractor: FeatureExtractor,
    ensemble: VotingEnsemble,
    threshold: f64,
}

impl SentimentPipeline {
    pub fn new(
        extractor: FeatureExtractor,
        ensemble: VotingEnsemble,
        threshold: f64,
    ) -> Result<Self> {
        Ok(SentimentPipeline {
            extractor,
            ensemble,
            threshold: check_threshold(threshold)?,
        })
    }

    /// Load the corpus, obtain trained models and assemble a ready pipeline.
    pub fn open(config: &SentivoteConfig) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(CorpusStore::from_config(config));
        let trainer = ModelTrainer::from_config(store.clone(), config);

        let mut ensemble = VotingEnsemble::untrained(config.algorithms.clone())
            .allow_partial(config.allow_partial_ensemble);
        ensemble.train(&trainer)?;

        let corpus = store.load_corpus()?;
        let extractor =
            FeatureExtractor::with_analyzer(corpus.vocabulary().clone(), store.analyzer().clone());
        info!(
            "Pipeline ready: {} members, {} vocabulary words, threshold {}",
            ensemble.algorithms().len(),
            corpus.vocabulary().len(),
            config.confidence_threshold
        );
        Self::new(extractor, ensemble, config.confidence_threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn ensemble(&self) -> &VotingEnsemble {
        &self.ensemble
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Classify one text. Confidence below the threshold yields
    /// [`Verdict::Unsure`].
    pub fn classify_text(&self, text: &str) -> Result<Classification> {
        let features = self.extractor.extract(text)?;
        let vote = self.ensemble.vote(&features)?;
        let verdict = if vote.confidence < self.threshold {
            Verdict::Unsure
        } else if vote.label == Label::Pos {
            Verdict::Positive
        } else {
            Verdict::Negative
        };
        Ok(Classification {
            label: vote.label,
            confidence: vote.confidence,
            verdict,
        })
    }

    /// Classify a text and keep it only when the verdict is not unsure.
    pub fn classify_confident(&self, text: String) -> Result<Option<ClassifiedText>> {
        let classification = self.classify_text(&text)?;
        if classification.verdict == Verdict::Unsure {
            return Ok(None);
        }
        Ok(Some(ClassifiedText {
            text,
            label: classification.label,
            confidence: classification.confidence,
        }))
    }

    /// Classify a batch, forwarding only confident results in input order.
    pub fn process<I, S>(&self, texts: I) -> Result<Vec<ClassifiedText>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut forwarded = Vec::new();
        for text in texts {
            if let Some(classified) = self.classify_confident(text.into())? {
                forwarded.push(classified);
            }
        }
        Ok(forwarded)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::fixed_pipeline;
    use super::*;
    use crate::corpus::Label::{Neg, Pos};

    #[test]
    fn test_below_threshold_is_unsure() {
        // 3 of 5 members: confidence 0.6.
        let pipeline = fixed_pipeline(&[Pos, Pos, Neg, Pos, Neg], 0.7);
        let classification = pipeline.classify_text("great").unwrap();
        assert_eq!(classification.label, Pos);
        assert!((classification.confidence - 0.6).abs() < 1e-9);
        assert_eq!(classification.verdict, Verdict::Unsure);
        assert!(pipeline.process(["great"]).unwrap().is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let pipeline = fixed_pipeline(&[Neg, Neg, Neg, Pos], 0.75);
        let classification = pipeline.classify_text("awful").unwrap();
        assert_eq!(classification.verdict, Verdict::Negative);
    }

    #[test]
    fn test_process_forwards_confident_items() {
        let pipeline = fixed_pipeline(&[Pos, Pos, Pos], 0.7);
        let forwarded = pipeline.process(["one", "two"]).unwrap();
        assert_eq!(
            forwarded,
            vec![
                ClassifiedText {
                    text: "one".to_string(),
                    label: Pos,
                    confidence: 1.0
                },
                ClassifiedText {
                    text: "two".to_string(),
                    label: Pos,
                    confidence: 1.0
                },
            ]
        );
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(check_threshold(1.2).is_err());
        assert!(check_threshold(f64::NAN).is_err());
        assert_eq!(check_threshold(0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_untrained_pipeline_is_not_ready() {
        let ensemble = VotingEnsemble::untrained(vec![crate::classifier::AlgorithmId::BernoulliNb]);
        let extractor = FeatureExtractor::new(Arc::new(crate::features::Vocabulary::empty()));
        let pipeline = SentimentPipeline::new(extractor, ensemble, 0.7).unwrap();
        assert!(matches!(
            pipeline.classify_text("hello"),
            Err(SentivoteError::NotReady(_))
        ));
    }
}
