//! Parsing sources into a [`Corpus`]: reading, vocabulary derivation and the
//! train/test split.

use std::sync::Arc;

use ahash::AHashSet;
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::analysis::{PosTag, PosTagger, TextAnalyzer};
use crate::config::CorpusConfig;
use crate::corpus::document::{Document, Label};
use crate::corpus::reader::{read_line_file, read_record_file};
use crate::error::{Result, SentivoteError};
use crate::features::Vocabulary;

/// Vocabulary words must be longer than this many characters.
pub const MIN_WORD_CHARS: usize = 2;

/// Shuffled labeled documents, their vocabulary and the held-out split.
///
/// The last `test_size` documents form the test partition; everything before
/// them is the training partition.
#[derive(Debug, Clone)]
pub struct Corpus {
    documents: Vec<Document>,
    vocabulary: Arc<Vocabulary>,
    test_size: usize,
}

/// Serialized form of a [`Corpus`].
#[derive(Serialize, Deserialize)]
pub(crate) struct CorpusPayload {
    documents: Vec<Document>,
    vocabulary: Vocabulary,
    test_size: usize,
}

impl Corpus {
    /// Assemble a corpus from already shuffled documents.
    pub fn new(documents: Vec<Document>, vocabulary: Vocabulary, test_size: usize) -> Self {
        let test_size = test_size.min(documents.len());
        Corpus {
            documents,
            vocabulary: Arc::new(vocabulary),
            test_size,
        }
    }

    /// All documents, training partition first.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn training_documents(&self) -> &[Document] {
        &self.documents[..self.documents.len() - self.test_size]
    }

    pub fn test_documents(&self) -> &[Document] {
        &self.documents[self.documents.len() - self.test_size..]
    }

    /// Number of documents per label, positive first.
    pub fn label_counts(&self) -> [(Label, usize); 2] {
        Label::ALL.map(|label| {
            let count = self.documents.iter().filter(|d| d.label == label).count();
            (label, count)
        })
    }

    pub(crate) fn to_payload(&self) -> CorpusPayload {
        CorpusPayload {
            documents: self.documents.clone(),
            vocabulary: (*self.vocabulary).clone(),
            test_size: self.test_size,
        }
    }
}

impl From<CorpusPayload> for Corpus {
    fn from(payload: CorpusPayload) -> Self {
        Corpus::new(payload.documents, payload.vocabulary, payload.test_size)
    }
}

/// Reads every configured source and derives the corpus.
pub struct CorpusBuilder<'a> {
    config: &'a CorpusConfig,
    analyzer: &'a TextAnalyzer,
    tagger: &'a dyn PosTagger,
}

impl<'a> CorpusBuilder<'a> {
    pub fn new(
        config: &'a CorpusConfig,
        analyzer: &'a TextAnalyzer,
        tagger: &'a dyn PosTagger,
    ) -> Self {
        CorpusBuilder {
            config,
            analyzer,
            tagger,
        }
    }

    /// Parse all sources, build the vocabulary, shuffle and split.
    pub fn build(&self) -> Result<Corpus> {
        if !self.config.has_sources() {
            return Err(SentivoteError::configuration(
                "no corpus sources configured and no corpus artifact available",
            ));
        }

        let mut documents = self.read_documents()?;
        if documents.is_empty() {
            return Err(SentivoteError::corpus_unavailable(
                "corpus sources contain no labeled documents",
            ));
        }

        let vocabulary = build_vocabulary(
            &documents,
            self.analyzer,
            self.tagger,
            self.config.pos_filter.as_deref(),
        )?;

        let mut rng = match self.config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        documents.shuffle(&mut rng);

        let corpus = Corpus::new(documents, vocabulary, self.config.test_size);
        info!(
            "Built corpus: {} documents ({} training, {} test), {} vocabulary words",
            corpus.len(),
            corpus.training_documents().len(),
            corpus.test_documents().len(),
            corpus.vocabulary().len()
        );
        Ok(corpus)
    }

    fn read_documents(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        if let Some(path) = &self.config.positive_path {
            documents.extend(read_line_file(path, Label::Pos)?);
        }
        if let Some(path) = &self.config.negative_path {
            documents.extend(read_line_file(path, Label::Neg)?);
        }
        if let Some(records) = &self.config.records {
            documents.extend(read_record_file(records)?);
        }
        Ok(documents)
    }
}

/// Derive the vocabulary: every distinct lowercase term longer than
/// [`MIN_WORD_CHARS`], optionally restricted to the allowed parts of speech.
pub fn build_vocabulary(
    documents: &[Document],
    analyzer: &TextAnalyzer,
    tagger: &dyn PosTagger,
    allowed: Option<&[PosTag]>,
) -> Result<Vocabulary> {
    let mut words: AHashSet<String> = AHashSet::new();
    for document in documents {
        for term in analyzer.terms(&document.text)? {
            if term.chars().count() > MIN_WORD_CHARS {
                words.insert(term);
            }
        }
    }
    let candidates = words.len();

    let words: Vec<String> = match allowed {
        Some(allowed) => {
            let allowed: AHashSet<PosTag> = allowed.iter().copied().collect();
            words
                .into_iter()
                .filter(|word| allowed.contains(&tagger.tag(word)))
                .collect()
        }
        None => words.into_iter().collect(),
    };

    debug!(
        "Vocabulary: kept {} of {} candidate words (tagger: {})",
        words.len(),
        candidates,
        tagger.name()
    );
    Ok(Vocabulary::new(words))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::LexiconPosTagger;
    use std::fs;
    use tempfile::TempDir;

    fn documents() -> Vec<Document> {
        vec![
            Document::new("A wonderfully moving film", Label::Pos),
            Document::new("The plot is boring and the acting awful", Label::Neg),
        ]
    }

    #[test]
    fn test_vocabulary_without_filter() {
        let vocab =
            build_vocabulary(&documents(), &TextAnalyzer::new(), &LexiconPosTagger, None).unwrap();
        assert_eq!(
            vocab.words(),
            &["acting", "and", "awful", "boring", "film", "moving", "plot", "the", "wonderfully"]
        );
    }

    #[test]
    fn test_vocabulary_with_pos_filter() {
        let allowed = PosTag::default_allow_list();
        let vocab = build_vocabulary(
            &documents(),
            &TextAnalyzer::new(),
            &LexiconPosTagger,
            Some(&allowed),
        )
        .unwrap();
        assert!(vocab.contains("wonderfully"));
        assert!(vocab.contains("boring"));
        assert!(vocab.contains("moving"));
        assert!(!vocab.contains("the"));
        assert!(!vocab.contains("film"));
        assert!(!vocab.contains("and"));
    }

    #[test]
    fn test_filter_can_empty_the_vocabulary() {
        let documents = vec![Document::new("the film and the plot", Label::Pos)];
        let vocab = build_vocabulary(
            &documents,
            &TextAnalyzer::new(),
            &LexiconPosTagger,
            Some(&[PosTag::UH]),
        )
        .unwrap();
        assert!(vocab.is_empty());
    }

    #[test]
    fn test_build_splits_with_seed() {
        let dir = TempDir::new().unwrap();
        let pos = dir.path().join("pos.txt");
        let neg = dir.path().join("neg.txt");
        fs::write(&pos, "good one\ngreat fun\nlovely day\n").unwrap();
        fs::write(&neg, "bad one\nawful mess\n").unwrap();

        let mut config = CorpusConfig::empty();
        config.positive_path = Some(pos);
        config.negative_path = Some(neg);
        config.test_size = 2;
        config.shuffle_seed = Some(7);

        let analyzer = TextAnalyzer::new();
        let corpus = CorpusBuilder::new(&config, &analyzer, &LexiconPosTagger)
            .build()
            .unwrap();
        assert_eq!(corpus.len(), 5);
        assert_eq!(corpus.training_documents().len(), 3);
        assert_eq!(corpus.test_documents().len(), 2);
        assert_eq!(corpus.label_counts(), [(Label::Pos, 3), (Label::Neg, 2)]);

        let again = CorpusBuilder::new(&config, &analyzer, &LexiconPosTagger)
            .build()
            .unwrap();
        assert_eq!(again.documents(), corpus.documents());
    }

    #[test]
    fn test_test_size_is_clamped() {
        let corpus = Corpus::new(documents(), Vocabulary::empty(), 100);
        assert_eq!(corpus.test_documents().len(), 2);
        assert!(corpus.training_documents().is_empty());
    }

    #[test]
    fn test_build_without_sources() {
        let config = CorpusConfig::empty();
        let analyzer = TextAnalyzer::new();
        let result = CorpusBuilder::new(&config, &analyzer, &LexiconPosTagger).build();
        assert!(matches!(result, Err(SentivoteError::Configuration(_))));
    }
}
