//! Rolling sentiment statistics for display.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ahash::{AHashMap, AHashSet};
use lazy_static::lazy_static;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::analysis::TextAnalyzer;
use crate::corpus::Label;
use crate::error::Result;
use crate::pipeline::driver::ClassifiedText;

/// Number of recent classified items the positive fraction is computed over.
pub const RECENT_WINDOW: usize = 200;

/// Number of positive fractions kept for plotting.
pub const AVERAGE_HISTORY: usize = 100;

lazy_static! {
    static ref STOP_WORDS: AHashSet<&'static str> = [
        "about", "above", "after", "again", "against", "all", "also", "and", "any", "are",
        "because", "been", "before", "being", "below", "between", "both", "but", "can",
        "cannot", "could", "did", "does", "doing", "down", "during", "each", "else", "ever",
        "few", "for", "from", "further", "get", "had", "has", "have", "having", "her", "here",
        "hers", "herself", "him", "himself", "his", "how", "however", "http", "https", "amp",
        "into", "its", "itself", "just", "like", "more", "most", "myself", "nor", "not", "now",
        "off", "once", "only", "other", "otherwise", "ought", "our", "ours", "ourselves", "out",
        "over", "own", "same", "shall", "she", "should", "since", "some", "such", "than",
        "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these",
        "they", "this", "those", "through", "too", "under", "until", "very", "was", "were",
        "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
        "would", "www", "you", "your", "yours", "yourself", "yourselves", "com",
    ]
    .into_iter()
    .collect();
}

/// Whether a word is too common (or too short) to be worth counting.
pub fn is_stop_word(word: &str) -> bool {
    word.chars().count() <= 2 || STOP_WORDS.contains(word)
}

/// Recent labels, a history of positive fractions and the recent texts.
///
/// Starts pre-seeded with an even mix of labels and a flat history at 0.5 so
/// the first real items do not swing the trend to an extreme.
#[derive(Debug, Clone)]
pub struct SentimentTrend {
    keyword: String,
    recent: VecDeque<(String, Label)>,
    averages: VecDeque<f64>,
}

impl SentimentTrend {
    pub fn new<S: Into<String>>(keyword: S) -> Self {
        Self::with_rng(keyword, &mut StdRng::from_os_rng())
    }

    /// Pre-seed with a reproducible label order.
    pub fn with_seed<S: Into<String>>(keyword: S, seed: u64) -> Self {
        Self::with_rng(keyword, &mut StdRng::seed_from_u64(seed))
    }

    fn with_rng<S: Into<String>>(keyword: S, rng: &mut StdRng) -> Self {
        let mut seed: Vec<(String, Label)> = (0..RECENT_WINDOW)
            .map(|i| {
                let label = if i < RECENT_WINDOW / 2 { Label::Pos } else { Label::Neg };
                (String::new(), label)
            })
            .collect();
        seed.shuffle(rng);

        SentimentTrend {
            keyword: keyword.into().to_lowercase(),
            recent: seed.into(),
            averages: std::iter::repeat_n(0.5, AVERAGE_HISTORY).collect(),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Add a classified item, evicting the oldest one.
    pub fn record(&mut self, item: &ClassifiedText) {
        if self.recent.len() == RECENT_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back((item.text.clone(), item.label));
    }

    /// Positive fraction over the recent window.
    pub fn positive_fraction(&self) -> f64 {
        if self.recent.is_empty() {
            return 0.5;
        }
        let positive = self.recent.iter().filter(|(_, l)| *l == Label::Pos).count();
        positive as f64 / self.recent.len() as f64
    }

    /// Append the current positive fraction to the history and return it.
    pub fn update_average(&mut self) -> f64 {
        let average = self.positive_fraction();
        if self.averages.len() == AVERAGE_HISTORY {
            self.averages.pop_front();
        }
        self.averages.push_back(average);
        average
    }

    /// Oldest to newest.
    pub fn averages(&self) -> impl Iterator<Item = f64> + '_ {
        self.averages.iter().copied()
    }

    /// The `limit` most frequent words in the recent texts, excluding stop
    /// words and the keyword. Ties are ordered alphabetically.
    pub fn word_frequencies(
        &self,
        analyzer: &TextAnalyzer,
        limit: usize,
    ) -> Result<Vec<(String, usize)>> {
        let mut counts: AHashMap<String, usize> = AHashMap::new();
        for (text, _) in &self.recent {
            if text.is_empty() {
                continue;
            }
            for term in analyzer.terms(text)? {
                if term != self.keyword && !is_stop_word(&term) {
                    *counts.entry(term).or_insert(0) += 1;
                }
            }
        }

        let mut frequencies: Vec<(String, usize)> = counts.into_iter().collect();
        frequencies.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        frequencies.truncate(limit);
        Ok(frequencies)
    }
}

/// Snapshot of a trend for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct TrendSnapshot {
    pub keyword: String,
    pub positive_fraction: f64,
    pub top_words: Vec<(String, usize)>,
}

/// Lets an action run at most once per interval.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_fired: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Throttle {
            interval,
            last_fired: None,
        }
    }

    /// Whether the action may run now. Records the firing time if so.
    pub fn ready(&mut self) -> bool {
        self.ready_at(Instant::now())
    }

    pub fn ready_at(&mut self, now: Instant) -> bool {
        let due = match self.last_fired {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.interval,
        };
        if due {
            self.last_fired = Some(now);
        }
        due
    }
}
