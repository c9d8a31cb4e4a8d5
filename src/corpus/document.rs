//! Labeled documents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SentivoteError};

/// Sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Pos,
    Neg,
}

impl Label {
    /// Both labels, positive first.
    pub const ALL: [Label; 2] = [Label::Pos, Label::Neg];

    /// Short code (`pos` / `neg`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Pos => "pos",
            Label::Neg => "neg",
        }
    }

    /// Parse a sentiment code such as `pos`, `Positive` or `NEGATIVE`.
    ///
    /// Only the first three letters matter; anything that does not start with
    /// `pos` or `neg` (neutral, irrelevant, ...) is unrecognized.
    pub fn from_code(code: &str) -> Option<Label> {
        let code = code.trim();
        let prefix: String = code.chars().take(3).collect::<String>().to_ascii_lowercase();
        match prefix.as_str() {
            "pos" => Some(Label::Pos),
            "neg" => Some(Label::Neg),
            _ => None,
        }
    }

    /// +1 for positive, -1 for negative.
    pub fn sign(&self) -> f64 {
        match self {
            Label::Pos => 1.0,
            Label::Neg => -1.0,
        }
    }

    /// Label for a decision score; zero counts as positive.
    pub fn from_score(score: f64) -> Label {
        if score >= 0.0 { Label::Pos } else { Label::Neg }
    }

    /// Dense index used by per-class parameter tables.
    pub fn index(&self) -> usize {
        match self {
            Label::Pos => 0,
            Label::Neg => 1,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = SentivoteError;

    fn from_str(s: &str) -> Result<Self> {
        Label::from_code(s)
            .ok_or_else(|| SentivoteError::corpus(format!("unrecognized sentiment label: {s}")))
    }
}

/// Raw text with its gold label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub label: Label,
}

impl Document {
    pub fn new<S: Into<String>>(text: S, label: Label) -> Self {
        Document {
            text: text.into(),
            label,
        }
    }
}
