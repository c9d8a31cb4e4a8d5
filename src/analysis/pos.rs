//! Part-of-speech tagging for vocabulary filtering.
//!
//! Vocabulary words are filtered by grammatical category: adjectives, adverbs,
//! verbs, modals, interjections and foreign words carry most of the sentiment
//! signal, so keeping only those shrinks the feature space considerably.
//!
//! Words are tagged out of context. [`LexiconPosTagger`] first consults
//! closed-class lexicons (modals, determiners, pronouns, ...) and a small list
//! of frequent open-class words, then falls back to suffix rules, then to a
//! noun.

use std::fmt;
use std::str::FromStr;

use ahash::AHashMap;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SentivoteError};

/// Penn Treebank tags understood by the tagger.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PosTag {
    /// Coordinating conjunction.
    CC,
    /// Cardinal number.
    CD,
    /// Determiner.
    DT,
    /// Foreign word.
    FW,
    /// Preposition or subordinating conjunction.
    IN,
    /// Adjective.
    JJ,
    /// Adjective, comparative.
    JJR,
    /// Adjective, superlative.
    JJS,
    /// Modal.
    MD,
    /// Noun.
    NN,
    /// Personal pronoun.
    PRP,
    /// Adverb.
    RB,
    /// Adverb, comparative.
    RBR,
    /// Adverb, superlative.
    RBS,
    /// Interjection.
    UH,
    /// Verb, base form.
    VB,
    /// Verb, past tense.
    VBD,
    /// Verb, gerund or present participle.
    VBG,
    /// Verb, past participle.
    VBN,
    /// Verb, non-3rd person singular present.
    VBP,
    /// Verb, 3rd person singular present.
    VBZ,
    /// Wh-word.
    WH,
}

impl PosTag {
    /// All tags in declaration order.
    pub const ALL: [PosTag; 22] = [
        PosTag::CC,
        PosTag::CD,
        PosTag::DT,
        PosTag::FW,
        PosTag::IN,
        PosTag::JJ,
        PosTag::JJR,
        PosTag::JJS,
        PosTag::MD,
        PosTag::NN,
        PosTag::PRP,
        PosTag::RB,
        PosTag::RBR,
        PosTag::RBS,
        PosTag::UH,
        PosTag::VB,
        PosTag::VBD,
        PosTag::VBG,
        PosTag::VBN,
        PosTag::VBP,
        PosTag::VBZ,
        PosTag::WH,
    ];

    /// The default allow-list used when building a vocabulary.
    pub fn default_allow_list() -> Vec<PosTag> {
        vec![
            PosTag::FW,
            PosTag::JJ,
            PosTag::JJR,
            PosTag::JJS,
            PosTag::MD,
            PosTag::RB,
            PosTag::RBR,
            PosTag::RBS,
            PosTag::UH,
            PosTag::VB,
            PosTag::VBD,
            PosTag::VBG,
            PosTag::VBN,
            PosTag::VBP,
            PosTag::VBZ,
        ]
    }

    /// Treebank spelling of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            PosTag::CC => "CC",
            PosTag::CD => "CD",
            PosTag::DT => "DT",
            PosTag::FW => "FW",
            PosTag::IN => "IN",
            PosTag::JJ => "JJ",
            PosTag::JJR => "JJR",
            PosTag::JJS => "JJS",
            PosTag::MD => "MD",
            PosTag::NN => "NN",
            PosTag::PRP => "PRP",
            PosTag::RB => "RB",
            PosTag::RBR => "RBR",
            PosTag::RBS => "RBS",
            PosTag::UH => "UH",
            PosTag::VB => "VB",
            PosTag::VBD => "VBD",
            PosTag::VBG => "VBG",
            PosTag::VBN => "VBN",
            PosTag::VBP => "VBP",
            PosTag::VBZ => "VBZ",
            PosTag::WH => "WH",
        }
    }
}

impl fmt::Display for PosTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PosTag {
    type Err = SentivoteError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        PosTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == upper)
            .ok_or_else(|| SentivoteError::configuration(format!("unknown part-of-speech tag: {s}")))
    }
}

/// Assigns a part-of-speech tag to a single lowercase word.
pub trait PosTagger: Send + Sync {
    /// Tag one word.
    fn tag(&self, word: &str) -> PosTag;

    /// Get the name of this tagger for debugging and logging.
    fn name(&self) -> &'static str;
}

lazy_static! {
    static ref LEXICON: AHashMap<&'static str, PosTag> = {
        let mut m = AHashMap::new();
        let groups: &[(PosTag, &[&str])] = &[
            (
                PosTag::MD,
                &["can", "could", "may", "might", "must", "shall", "should", "will", "would", "ought", "cannot"],
            ),
            (
                PosTag::UH,
                &[
                    "wow", "ugh", "yay", "hey", "oops", "ouch", "hmm", "meh", "yikes", "damn", "alas", "hooray",
                    "bravo", "yeah", "yes", "nope", "lol", "omg", "argh", "whoa", "woohoo", "yuck", "phew",
                    "please", "thanks",
                ],
            ),
            (
                PosTag::DT,
                &["the", "this", "that", "these", "those", "any", "each", "every", "some", "all", "both", "either", "neither", "another", "such"],
            ),
            (
                PosTag::PRP,
                &[
                    "you", "she", "him", "her", "his", "hers", "its", "they", "them", "their", "theirs", "our", "ours",
                    "your", "yours", "mine", "myself", "yourself", "himself", "herself", "itself", "ourselves",
                    "themselves",
                ],
            ),
            (
                PosTag::IN,
                &[
                    "about", "above", "across", "after", "against", "along", "among", "around", "before", "behind",
                    "below", "beneath", "beside", "between", "beyond", "despite", "down", "during", "except", "for",
                    "from", "inside", "into", "near", "off", "onto", "out", "outside", "over", "since", "through",
                    "throughout", "till", "toward", "towards", "under", "until", "upon", "with", "within", "without",
                    "because", "although", "though", "unless", "whether", "while", "than",
                ],
            ),
            (PosTag::CC, &["and", "but", "nor", "yet", "plus"]),
            (
                PosTag::WH,
                &["what", "which", "who", "whom", "whose", "when", "where", "why", "how", "whatever", "whoever"],
            ),
            (
                PosTag::RB,
                &[
                    "not", "never", "very", "too", "also", "just", "really", "quite", "rather", "almost", "always",
                    "often", "sometimes", "seldom", "still", "even", "ever", "again", "already", "soon", "now",
                    "then", "here", "there", "well", "far", "much", "once", "twice", "anyway", "somewhat", "perhaps",
                    "maybe", "instead", "indeed", "enough", "n't", "away", "back", "together",
                ],
            ),
            (PosTag::RBR, &["more", "less"]),
            (PosTag::RBS, &["most", "least"]),
            (
                PosTag::JJ,
                &[
                    "good", "bad", "great", "awful", "nice", "poor", "fun", "dull", "fine", "cool", "hot", "cold",
                    "new", "old", "big", "small", "long", "short", "high", "low", "real", "true", "false", "sad",
                    "mad", "happy", "best", "worst", "own", "few", "many", "other", "same", "little", "whole",
                    "smart", "dumb", "weak", "strong", "cheap", "slow", "fast", "flat", "free", "full", "empty",
                    "pure", "rich", "safe", "sick", "ugly", "wrong", "right", "wise", "odd", "evil", "epic", "lame",
                ],
            ),
            (PosTag::JJR, &["better", "worse", "bigger", "smaller", "greater", "larger", "older", "newer"]),
            (
                PosTag::VB,
                &[
                    "be", "have", "do", "get", "make", "go", "see", "know", "take", "think", "come", "give", "look",
                    "want", "love", "hate", "like", "feel", "need", "try", "buy", "watch", "seem", "leave", "let",
                    "keep", "put", "say", "tell", "find", "work", "play", "enjoy", "miss", "hope", "wish", "care",
                ],
            ),
            (PosTag::VBP, &["are", "'re", "'ve", "am"]),
            (PosTag::VBZ, &["is", "has", "does", "says", "goes", "gets", "makes", "seems", "looks"]),
            (
                PosTag::VBD,
                &[
                    "was", "were", "had", "did", "made", "got", "went", "saw", "knew", "took", "thought", "came",
                    "gave", "felt", "left", "kept", "said", "told", "found", "bought", "brought", "fell", "lost",
                ],
            ),
            (PosTag::VBN, &["been", "done", "gone", "seen", "known", "taken", "given", "shown", "written"]),
            (PosTag::VBG, &["being", "having", "doing", "going"]),
            (
                PosTag::NN,
                &[
                    "thing", "nothing", "something", "anything", "everything", "king", "ring", "morning", "evening",
                    "wedding", "bed", "red", "ness", "family", "film", "movie", "story", "time", "people", "year",
                    "day", "way", "man", "woman", "world", "life", "hand", "part", "place", "case", "week",
                ],
            ),
        ];
        for (tag, words) in groups {
            for word in words.iter() {
                m.insert(*word, *tag);
            }
        }
        m
    };
}

/// Suffix rules, longest suffix first within each group.
const SUFFIX_RULES: &[(&str, PosTag)] = &[
    ("ically", PosTag::RB),
    ("ly", PosTag::RB),
    ("ward", PosTag::RB),
    ("wise", PosTag::RB),
    ("tion", PosTag::NN),
    ("sion", PosTag::NN),
    ("ness", PosTag::NN),
    ("ment", PosTag::NN),
    ("ship", PosTag::NN),
    ("ity", PosTag::NN),
    ("ism", PosTag::NN),
    ("ist", PosTag::NN),
    ("ance", PosTag::NN),
    ("ence", PosTag::NN),
    ("ing", PosTag::VBG),
    ("ed", PosTag::VBD),
    ("est", PosTag::JJS),
    ("ous", PosTag::JJ),
    ("ful", PosTag::JJ),
    ("ive", PosTag::JJ),
    ("able", PosTag::JJ),
    ("ible", PosTag::JJ),
    ("less", PosTag::JJ),
    ("ish", PosTag::JJ),
    ("ical", PosTag::JJ),
    ("ic", PosTag::JJ),
    ("al", PosTag::JJ),
    ("ary", PosTag::JJ),
    ("ant", PosTag::JJ),
    ("ent", PosTag::JJ),
    ("ize", PosTag::VB),
    ("ise", PosTag::VB),
    ("ify", PosTag::VB),
    ("ate", PosTag::VB),
    ("en", PosTag::VBN),
];

/// Lexicon lookup with suffix-rule fallback.
#[derive(Debug, Clone, Default)]
pub struct LexiconPosTagger;

impl LexiconPosTagger {
    /// Create a new tagger.
    pub fn new() -> Self {
        LexiconPosTagger
    }
}

impl PosTagger for LexiconPosTagger {
    fn tag(&self, word: &str) -> PosTag {
        if let Some(tag) = LEXICON.get(word) {
            return *tag;
        }

        if word.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
            return PosTag::CD;
        }

        if word.ends_with("n't") {
            return PosTag::MD;
        }

        for (suffix, tag) in SUFFIX_RULES {
            // Require a stem of at least two characters so "red" or "sing"
            // are not mistaken for inflections.
            if word.len() >= suffix.len() + 2 && word.ends_with(suffix) {
                return *tag;
            }
        }

        PosTag::NN
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_classes() {
        let tagger = LexiconPosTagger::new();
        assert_eq!(tagger.tag("should"), PosTag::MD);
        assert_eq!(tagger.tag("the"), PosTag::DT);
        assert_eq!(tagger.tag("wow"), PosTag::UH);
        assert_eq!(tagger.tag("with"), PosTag::IN);
    }

    #[test]
    fn test_suffix_rules() {
        let tagger = LexiconPosTagger::new();
        assert_eq!(tagger.tag("beautifully"), PosTag::RB);
        assert_eq!(tagger.tag("boring"), PosTag::VBG);
        assert_eq!(tagger.tag("wasted"), PosTag::VBD);
        assert_eq!(tagger.tag("hilarious"), PosTag::JJ);
        assert_eq!(tagger.tag("direction"), PosTag::NN);
        assert_eq!(tagger.tag("couldn't"), PosTag::MD);
    }

    #[test]
    fn test_fallback_is_noun() {
        let tagger = LexiconPosTagger::new();
        assert_eq!(tagger.tag("popcorn"), PosTag::NN);
        assert_eq!(tagger.tag("2019"), PosTag::CD);
    }

    #[test]
    fn test_tag_parsing() {
        assert_eq!("vbz".parse::<PosTag>().unwrap(), PosTag::VBZ);
        assert!("XYZ".parse::<PosTag>().is_err());
        assert_eq!(PosTag::default_allow_list().len(), 15);
    }

    #[test]
    fn test_tag_serde_spelling() {
        let json = serde_json::to_string(&PosTag::JJR).unwrap();
        assert_eq!(json, "\"JJR\"");
    }
}
