//! Sentence records, filter dimensions and generation combinations.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Level;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Scene a sentence belongs to (`contents_type` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Life,
    Business,
    School,
    Hobby,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Life,
        Category::Business,
        Category::School,
        Category::Hobby,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Life => "Life",
            Category::Business => "Business",
            Category::School => "School",
            Category::Hobby => "Hobby",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Life
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Pronoun
// ---------------------------------------------------------------------------

/// Grammatical subject of a sentence (`present_type` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pronoun {
    #[serde(rename = "I")]
    I,
    #[serde(rename = "HE/SHE")]
    HeShe,
    #[serde(rename = "IT")]
    It,
    #[serde(rename = "WE")]
    We,
    #[serde(rename = "THEY")]
    They,
}

impl Pronoun {
    pub const ALL: [Pronoun; 5] = [
        Pronoun::I,
        Pronoun::HeShe,
        Pronoun::It,
        Pronoun::We,
        Pronoun::They,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pronoun::I => "I",
            Pronoun::HeShe => "HE/SHE",
            Pronoun::It => "IT",
            Pronoun::We => "WE",
            Pronoun::They => "THEY",
        }
    }

    /// Lower-case subject word the generator is asked to start with.
    ///
    /// `HE/SHE` becomes `"he"`; everything else is simply lower-cased.
    pub fn subject(&self) -> &'static str {
        match self {
            Pronoun::I => "i",
            Pronoun::HeShe => "he",
            Pronoun::It => "it",
            Pronoun::We => "we",
            Pronoun::They => "they",
        }
    }
}

impl Default for Pronoun {
    fn default() -> Self {
        Pronoun::HeShe
    }
}

impl fmt::Display for Pronoun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Sentence
// ---------------------------------------------------------------------------

/// Identifier of a fetched sentence.  The spreadsheet API emits numbers but
/// hand-edited rows sometimes carry text ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SentenceId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SentenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentenceId::Number(n) => write!(f, "{n}"),
            SentenceId::Text(s) => f.write_str(s),
        }
    }
}

/// A practice sentence as served by the spreadsheet API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub id: SentenceId,
    pub japanese: String,
    pub english: String,
    pub level: Level,
    pub present_type: Pronoun,
    pub contents_type: Category,
}

impl Sentence {
    /// Returns `true` when all three filter dimensions match exactly.
    pub fn matches(&self, filter: &Filter) -> bool {
        self.contents_type == filter.category
            && self.present_type == filter.pronoun
            && self.level == filter.level
    }
}

/// A sentence produced by the generator, pending review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSentence {
    /// `gen_1`, `gen_2`, …; unique within one generation run only.
    pub id: String,
    pub japanese: String,
    pub english: String,
    pub level: Level,
    pub present_type: Pronoun,
    pub contents_type: Category,
    pub selected: bool,
}

/// A parsed Japanese / English pair from one generation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentencePair {
    pub japanese: String,
    pub english: String,
}

impl SentencePair {
    pub fn new(japanese: impl Into<String>, english: impl Into<String>) -> Self {
        Self {
            japanese: japanese.into(),
            english: english.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// The (category, pronoun, level) triple selecting the practice subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Filter {
    pub category: Category,
    pub pronoun: Pronoun,
    pub level: Level,
}

impl Filter {
    pub fn new(category: Category, pronoun: Pronoun, level: Level) -> Self {
        Self {
            category,
            pronoun,
            level,
        }
    }
}

/// Sentences matching `filter`, in their original order.
pub fn filter_sentences<'a>(sentences: &'a [Sentence], filter: &Filter) -> Vec<&'a Sentence> {
    sentences.iter().filter(|s| s.matches(filter)).collect()
}

// ---------------------------------------------------------------------------
// Combination
// ---------------------------------------------------------------------------

/// One cell of the category × pronoun × level grid driving generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Combination {
    pub category: Category,
    pub present_type: Pronoun,
    pub level: Level,
}

/// The full 4 × 5 × 3 = 60 combination grid, category-major.
pub fn all_combinations() -> Vec<Combination> {
    let mut out = Vec::with_capacity(Category::ALL.len() * Pronoun::ALL.len() * 3);
    for category in Category::ALL {
        for present_type in Pronoun::ALL {
            for level in Level::STANDARD {
                out.push(Combination {
                    category,
                    present_type,
                    level,
                });
            }
        }
    }
    out
}
