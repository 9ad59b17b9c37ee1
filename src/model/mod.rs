//! Data model shared by every subsystem.
//!
//! * [`Sentence`] — a practice sentence fetched from the spreadsheet API.
//! * [`GeneratedSentence`] — a generator result awaiting review.
//! * [`Filter`] — the (category, pronoun, level) triple driving practice.
//! * [`Combination`] — one cell of the generation grid.

pub mod level;
pub mod sentence;

pub use level::Level;
pub use sentence::{
    all_combinations, filter_sentences, Category, Combination, Filter, GeneratedSentence,
    Pronoun, Sentence, SentenceId, SentencePair,
};
