//! Bulk sentence generation.
//!
//! [`GenerationPipeline`] walks the combination grid in outer batches,
//! asking the language model for one Japanese / English pair per
//! combination.  Malformed answers are retried with backoff and finally
//! replaced by a placeholder pair; a batch that fails outright is skipped.

pub mod parse;
pub mod runner;

pub use parse::{parse_sentence_pair, placeholder, PLACEHOLDER_ENGLISH, PLACEHOLDER_JAPANESE};
pub use runner::{GenerationError, GenerationEvent, GenerationPipeline, NOTHING_GENERATED_MESSAGE};
