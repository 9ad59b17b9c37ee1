//! Parsing of a single generation response into a [`SentencePair`].

use crate::llm::{LlmError, ENGLISH_PREFIX, JAPANESE_PREFIX};
use crate::model::SentencePair;

/// Japanese side of the pair emitted when every attempt failed.
pub const PLACEHOLDER_JAPANESE: &str = "エラーが発生しました";
/// English side of the pair emitted when every attempt failed.
pub const PLACEHOLDER_ENGLISH: &str = "An error occurred";

/// Shortest raw response worth inspecting.
const MIN_RESPONSE_CHARS: usize = 10;
/// Shortest accepted sentence on either side.
const MIN_SENTENCE_CHARS: usize = 5;

/// The placeholder pair.
pub fn placeholder() -> SentencePair {
    SentencePair::new(PLACEHOLDER_JAPANESE, PLACEHOLDER_ENGLISH)
}

/// Extract the `日本語:` / `英語:` lines from a model response.
///
/// Every rejection is reported as [`LlmError::Malformed`], which the retry
/// policy treats as retryable.
pub fn parse_sentence_pair(raw: &str) -> Result<SentencePair, LlmError> {
    if raw.trim().chars().count() < MIN_RESPONSE_CHARS {
        return Err(LlmError::Malformed(format!(
            "response too short ({} chars)",
            raw.trim().chars().count()
        )));
    }

    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let find = |prefix: &str| {
        lines
            .iter()
            .find_map(|l| l.strip_prefix(prefix))
            .map(|rest| rest.trim().to_string())
    };

    let japanese = find(JAPANESE_PREFIX)
        .ok_or_else(|| LlmError::Malformed(format!("no line starting with {JAPANESE_PREFIX}")))?;
    let english = find(ENGLISH_PREFIX)
        .ok_or_else(|| LlmError::Malformed(format!("no line starting with {ENGLISH_PREFIX}")))?;

    if japanese.chars().count() < MIN_SENTENCE_CHARS || english.chars().count() < MIN_SENTENCE_CHARS
    {
        return Err(LlmError::Malformed(format!(
            "sentence too short: {japanese:?} / {english:?}"
        )));
    }

    Ok(SentencePair { japanese, english })
}
