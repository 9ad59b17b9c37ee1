//! Batched, staggered sentence generation.
//!
//! ```text
//! combinations ──chunks(outer_batch_size)──▶ outer batch (sequential)
//!                                               │
//!                     chunks(dispatch_group_size), group_pause between
//!                                               │
//!                    join_all(stagger(index) → RetryPolicy::run(generate+parse))
//!                                               │
//!                 Exhausted → placeholder     Aborted → whole batch skipped
//!                                               │
//!                                    GenerationEvent::Progress
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use thiserror::Error;

use crate::config::GenerationConfig;
use crate::llm::{
    sentence_prompt, truncate_prompt, GenerationParams, LanguageModel, RetryError, RetryPolicy,
};
use crate::model::{Combination, GeneratedSentence, SentencePair};

use super::parse::{parse_sentence_pair, placeholder};

/// Message shown when a run produced nothing at all.
pub const NOTHING_GENERATED_MESSAGE: &str = "問題の生成に失敗しました。もう一度お試しください。";

// ---------------------------------------------------------------------------
// Events and errors
// ---------------------------------------------------------------------------

/// Published after every outer batch.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    Progress {
        /// `processed / total × 100`.
        percent: f32,
        /// Everything accumulated so far, in combination order.
        sentences: Vec<GeneratedSentence>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Every outer batch was skipped.
    #[error("{}", NOTHING_GENERATED_MESSAGE)]
    NothingGenerated,
}

// ---------------------------------------------------------------------------
// GenerationPipeline
// ---------------------------------------------------------------------------

/// Drives a language model through a list of combinations.
pub struct GenerationPipeline {
    model: Arc<dyn LanguageModel>,
    config: GenerationConfig,
    retry: RetryPolicy,
}

impl GenerationPipeline {
    pub fn new(model: Arc<dyn LanguageModel>, config: GenerationConfig) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self {
            model,
            config,
            retry,
        }
    }

    /// Start offset of the request at `index` within its outer batch.
    fn stagger(&self, index: usize) -> Duration {
        let group = self.config.dispatch_group_size.max(1);
        self.config.stagger_step() * (index % group) as u32
    }

    /// Generate one pair per combination of a single outer batch.
    ///
    /// The result has exactly one entry per combination, in input order;
    /// combinations whose attempts were exhausted get the placeholder pair.
    /// A non-retryable failure fails the whole batch.
    pub async fn generate_batch(
        &self,
        combinations: &[Combination],
    ) -> Result<Vec<SentencePair>, RetryError> {
        let group_size = self.config.dispatch_group_size.max(1);
        let mut pairs = Vec::with_capacity(combinations.len());

        for (group_no, group) in combinations.chunks(group_size).enumerate() {
            if group_no > 0 && !self.config.group_pause().is_zero() {
                tokio::time::sleep(self.config.group_pause()).await;
            }

            let base = group_no * group_size;
            let requests = group
                .iter()
                .enumerate()
                .map(|(i, combination)| self.generate_one(combination, self.stagger(base + i)));

            for (i, result) in join_all(requests).await.into_iter().enumerate() {
                match result {
                    Ok(pair) => pairs.push(pair),
                    Err(RetryError::Exhausted { attempts, last }) => {
                        log::warn!(
                            "generation: {:?} failed after {attempts} attempts ({last}), using placeholder",
                            group[i]
                        );
                        pairs.push(placeholder());
                    }
                    Err(err @ RetryError::Aborted(_)) => return Err(err),
                }
            }
        }

        Ok(pairs)
    }

    async fn generate_one(
        &self,
        combination: &Combination,
        delay: Duration,
    ) -> Result<SentencePair, RetryError> {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let prompt = truncate_prompt(&sentence_prompt(combination), self.config.max_prompt_chars);
        let prompt = prompt.as_str();
        let model = self.model.as_ref();

        self.retry
            .run(move |attempt| async move {
                log::debug!("generation: attempt {attempt} for {combination:?}");
                let raw = model.generate(prompt, &GenerationParams::SENTENCE).await?;
                parse_sentence_pair(&raw)
            })
            .await
    }

    /// Generate sentences for every combination.
    ///
    /// `on_event` receives one [`GenerationEvent::Progress`] per outer batch;
    /// the last one reports 100.  Skipped batches still advance progress.
    pub async fn run<F>(
        &self,
        combinations: &[Combination],
        mut on_event: F,
    ) -> Result<Vec<GeneratedSentence>, GenerationError>
    where
        F: FnMut(GenerationEvent) + Send,
    {
        let total = combinations.len();
        let batch_size = self.config.outer_batch_size.max(1);
        let mut sentences: Vec<GeneratedSentence> = Vec::with_capacity(total);
        let mut processed = 0usize;

        log::info!("generation: {total} combinations in batches of {batch_size}");

        for (batch_no, batch) in combinations.chunks(batch_size).enumerate() {
            match self.generate_batch(batch).await {
                Ok(pairs) => {
                    for (combination, pair) in batch.iter().zip(pairs) {
                        sentences.push(GeneratedSentence {
                            id: format!("gen_{}", sentences.len() + 1),
                            japanese: pair.japanese,
                            english: pair.english,
                            level: combination.level,
                            present_type: combination.present_type,
                            contents_type: combination.category,
                            selected: true,
                        });
                    }
                }
                Err(e) => {
                    log::error!("generation: batch {} skipped: {e}", batch_no + 1);
                }
            }

            processed += batch.len();
            on_event(GenerationEvent::Progress {
                percent: processed as f32 / total as f32 * 100.0,
                sentences: sentences.clone(),
            });
        }

        if sentences.is_empty() {
            return Err(GenerationError::NothingGenerated);
        }

        log::info!("generation: produced {} sentences", sentences.len());
        Ok(sentences)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
