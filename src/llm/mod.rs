//! Generative-language service client.
//!
//! This module provides:
//! * [`LanguageModel`] — async trait implemented by every model backend.
//! * [`ApiModel`] — Gemini / OpenAI-compatible REST implementation.
//! * [`GenerationParams`] — sampling settings per use case.
//! * [`RetryPolicy`] — pure backoff schedule + bounded retry combinator.
//! * prompt builders for sentence generation and answer evaluation.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use eigo_drill::config::AppConfig;
//! use eigo_drill::llm::{ApiModel, GenerationParams, LanguageModel};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::load().unwrap();
//!     let model = ApiModel::from_config(&config.llm);
//!
//!     let text = model
//!         .generate("Say hello in Japanese.", &GenerationParams::SENTENCE)
//!         .await
//!         .unwrap();
//!     println!("{text}");
//! }
//! ```

pub mod client;
pub mod prompt;
pub mod retry;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{ApiModel, GenerationParams, LanguageModel, LlmError};
pub use prompt::{evaluation_prompt, sentence_prompt, truncate_prompt, ENGLISH_PREFIX, JAPANESE_PREFIX};
pub use retry::{RetryError, RetryPolicy};
