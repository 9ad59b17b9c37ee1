//! Japanese → English sentence practice.
//!
//! The learner picks a category, pronoun and level, reads a Japanese
//! sentence and answers in English by typing or speaking.  A language model
//! grades the answer; a second workflow generates new sentence pairs and
//! saves reviewed ones to a spreadsheet-backed API.
//!
//! # Modules
//!
//! | Module | Role |
//! |--------|------|
//! | [`model`] | sentences, levels, filters, generation grid |
//! | [`config`] | `settings.toml` + platform paths |
//! | [`llm`] | model client, prompts, retry policy |
//! | [`generation`] | batched, staggered sentence generation |
//! | [`evaluation`] | answer grading |
//! | [`sheets`] | spreadsheet API fetch / save |
//! | [`speech`] | microphone capture + Whisper recognition |
//! | [`practice`] | UI state reducer |
//! | [`orchestrator`] | background command loop |
//! | [`app`] | egui window |

pub mod app;
pub mod config;
pub mod evaluation;
pub mod generation;
pub mod llm;
pub mod model;
pub mod orchestrator;
pub mod practice;
pub mod sheets;
pub mod speech;
