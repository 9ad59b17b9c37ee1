//! Single-shot English dictation.
//!
//! [`SpeechRecognizer`] is the blocking, one-utterance interface;
//! [`WhisperRecognizer`] implements it with the microphone and a local
//! Whisper model.  [`SpeechSession`] runs a recognizer on the blocking pool
//! and reports through a result / error callback pair, allowing one active
//! recognition at a time.

pub mod capture;
pub mod signal;
pub mod whisper;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;

pub use whisper::WhisperRecognizer;

/// Shown when no recognizer could be set up.
pub const UNSUPPORTED_MESSAGE: &str = "この環境は音声認識をサポートしていません。";
/// Shown when the microphone could not be opened.
pub const PERMISSION_MESSAGE: &str = "マイクの使用が許可されていません。設定を確認してください。";
/// Shown for every other recognition failure.
pub const RECOGNITION_FAILED_MESSAGE: &str = "音声認識中にエラーが発生しました。";

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    /// No recognizer in this environment (no model, no input device).
    #[error("speech recognition unavailable: {0}")]
    Unavailable(String),

    /// The input device refused to open or stream.
    #[error("microphone error: {0}")]
    Microphone(String),

    /// The engine failed while decoding.
    #[error("recognition failed: {0}")]
    Recognition(String),

    /// The utterance ended without any recognisable speech.
    #[error("no speech detected")]
    NoSpeech,

    /// Another recognition is already running.
    #[error("speech recognition already in progress")]
    Busy,
}

impl SpeechError {
    pub fn user_message(&self) -> &'static str {
        match self {
            SpeechError::Unavailable(_) => UNSUPPORTED_MESSAGE,
            SpeechError::Microphone(_) => PERMISSION_MESSAGE,
            _ => RECOGNITION_FAILED_MESSAGE,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechRecognizer
// ---------------------------------------------------------------------------

/// Blocking, single-utterance English recognizer returning the final
/// transcript only.
pub trait SpeechRecognizer: Send + Sync {
    fn recognize_once(&self) -> Result<String, SpeechError>;
}

/// Stand-in used when no real recognizer could be loaded.
pub struct UnavailableRecognizer {
    reason: String,
}

impl UnavailableRecognizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SpeechRecognizer for UnavailableRecognizer {
    fn recognize_once(&self) -> Result<String, SpeechError> {
        Err(SpeechError::Unavailable(self.reason.clone()))
    }
}

// ---------------------------------------------------------------------------
// SpeechSession
// ---------------------------------------------------------------------------

/// Clears the active flag however the recognition ends.
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs at most one recognition at a time.
#[derive(Clone)]
pub struct SpeechSession {
    recognizer: Arc<dyn SpeechRecognizer>,
    active: Arc<AtomicBool>,
}

impl SpeechSession {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self {
            recognizer,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start one recognition on the blocking pool.
    ///
    /// Exactly one of the callbacks is invoked, once.  If a recognition is
    /// already running, `on_error(SpeechError::Busy)` is called right away
    /// and `None` is returned.  Must be called inside a tokio runtime.
    pub fn start<R, E>(&self, on_result: R, on_error: E) -> Option<JoinHandle<()>>
    where
        R: FnOnce(String) + Send + 'static,
        E: FnOnce(SpeechError) + Send + 'static,
    {
        if self.active.swap(true, Ordering::SeqCst) {
            log::debug!("speech: start rejected, session busy");
            on_error(SpeechError::Busy);
            return None;
        }

        let guard = ActiveGuard(Arc::clone(&self.active));
        let recognizer = Arc::clone(&self.recognizer);

        Some(tokio::task::spawn_blocking(move || {
            let result = recognizer.recognize_once();
            drop(guard);
            match result {
                Ok(text) if !text.trim().is_empty() => on_result(text.trim().to_string()),
                Ok(_) => on_error(SpeechError::NoSpeech),
                Err(e) => {
                    log::warn!("speech: {e}");
                    on_error(e)
                }
            }
        }))
    }
}
