//! Local English recognizer built on `whisper-rs`.

use std::path::Path;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::config::SpeechConfig;

use super::capture::record_utterance;
use super::signal::{EnergyVad, WHISPER_RATE};
use super::{SpeechError, SpeechRecognizer};

/// Shortest clip Whisper is given: 0.5 s.
const MIN_SAMPLES: usize = WHISPER_RATE as usize / 2;

/// Microphone + Whisper, one utterance per call.
pub struct WhisperRecognizer {
    ctx: WhisperContext,
    config: SpeechConfig,
    n_threads: i32,
}

impl std::fmt::Debug for WhisperRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperRecognizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// SAFETY: whisper-rs declares WhisperContext Send + Sync; a fresh state is
// created per call and the weights are never mutated.
unsafe impl Send for WhisperRecognizer {}
unsafe impl Sync for WhisperRecognizer {}

impl WhisperRecognizer {
    /// Load the GGML model at `model_path`.
    pub fn load(model_path: impl AsRef<Path>, config: SpeechConfig) -> Result<Self, SpeechError> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(SpeechError::Unavailable(format!(
                "model not found: {}",
                path.display()
            )));
        }
        let path_str = path.to_str().ok_or_else(|| {
            SpeechError::Unavailable(format!("non-UTF-8 model path: {}", path.display()))
        })?;

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| SpeechError::Unavailable(e.to_string()))?;

        let n_threads = std::thread::available_parallelism()
            .map(|n| n.get().min(8) as i32)
            .unwrap_or(4);

        log::info!("speech: loaded {}", path.display());
        Ok(Self {
            ctx,
            config,
            n_threads,
        })
    }

    /// Transcribe 16 kHz mono audio.
    pub fn transcribe(&self, audio: &[f32]) -> Result<String, SpeechError> {
        if audio.len() < MIN_SAMPLES {
            return Err(SpeechError::NoSpeech);
        }

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(self.config.language.as_str()));
        params.set_n_threads(self.n_threads);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_single_segment(true);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| SpeechError::Recognition(e.to_string()))?;
        state
            .full(params, audio)
            .map_err(|e| SpeechError::Recognition(e.to_string()))?;

        let n = state
            .full_n_segments()
            .map_err(|e| SpeechError::Recognition(e.to_string()))?;

        let mut text = String::new();
        for i in 0..n {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| SpeechError::Recognition(format!("segment {i}: {e}")))?;
            text.push_str(&segment);
        }
        Ok(text.trim().to_string())
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn recognize_once(&self) -> Result<String, SpeechError> {
        let audio = record_utterance(&self.config)?;
        let voiced = EnergyVad::new(self.config.vad_threshold).trim(&audio);
        let text = self.transcribe(voiced)?;
        log::debug!("speech: recognised {text:?}");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_is_unavailable() {
        let err = WhisperRecognizer::load("/nonexistent/ggml-base.en.bin", SpeechConfig::default())
            .unwrap_err();
        assert!(matches!(err, SpeechError::Unavailable(_)));
        assert!(err.to_string().contains("/nonexistent"));
    }
}
