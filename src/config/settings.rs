//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Environment variable that overrides [`LlmConfig::api_key`].
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

// ---------------------------------------------------------------------------
// LlmProvider
// ---------------------------------------------------------------------------

/// Selects which generative-language backend answers prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LlmProvider {
    /// Google Gemini `generateContent` REST API.
    Gemini,
    /// Any OpenAI-compatible REST API (OpenAI, Groq, Ollama, LM Studio …).
    OpenAiCompatible,
}

impl Default for LlmProvider {
    fn default() -> Self {
        Self::Gemini
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Connection settings for the generative-language service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which backend to use.
    pub provider: LlmProvider,
    /// Base URL of the API endpoint.
    ///
    /// - Gemini default: `https://generativelanguage.googleapis.com`
    /// - OpenAI: `https://api.openai.com`
    pub base_url: String,
    /// API key; also read from `GEMINI_API_KEY` when set.
    pub api_key: Option<String>,
    /// Model identifier (e.g. `"gemini-pro"`, `"gpt-4o-mini"`).
    pub model: String,
    /// Maximum seconds to wait for one response before timing out.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: None,
            model: "gemini-pro".into(),
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// GenerationConfig
// ---------------------------------------------------------------------------

/// Batching, pacing and retry schedule of the sentence generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Combinations per outer batch (one progress update each).
    pub outer_batch_size: usize,
    /// Requests dispatched concurrently inside an outer batch.
    pub dispatch_group_size: usize,
    /// Start offset per request: `stagger_step_ms × (index mod group size)`.
    pub stagger_step_ms: u64,
    /// Pause between two dispatch groups of the same outer batch.
    pub group_pause_ms: u64,
    /// Attempts per combination before the placeholder is used.
    pub max_attempts: u32,
    /// First retry delay; doubles on every further retry.
    pub retry_base_delay_ms: u64,
    /// Prompts are cut to this many characters before sending.
    pub max_prompt_chars: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            outer_batch_size: 10,
            dispatch_group_size: 4,
            stagger_step_ms: 1_000,
            group_pause_ms: 2_000,
            max_attempts: 3,
            retry_base_delay_ms: 5_000,
            max_prompt_chars: 1_000,
        }
    }
}

impl GenerationConfig {
    /// A schedule with every delay set to zero (tests, local models).
    pub fn without_delays() -> Self {
        Self {
            stagger_step_ms: 0,
            group_pause_ms: 0,
            retry_base_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn stagger_step(&self) -> Duration {
        Duration::from_millis(self.stagger_step_ms)
    }

    pub fn group_pause(&self) -> Duration {
        Duration::from_millis(self.group_pause_ms)
    }
}

// ---------------------------------------------------------------------------
// SheetsConfig
// ---------------------------------------------------------------------------

/// Endpoints of the spreadsheet-backed sentence API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    /// `GET` endpoint returning `{status, data: [Sentence]}`.
    pub fetch_url: String,
    /// `POST` endpoint accepting `{data: [...]}`.
    pub save_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Do not inspect save responses; any delivered request counts as an
    /// indeterminate success.
    pub opaque_writes: bool,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            fetch_url: "https://script.googleusercontent.com/macros/echo?user_content_key=hMIYJE8jZ5ikMwLFVsP2q6o-H4gSMnpNjipLubAlL19X52LDOjsFnqwtK7UGnPt_s5pPIx98DjWmMg0HDq0_zs0Q3Lv4zNham5_BxDlH2jW0nuo2oDemN9CCS2h10ox_1xSncGQajx_ryfhECjZEnFGeEfedxKUqLzoHlqoq3qOSrYYbYgzgVgaZhtHAFM5fUPyI6Vjnvc9ZC_6r-op_KyidLZfGtoGI94weD1x22fgQGHq81uQcm9z9Jw9Md8uu&lib=MHWbxWxso34rA-vRD4Yi0nj8oUYCUIwTU".into(),
            save_url: "https://script.google.com/macros/s/AKfycbz3DTxrhP6SbtY1BASOmzmUg0WGhmcYehpwgJmLqaZ-0YTrZjUmtltjVSziIGNnQSqAlQ/exec".into(),
            timeout_secs: 30,
            opaque_writes: true,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for single-shot answer dictation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// GGML Whisper model file stem under the models directory.
    pub model: String,
    /// Recognition language (fixed to English for answers).
    pub language: String,
    /// Hard cap on one utterance.
    pub max_utterance_secs: f32,
    /// Silence after speech that ends the utterance.
    pub trailing_silence_secs: f32,
    /// RMS threshold separating voice from silence.
    pub vad_threshold: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            model: "ggml-base.en".into(),
            language: "en".into(),
            max_utterance_secs: 15.0,
            trailing_silence_secs: 1.2,
            vad_threshold: 0.01,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Initial window size `(width, height)`.
    pub window_size: (f32, f32),
    /// Font file with Japanese glyphs; egui's bundled fonts have none.
    /// Unset means well-known system CJK fonts are tried.
    pub cjk_font_path: Option<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_size: (720.0, 820.0),
            cjk_font_path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use eigo_drill::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub generation: GenerationConfig,
    pub sheets: SheetsConfig,
    pub speech: SpeechConfig,
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`,
    /// then apply environment overrides.
    ///
    /// Returns defaults when the file does not exist yet.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&AppPaths::new().settings_file)?;
        config.apply_env(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override the API key with `env_key` when it is a non-empty string.
    pub fn apply_env(&mut self, env_key: Option<String>) {
        if let Some(key) = env_key.filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.llm.provider, loaded.llm.provider);
        assert_eq!(original.llm.base_url, loaded.llm.base_url);
        assert_eq!(original.llm.model, loaded.llm.model);
        assert_eq!(
            original.generation.outer_batch_size,
            loaded.generation.outer_batch_size
        );
        assert_eq!(original.sheets.save_url, loaded.sheets.save_url);
        assert_eq!(original.sheets.opaque_writes, loaded.sheets.opaque_writes);
        assert_eq!(original.speech.language, loaded.speech.language);
        assert_eq!(original.ui.window_size, loaded.ui.window_size);
    }

    #[test]
    fn partial_file_keeps_given_keys_and_defaults_the_rest() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[llm]\napi_key = \"abc\"\n").expect("write");

        let config = AppConfig::load_from(&path).expect("load");
        assert_eq!(config.llm.api_key.as_deref(), Some("abc"));
        assert_eq!(config.llm.provider, LlmProvider::Gemini);
        assert_eq!(config.llm.model, "gemini-pro");
        assert_eq!(config.generation.outer_batch_size, 10);
        assert!(config.sheets.opaque_writes);
        assert_eq!(config.speech.language, "en");
        assert_eq!(config.ui.window_size, (720.0, 820.0));
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.llm.model, "gemini-pro");
        assert_eq!(config.generation.max_attempts, 3);
    }

    #[test]
    fn default_schedule_matches_generator_constants() {
        let g = GenerationConfig::default();
        assert_eq!(g.outer_batch_size, 10);
        assert_eq!(g.dispatch_group_size, 4);
        assert_eq!(g.stagger_step(), Duration::from_secs(1));
        assert_eq!(g.group_pause(), Duration::from_secs(2));
        assert_eq!(g.max_attempts, 3);
        assert_eq!(g.retry_base_delay_ms, 5_000);
        assert_eq!(g.max_prompt_chars, 1_000);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.llm.provider = LlmProvider::OpenAiCompatible;
        cfg.llm.base_url = "https://api.openai.com".into();
        cfg.llm.api_key = Some("sk-test".into());
        cfg.llm.model = "gpt-4o-mini".into();
        cfg.sheets.opaque_writes = false;
        cfg.ui.cjk_font_path = Some("/usr/share/fonts/NotoSansJP.otf".into());

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.llm.provider, LlmProvider::OpenAiCompatible);
        assert_eq!(loaded.llm.api_key, Some("sk-test".into()));
        assert_eq!(loaded.llm.model, "gpt-4o-mini");
        assert!(!loaded.sheets.opaque_writes);
        assert_eq!(
            loaded.ui.cjk_font_path.as_deref(),
            Some("/usr/share/fonts/NotoSansJP.otf")
        );
    }

    #[test]
    fn env_key_overrides_only_when_non_empty() {
        let mut cfg = AppConfig::default();
        cfg.llm.api_key = Some("from-file".into());

        cfg.apply_env(Some("   ".into()));
        assert_eq!(cfg.llm.api_key.as_deref(), Some("from-file"));

        cfg.apply_env(None);
        assert_eq!(cfg.llm.api_key.as_deref(), Some("from-file"));

        cfg.apply_env(Some("from-env".into()));
        assert_eq!(cfg.llm.api_key.as_deref(), Some("from-env"));
    }
}
