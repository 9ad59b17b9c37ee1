//! Where settings and Whisper models live.
//!
//! | Kind | Linux | macOS | Windows |
//! |------|-------|-------|---------|
//! | settings | `~/.config/eigo-drill/` | `~/Library/Application Support/eigo-drill/` | `%APPDATA%\eigo-drill\` |
//! | models | `~/.local/share/eigo-drill/models/` | `~/Library/Application Support/eigo-drill/models/` | `%LOCALAPPDATA%\eigo-drill\models\` |

use std::path::{Path, PathBuf};

const APP_DIR: &str = "eigo-drill";
const SETTINGS_FILE: &str = "settings.toml";

/// Resolved directories.  Falls back to `./eigo-drill` when the platform
/// has no standard location.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub settings_file: PathBuf,
    /// Holds `ggml-*.bin` Whisper models.
    pub models_dir: PathBuf,
}

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}

impl AppPaths {
    pub fn new() -> Self {
        let config_dir = app_dir(dirs::config_dir());
        Self {
            settings_file: config_dir.join(SETTINGS_FILE),
            models_dir: app_dir(dirs::data_local_dir()).join("models"),
            config_dir,
        }
    }

    /// Model file for the `speech.model` setting.
    ///
    /// A bare name such as `ggml-base.en` maps to `<models_dir>/ggml-base.en.bin`;
    /// anything that already looks like a file path (absolute, or ending in
    /// `.bin`) is used as given.
    pub fn model_file(&self, model: &str) -> PathBuf {
        let given = Path::new(model);
        if given.is_absolute() || given.extension().is_some_and(|ext| ext == "bin") {
            return given.to_path_buf();
        }
        self.models_dir.join(format!("{model}.bin"))
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_file_lives_in_config_dir() {
        let paths = AppPaths::new();
        assert_eq!(paths.settings_file.parent(), Some(paths.config_dir.as_path()));
        assert!(paths.config_dir.ends_with(APP_DIR));
        assert!(paths.models_dir.ends_with("models"));
    }

    #[test]
    fn bare_model_name_resolves_under_models_dir() {
        let paths = AppPaths::new();
        let file = paths.model_file("ggml-base.en");
        assert_eq!(file, paths.models_dir.join("ggml-base.en.bin"));
    }

    #[test]
    fn explicit_model_path_is_kept() {
        let paths = AppPaths::new();
        assert_eq!(
            paths.model_file("models/ggml-small.en.bin"),
            PathBuf::from("models/ggml-small.en.bin")
        );

        let absolute = std::env::temp_dir().join("ggml-tiny.en");
        assert_eq!(paths.model_file(absolute.to_str().unwrap()), absolute);
    }
}
