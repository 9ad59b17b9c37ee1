//! Application entry point — 英語学習アプリ.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the language model, spreadsheet client and speech recognizer.
//! 5. Create channels (`command`, `event`).
//! 6. Spawn the orchestrator on the tokio runtime and queue the first fetch.
//! 7. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use tokio::sync::mpsc;
use eigo_drill::{
    app::{install_cjk_font, resolve_cjk_font, PracticeApp},
    config::{AppConfig, AppPaths},
    evaluation::Evaluator,
    generation::GenerationPipeline,
    llm::{ApiModel, LanguageModel},
    orchestrator::{Command, Orchestrator},
    sheets::{HttpTransport, SheetsClient},
    speech::{SpeechRecognizer, SpeechSession, UnavailableRecognizer, WhisperRecognizer},
};

use eframe::egui;

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let viewport = egui::ViewportBuilder::default()
        .with_title("英語学習アプリ")
        .with_inner_size([width, height])
        .with_min_inner_size([420.0, 360.0]);

    eframe::NativeOptions {
        viewport,
        ..Default::default()
    }
}

/// Load the Whisper model, or a stub that reports speech as unsupported so
/// the app still launches without a model file present.
fn build_recognizer(config: &AppConfig) -> Arc<dyn SpeechRecognizer> {
    let model_path = AppPaths::new().model_file(&config.speech.model);

    match WhisperRecognizer::load(&model_path, config.speech.clone()) {
        Ok(recognizer) => {
            log::info!("Whisper model loaded: {}", model_path.display());
            Arc::new(recognizer)
        }
        Err(e) => {
            log::warn!(
                "Could not load Whisper model ({}): {e}. Speech input is disabled.",
                model_path.display()
            );
            Arc::new(UnavailableRecognizer::new(e.to_string()))
        }
    }
}

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("英語学習アプリ starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    // 4. Services
    let model: Arc<dyn LanguageModel> = Arc::new(ApiModel::from_config(&config.llm));
    let sheets = SheetsClient::new(
        Arc::new(HttpTransport::from_config(&config.sheets)),
        config.sheets.clone(),
    );
    let orchestrator = Orchestrator::new(
        sheets,
        Evaluator::new(Arc::clone(&model)),
        GenerationPipeline::new(model, config.generation.clone()),
        SpeechSession::new(build_recognizer(&config)),
    );

    // 5. Channel setup
    let (command_tx, command_rx) = mpsc::channel::<Command>(16);
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    // 6. Orchestrator + initial load
    rt.spawn(orchestrator.run(command_rx, event_tx));
    if let Err(e) = command_tx.try_send(Command::Fetch) {
        log::error!("Could not queue initial fetch: {e}");
    }

    // 7. Window
    let app = PracticeApp::new(command_tx, event_rx);
    let options = native_options(&config);
    let font_path = resolve_cjk_font(config.ui.cjk_font_path.as_deref());

    eframe::run_native(
        "英語学習アプリ",
        options,
        Box::new(move |cc| {
            if let Some(path) = &font_path {
                install_cjk_font(&cc.egui_ctx, path);
            }
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("window error: {e}"))?;

    log::info!("Window closed; shutting down");
    Ok(())
}
