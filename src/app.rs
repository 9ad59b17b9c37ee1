//! Practice window — egui/eframe application.
//!
//! # Architecture
//!
//! [`PracticeApp`] is the top-level [`eframe::App`].  It owns the
//! [`PracticeState`] and two channel endpoints:
//!
//! * `command_tx` — sends [`Command`]s to the [`Orchestrator`](crate::orchestrator::Orchestrator).
//! * `event_rx`   — receives [`PracticeAction`]s reporting finished work.
//!
//! Rendering never mutates the state directly.  Widgets push [`Intent`]s
//! while the state is borrowed; the intents are applied once the frame's
//! panels are drawn.
//!
//! # Layout
//!
//! | Section | Content |
//! |---------|---------|
//! | Header | title, 問題を生成 button |
//! | Filters | category / pronoun / level buttons |
//! | Prompt | Japanese sentence, answer field, mic, 回答を確認 |
//! | Result | reference vs. answer, evaluation, 次の問題 |
//! | Window | 生成された問題一覧 with progress and save |

use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::evaluation::{EvaluationReport, ScoreBand};
use crate::model::{Category, Level, Pronoun};
use crate::orchestrator::Command;
use crate::practice::PracticeAction;
use crate::practice::PracticeState;

const TITLE: &str = "英語学習アプリ";

const RED: egui::Color32 = egui::Color32::from_rgb(220, 70, 70);
const YELLOW: egui::Color32 = egui::Color32::from_rgb(220, 170, 40);
const GREEN: egui::Color32 = egui::Color32::from_rgb(60, 170, 90);
const DIM: egui::Color32 = egui::Color32::from_rgb(120, 120, 120);

fn band_color(band: ScoreBand) -> egui::Color32 {
    match band {
        ScoreBand::Red => RED,
        ScoreBand::Yellow => YELLOW,
        ScoreBand::Green => GREEN,
    }
}

/// Something the user asked for during a frame.
#[derive(Debug, Clone, PartialEq)]
enum Intent {
    /// A purely local state change.
    Apply(PracticeAction),
    Submit,
    Listen,
    Generate,
    Save,
}

// ---------------------------------------------------------------------------
// Fonts
// ---------------------------------------------------------------------------

/// Japanese-capable fonts shipped with common desktops, tried in order when
/// `ui.cjk_font_path` is unset.
const SYSTEM_CJK_FONTS: &[&str] = &[
    // Linux (Noto Sans CJK packages)
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
    // macOS
    "/System/Library/Fonts/ヒラギノ角ゴシック W3.ttc",
    "/System/Library/Fonts/Hiragino Sans GB.ttc",
    // Windows
    "C:\\Windows\\Fonts\\YuGothR.ttc",
    "C:\\Windows\\Fonts\\meiryo.ttc",
    "C:\\Windows\\Fonts\\msgothic.ttc",
];

fn first_existing<'a>(candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .find(|p| std::path::Path::new(p).is_file())
}

/// The configured font, else the first installed system CJK font.
pub fn resolve_cjk_font(configured: Option<&str>) -> Option<String> {
    if let Some(path) = configured {
        return Some(path.to_string());
    }
    let found = first_existing(SYSTEM_CJK_FONTS);
    if found.is_none() {
        log::warn!("No CJK font found; set ui.cjk_font_path to show Japanese text");
    }
    found.map(str::to_string)
}

/// Register the font at `path` ahead of egui's bundled fonts so Japanese
/// text renders.  A missing or unreadable file only logs a warning.
pub fn install_cjk_font(ctx: &egui::Context, path: &str) {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            log::warn!("Could not read font {path}: {e}");
            return;
        }
    };

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("cjk".into(), Arc::new(egui::FontData::from_owned(bytes)));
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts
            .families
            .entry(family)
            .or_default()
            .insert(0, "cjk".into());
    }
    ctx.set_fonts(fonts);
    log::info!("Loaded CJK font from {path}");
}

// ---------------------------------------------------------------------------
// PracticeApp
// ---------------------------------------------------------------------------

/// eframe application — the sentence practice window.
pub struct PracticeApp {
    pub state: PracticeState,
    command_tx: mpsc::Sender<Command>,
    event_rx: mpsc::UnboundedReceiver<PracticeAction>,
}

impl PracticeApp {
    pub fn new(
        command_tx: mpsc::Sender<Command>,
        event_rx: mpsc::UnboundedReceiver<PracticeAction>,
    ) -> Self {
        Self {
            state: PracticeState::default(),
            command_tx,
            event_rx,
        }
    }

    // ── Channel plumbing ─────────────────────────────────────────────────

    /// Drain all pending orchestrator events (non-blocking).
    fn poll_events(&mut self) {
        while let Ok(action) = self.event_rx.try_recv() {
            self.state.apply(action);
        }
    }

    /// Queue `command`; false when the orchestrator is gone or backed up.
    fn send(&self, command: Command) -> bool {
        match self.command_tx.try_send(command) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Could not queue command: {e}");
                false
            }
        }
    }

    /// Apply one intent, sending a command first where work is needed.
    /// The matching `*Started` action is applied only once the command is
    /// queued.
    fn handle(&mut self, intent: Intent) {
        match intent {
            Intent::Apply(action) => self.state.apply(action),
            Intent::Submit => {
                let Some(current) = self.state.current.as_ref() else {
                    return;
                };
                if !self.state.can_submit() {
                    return;
                }
                let command = Command::Evaluate {
                    reference: current.english.clone(),
                    answer: self.state.effective_answer().to_string(),
                };
                if self.send(command) {
                    self.state.apply(PracticeAction::EvaluationStarted);
                }
            }
            Intent::Listen => {
                if self.state.can_listen() && self.send(Command::StartSpeech) {
                    self.state.apply(PracticeAction::SpeechStarted);
                }
            }
            Intent::Generate => {
                if self.state.can_generate() && self.send(Command::Generate) {
                    self.state.apply(PracticeAction::GenerationStarted);
                }
            }
            Intent::Save => {
                let generator = &self.state.generator;
                if !generator.can_save() {
                    return;
                }
                if self.send(Command::Save(generator.sentences.clone())) {
                    self.state.apply(PracticeAction::SaveStarted);
                }
            }
        }
    }

    fn is_busy(&self) -> bool {
        let s = &self.state;
        s.loading || s.listening || s.evaluating || s.generator.running || s.generator.saving
    }

    // ── Main panel ───────────────────────────────────────────────────────

    fn draw_header(&self, ui: &mut egui::Ui, intents: &mut Vec<Intent>) {
        ui.horizontal(|ui| {
            ui.heading(TITLE);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let label = if self.state.generator.running {
                    "生成中..."
                } else {
                    "問題を生成"
                };
                if ui
                    .add_enabled(self.state.can_generate(), egui::Button::new(label))
                    .clicked()
                {
                    intents.push(Intent::Generate);
                }
            });
        });
    }

    fn draw_filters(&self, ui: &mut egui::Ui, intents: &mut Vec<Intent>) {
        let filter = self.state.filter;

        ui.label("カテゴリを選択:");
        ui.horizontal_wrapped(|ui| {
            for category in Category::ALL {
                if ui
                    .selectable_label(filter.category == category, category.as_str())
                    .clicked()
                {
                    intents.push(Intent::Apply(PracticeAction::SetCategory(category)));
                }
            }
        });

        ui.label("代名詞を選択:");
        ui.horizontal_wrapped(|ui| {
            for pronoun in Pronoun::ALL {
                if ui
                    .selectable_label(filter.pronoun == pronoun, pronoun.as_str())
                    .clicked()
                {
                    intents.push(Intent::Apply(PracticeAction::SetPronoun(pronoun)));
                }
            }
        });

        ui.label("レベルを選択:");
        ui.horizontal_wrapped(|ui| {
            for level in Level::STANDARD {
                if ui
                    .selectable_label(filter.level == level, level.to_string())
                    .clicked()
                {
                    intents.push(Intent::Apply(PracticeAction::SetLevel(level)));
                }
            }
        });
    }

    fn draw_error(&self, ui: &mut egui::Ui, intents: &mut Vec<Intent>) {
        let Some(message) = &self.state.error else {
            return;
        };
        ui.horizontal(|ui| {
            ui.colored_label(RED, message.as_str());
            if ui.small_button("✕").clicked() {
                intents.push(Intent::Apply(PracticeAction::DismissError));
            }
        });
    }

    fn draw_question(&self, ui: &mut egui::Ui, intents: &mut Vec<Intent>) {
        let state = &self.state;
        let Some(current) = &state.current else {
            return;
        };

        ui.label(egui::RichText::new(current.japanese.as_str()).size(20.0));
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            let mut text = state.effective_answer().to_string();
            let field = ui.add(
                egui::TextEdit::singleline(&mut text)
                    .hint_text("英語で答えを入力...")
                    .desired_width(ui.available_width() - 48.0),
            );
            if field.changed() {
                intents.push(Intent::Apply(PracticeAction::AnswerEdited(text)));
            }
            if field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                intents.push(Intent::Submit);
            }

            let mic = if state.listening {
                egui::RichText::new("🎤").color(RED)
            } else {
                egui::RichText::new("🎤")
            };
            if ui
                .add_enabled(state.can_listen(), egui::Button::new(mic))
                .clicked()
            {
                intents.push(Intent::Listen);
            }
        });

        ui.add_space(6.0);
        let label = if state.evaluating {
            "評価中..."
        } else {
            "回答を確認"
        };
        if ui
            .add_enabled(state.can_submit(), egui::Button::new(label))
            .clicked()
        {
            intents.push(Intent::Submit);
        }
    }

    fn draw_result(&self, ui: &mut egui::Ui, intents: &mut Vec<Intent>) {
        let state = &self.state;
        let Some(current) = state.current.as_ref().filter(|_| state.revealed) else {
            return;
        };

        ui.separator();
        ui.label(egui::RichText::new(current.english.as_str()).size(18.0).strong());
        ui.add_space(6.0);

        ui.label(egui::RichText::new("回答の比較").strong());
        ui.label(format!("正解: {}", current.english));
        ui.label(format!("あなたの回答: {}", state.effective_answer()));
        ui.add_space(6.0);

        if let Some(report) = &state.evaluation {
            ui.label(egui::RichText::new("評価結果").strong());
            draw_report(ui, report);
        }

        ui.add_space(8.0);
        if ui.button("次の問題").clicked() {
            intents.push(Intent::Apply(PracticeAction::Next));
        }
    }

    // ── Generator window ─────────────────────────────────────────────────

    fn draw_generator(&self, ctx: &egui::Context, intents: &mut Vec<Intent>) {
        let generator = &self.state.generator;
        if !generator.open {
            return;
        }

        egui::Window::new("生成された問題一覧")
            .collapsible(false)
            .default_size([760.0, 520.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("✕").clicked() {
                            intents.push(Intent::Apply(PracticeAction::CloseGenerator));
                        }
                    });
                });

                if generator.running {
                    ui.add(
                        egui::ProgressBar::new(generator.progress / 100.0).text(format!(
                            "問題を生成中... {}%",
                            generator.progress.round()
                        )),
                    );
                }

                let label = if generator.saving {
                    "保存中..."
                } else {
                    "選択した問題を保存"
                };
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(generator.can_save(), egui::Button::new(label))
                        .clicked()
                    {
                        intents.push(Intent::Save);
                    }
                    ui.label(
                        egui::RichText::new(format!("{}件選択中", generator.selected_count()))
                            .color(DIM),
                    );
                });

                if let Some(result) = &generator.save_result {
                    let color = if result.success { GREEN } else { RED };
                    ui.colored_label(color, result.message.as_str());
                }

                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    egui::Grid::new("generated_sentences")
                        .striped(true)
                        .num_columns(6)
                        .show(ui, |ui| {
                            for header in ["選択", "カテゴリ", "代名詞", "レベル", "日本語", "英語"] {
                                ui.label(egui::RichText::new(header).strong());
                            }
                            ui.end_row();

                            for s in &generator.sentences {
                                let mut checked = s.selected;
                                if ui.checkbox(&mut checked, "").changed() {
                                    intents.push(Intent::Apply(PracticeAction::ToggleGenerated(
                                        s.id.clone(),
                                    )));
                                }
                                ui.label(s.contents_type.as_str());
                                ui.label(s.present_type.as_str());
                                ui.label(s.level.to_string());
                                ui.label(s.japanese.as_str());
                                ui.label(s.english.as_str());
                                ui.end_row();
                            }
                        });
                });
            });
    }
}

/// Score, criteria checklist, feedback and improvements.
fn draw_report(ui: &mut egui::Ui, report: &EvaluationReport) {
    let evaluation = match report {
        EvaluationReport::Scored(e) => e,
        EvaluationReport::Failed(message) => {
            ui.colored_label(RED, message.as_str());
            return;
        }
    };

    ui.label(
        egui::RichText::new(format!("{}点", evaluation.score))
            .size(28.0)
            .strong()
            .color(band_color(evaluation.band())),
    );

    ui.horizontal_wrapped(|ui| {
        for (label, ok) in evaluation.criteria() {
            let (mark, color) = if ok { ("✓", GREEN) } else { ("✗", RED) };
            ui.colored_label(color, format!("{mark} {label}"));
        }
    });

    ui.add_space(4.0);
    ui.label(egui::RichText::new("フィードバック").strong());
    ui.label(evaluation.feedback.as_str());

    if !evaluation.improvements.is_empty() {
        ui.add_space(4.0);
        ui.label(egui::RichText::new("改善点").strong());
        for item in &evaluation.improvements {
            ui.label(format!("・{item}"));
        }
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for PracticeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();

        // Results arrive on a channel egui cannot see.
        if self.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        let mut intents = Vec::new();

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_header(ui, &mut intents);
            ui.separator();

            if self.state.loading {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("読み込み中...");
                });
                return;
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                self.draw_filters(ui, &mut intents);
                ui.separator();
                self.draw_error(ui, &mut intents);
                self.draw_question(ui, &mut intents);
                self.draw_result(ui, &mut intents);
            });
        });

        self.draw_generator(ctx, &mut intents);

        for intent in intents {
            self.handle(intent);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("Practice window closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
