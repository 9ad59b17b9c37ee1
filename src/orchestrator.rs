//! Background worker connecting the window to the network and speech
//! services.
//!
//! ```text
//! PracticeApp ──Command (mpsc)──▶ Orchestrator::run()   ← tokio task
//!                                   ├─ Fetch      → SheetsClient::fetch_sentences
//!                                   ├─ Evaluate   → Evaluator::evaluate
//!                                   ├─ Generate   → GenerationPipeline::run
//!                                   ├─ Save       → SheetsClient::save
//!                                   └─ StartSpeech→ SpeechSession::start
//! PracticeApp ◀──PracticeAction (unbounded mpsc)── spawned tasks
//! ```
//!
//! Every command runs in its own task so a slow generation never blocks an
//! evaluation.  The UI applies the matching `*Started` action itself before
//! sending a command; the orchestrator only reports outcomes.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::evaluation::Evaluator;
use crate::generation::{GenerationEvent, GenerationPipeline};
use crate::model::{all_combinations, Combination, GeneratedSentence};
use crate::practice::PracticeAction;
use crate::sheets::{SheetsClient, FETCH_FAILED_MESSAGE};
use crate::speech::{SpeechError, SpeechSession};

/// Requests from the window.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Load the practice list.
    Fetch,
    /// Grade `answer` against `reference`.
    Evaluate { reference: String, answer: String },
    /// Generate sentences for the full combination grid.
    Generate,
    /// Save the selected rows.
    Save(Vec<GeneratedSentence>),
    /// Record and recognise one spoken answer.
    StartSpeech,
}

/// Sender half the orchestrator reports on.
pub type EventSender = mpsc::UnboundedSender<PracticeAction>;

fn emit(tx: &EventSender, action: PracticeAction) {
    // The window closed; nothing left to update.
    if tx.send(action).is_err() {
        log::debug!("orchestrator: event receiver dropped");
    }
}

/// Owns the service clients.  Create with [`Orchestrator::new`], then spawn
/// [`run`](Self::run).
pub struct Orchestrator {
    sheets: SheetsClient,
    evaluator: Evaluator,
    generator: Arc<GenerationPipeline>,
    speech: SpeechSession,
    combinations: Arc<Vec<Combination>>,
}

impl Orchestrator {
    pub fn new(
        sheets: SheetsClient,
        evaluator: Evaluator,
        generator: GenerationPipeline,
        speech: SpeechSession,
    ) -> Self {
        Self {
            sheets,
            evaluator,
            generator: Arc::new(generator),
            speech,
            combinations: Arc::new(all_combinations()),
        }
    }

    /// Replace the generation grid (defaults to all 60 combinations).
    pub fn with_combinations(mut self, combinations: Vec<Combination>) -> Self {
        self.combinations = Arc::new(combinations);
        self
    }

    /// Process commands until `command_rx` closes, then wait for in-flight
    /// work to finish.
    pub async fn run(self, mut command_rx: mpsc::Receiver<Command>, events: EventSender) {
        let mut tasks = JoinSet::new();

        while let Some(command) = command_rx.recv().await {
            log::debug!("orchestrator: {command:?}");
            match command {
                Command::Fetch => {
                    let sheets = self.sheets.clone();
                    let tx = events.clone();
                    tasks.spawn(async move {
                        let action = match sheets.fetch_sentences().await {
                            Ok(sentences) => PracticeAction::SentencesLoaded(sentences),
                            Err(e) => {
                                log::error!("orchestrator: fetch failed: {e}");
                                PracticeAction::FetchFailed(FETCH_FAILED_MESSAGE.into())
                            }
                        };
                        emit(&tx, action);
                    });
                }

                Command::Evaluate { reference, answer } => {
                    let evaluator = self.evaluator.clone();
                    let tx = events.clone();
                    tasks.spawn(async move {
                        let report = evaluator.evaluate(&reference, &answer).await;
                        emit(&tx, PracticeAction::EvaluationFinished(report));
                    });
                }

                Command::Generate => {
                    let generator = Arc::clone(&self.generator);
                    let combinations = Arc::clone(&self.combinations);
                    let tx = events.clone();
                    tasks.spawn(async move {
                        let progress_tx = tx.clone();
                        let result = generator
                            .run(&combinations, move |event| match event {
                                GenerationEvent::Progress { percent, sentences } => emit(
                                    &progress_tx,
                                    PracticeAction::GenerationProgress { percent, sentences },
                                ),
                            })
                            .await;
                        emit(
                            &tx,
                            PracticeAction::GenerationFinished(result.map_err(|e| e.to_string())),
                        );
                    });
                }

                Command::Save(sentences) => {
                    let sheets = self.sheets.clone();
                    let tx = events.clone();
                    tasks.spawn(async move {
                        let outcome = sheets.save(&sentences).await;
                        emit(&tx, PracticeAction::SaveFinished(outcome.into()));
                    });
                }

                Command::StartSpeech => {
                    let ok_tx = events.clone();
                    let err_tx = events.clone();
                    let handle = self.speech.start(
                        move |text| emit(&ok_tx, PracticeAction::SpeechRecognized(text)),
                        move |e| match e {
                            // The running session will report for itself.
                            SpeechError::Busy => {}
                            e => emit(
                                &err_tx,
                                PracticeAction::SpeechEnded(Some(e.user_message().into())),
                            ),
                        },
                    );
                    if let Some(handle) = handle {
                        tasks.spawn(async move {
                            if let Err(e) = handle.await {
                                log::error!("orchestrator: speech task failed: {e}");
                            }
                        });
                    }
                }
            }
        }

        log::info!("orchestrator: command channel closed, draining tasks");
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                log::error!("orchestrator: task failed: {e}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
