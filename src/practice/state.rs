//! Practice screen state and its reducer.
//!
//! [`PracticeState`] is the single source of truth for the window.  It only
//! changes through [`PracticeState::apply`], fed by user input and by
//! orchestrator events.
//!
//! ```text
//! SentencesLoaded ──▶ current = first match of filter
//! Set{Category,Pronoun,Level} ──▶ current = first match of new triple
//! Next ──▶ current = subset[(idx + 1) mod n], answer state cleared
//! EvaluationStarted ──▶ evaluating ──EvaluationFinished──▶ revealed
//! GenerationStarted ──▶ generator.running ──Progress*──▶ GenerationFinished
//! ```

use crate::evaluation::EvaluationReport;
use crate::model::{Category, Filter, GeneratedSentence, Level, Pronoun, Sentence};
use crate::sheets::SaveResult;

/// Shown when the filter selects nothing.
pub const NO_MATCH_MESSAGE: &str = "選択された条件に一致する問題がありません";

// ---------------------------------------------------------------------------
// GeneratorState
// ---------------------------------------------------------------------------

/// State of the generator window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratorState {
    pub open: bool,
    pub running: bool,
    /// 0–100.
    pub progress: f32,
    pub sentences: Vec<GeneratedSentence>,
    pub saving: bool,
    pub save_result: Option<SaveResult>,
}

impl GeneratorState {
    pub fn selected_count(&self) -> usize {
        self.sentences.iter().filter(|s| s.selected).count()
    }

    pub fn can_save(&self) -> bool {
        !self.saving && !self.running
    }
}

// ---------------------------------------------------------------------------
// PracticeAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum PracticeAction {
    SentencesLoaded(Vec<Sentence>),
    FetchFailed(String),
    SetCategory(Category),
    SetPronoun(Pronoun),
    SetLevel(Level),
    Next,
    AnswerEdited(String),
    SpeechStarted,
    SpeechRecognized(String),
    /// Recognition ended without a transcript; carries the message to show.
    SpeechEnded(Option<String>),
    EvaluationStarted,
    EvaluationFinished(EvaluationReport),
    GenerationStarted,
    GenerationProgress {
        percent: f32,
        sentences: Vec<GeneratedSentence>,
    },
    /// `Err` carries the message to show.
    GenerationFinished(Result<Vec<GeneratedSentence>, String>),
    ToggleGenerated(String),
    CloseGenerator,
    SaveStarted,
    SaveFinished(SaveResult),
    DismissError,
}

// ---------------------------------------------------------------------------
// PracticeState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PracticeState {
    /// Everything fetched, in server order.
    pub sentences: Vec<Sentence>,
    pub filter: Filter,
    pub current: Option<Sentence>,
    /// Typed answer.
    pub answer: String,
    /// Last speech transcript.
    pub speech_text: String,
    pub listening: bool,
    pub evaluating: bool,
    pub evaluation: Option<EvaluationReport>,
    /// Whether the reference English is shown.
    pub revealed: bool,
    /// True until the first fetch settles.
    pub loading: bool,
    pub error: Option<String>,
    pub generator: GeneratorState,
}

impl Default for PracticeState {
    fn default() -> Self {
        Self {
            sentences: Vec::new(),
            filter: Filter::default(),
            current: None,
            answer: String::new(),
            speech_text: String::new(),
            listening: false,
            evaluating: false,
            evaluation: None,
            revealed: false,
            loading: true,
            error: None,
            generator: GeneratorState::default(),
        }
    }
}

impl PracticeState {
    /// Sentences matching the active filter.
    pub fn subset(&self) -> Vec<&Sentence> {
        crate::model::filter_sentences(&self.sentences, &self.filter)
    }

    /// The typed answer, or the speech transcript when nothing was typed.
    pub fn effective_answer(&self) -> &str {
        if self.answer.is_empty() {
            &self.speech_text
        } else {
            &self.answer
        }
    }

    pub fn can_submit(&self) -> bool {
        self.current.is_some() && !self.evaluating && !self.effective_answer().trim().is_empty()
    }

    pub fn can_generate(&self) -> bool {
        !self.generator.running
    }

    pub fn can_listen(&self) -> bool {
        !self.listening
    }

    fn clear_answer(&mut self) {
        self.answer.clear();
        self.speech_text.clear();
        self.evaluation = None;
        self.revealed = false;
    }

    /// Point `current` at the first match of the active filter.
    fn select_first(&mut self) -> bool {
        let first = self.subset().first().map(|s| (*s).clone());
        match first {
            Some(first) => {
                self.current = Some(first);
                self.error = None;
                true
            }
            None => false,
        }
    }

    fn change_filter(&mut self, filter: Filter) {
        self.filter = filter;
        if self.select_first() {
            self.clear_answer();
        } else {
            self.error = Some(NO_MATCH_MESSAGE.into());
        }
    }

    fn next(&mut self) {
        let subset = self.subset();
        if subset.is_empty() {
            self.error = Some(NO_MATCH_MESSAGE.into());
            return;
        }

        let index = self
            .current
            .as_ref()
            .and_then(|c| subset.iter().position(|s| s.id == c.id));
        let next = match index {
            Some(i) => (i + 1) % subset.len(),
            None => 0,
        };

        self.current = Some(subset[next].clone());
        self.error = None;
        self.clear_answer();
    }

    /// Apply one action.
    pub fn apply(&mut self, action: PracticeAction) {
        match action {
            PracticeAction::SentencesLoaded(sentences) => {
                self.sentences = sentences;
                self.loading = false;
                self.select_first();
            }
            PracticeAction::FetchFailed(message) => {
                self.loading = false;
                self.error = Some(message);
            }
            PracticeAction::SetCategory(category) => {
                self.change_filter(Filter { category, ..self.filter })
            }
            PracticeAction::SetPronoun(pronoun) => {
                self.change_filter(Filter { pronoun, ..self.filter })
            }
            PracticeAction::SetLevel(level) => self.change_filter(Filter { level, ..self.filter }),
            PracticeAction::Next => self.next(),
            PracticeAction::AnswerEdited(text) => self.answer = text,
            PracticeAction::SpeechStarted => self.listening = true,
            PracticeAction::SpeechRecognized(text) => {
                self.listening = false;
                self.speech_text = text;
            }
            PracticeAction::SpeechEnded(message) => {
                self.listening = false;
                if message.is_some() {
                    self.error = message;
                }
            }
            PracticeAction::EvaluationStarted => {
                self.evaluating = true;
            }
            PracticeAction::EvaluationFinished(report) => {
                self.evaluating = false;
                self.evaluation = Some(report);
                self.revealed = true;
            }
            PracticeAction::GenerationStarted => {
                self.generator = GeneratorState {
                    open: true,
                    running: true,
                    ..GeneratorState::default()
                };
                self.error = None;
            }
            PracticeAction::GenerationProgress { percent, sentences } => {
                if self.generator.open {
                    self.generator.progress = percent;
                    self.generator.sentences = sentences;
                }
            }
            PracticeAction::GenerationFinished(result) => {
                self.generator.running = false;
                self.generator.progress = 100.0;
                match result {
                    Ok(sentences) if self.generator.open => self.generator.sentences = sentences,
                    Ok(_) => {}
                    Err(message) => self.error = Some(message),
                }
            }
            PracticeAction::ToggleGenerated(id) => {
                if let Some(s) = self.generator.sentences.iter_mut().find(|s| s.id == id) {
                    s.selected = !s.selected;
                }
            }
            PracticeAction::CloseGenerator => {
                // A running generation keeps going; its output is discarded.
                self.generator.open = false;
                self.generator.sentences.clear();
                self.generator.save_result = None;
            }
            PracticeAction::SaveStarted => {
                self.generator.saving = true;
                self.generator.save_result = None;
            }
            PracticeAction::SaveFinished(result) => {
                self.generator.saving = false;
                self.generator.save_result = Some(result);
            }
            PracticeAction::DismissError => self.error = None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SentenceId;

    fn sentence(id: i64, category: Category, pronoun: Pronoun, level: u8) -> Sentence {
        Sentence {
            id: SentenceId::Number(id),
            japanese: format!("問題{id}"),
            english: format!("Sentence number {id}."),
            level: Level::Numeric(level),
            present_type: pronoun,
            contents_type: category,
        }
    }

    /// Five (Hobby, HE/SHE, 1) sentences interleaved with others.
    fn library() -> Vec<Sentence> {
        let mut v = Vec::new();
        for i in 0..5 {
            v.push(sentence(100 + i, Category::Hobby, Pronoun::HeShe, 1));
            v.push(sentence(200 + i, Category::Life, Pronoun::HeShe, 1));
            v.push(sentence(300 + i, Category::Hobby, Pronoun::We, 2));
        }
        v
    }

    fn loaded() -> PracticeState {
        let mut state = PracticeState::default();
        state.apply(PracticeAction::SentencesLoaded(library()));
        state
    }

    fn current_id(state: &PracticeState) -> Option<SentenceId> {
        state.current.as_ref().map(|s| s.id.clone())
    }

    #[test]
    fn load_selects_first_match_of_default_filter() {
        let state = loaded();
        assert!(!state.loading);
        assert_eq!(current_id(&state), Some(SentenceId::Number(200)));
    }

    #[test]
    fn hobby_he_she_level_one_cycles_back_after_five_nexts() {
        let mut state = loaded();
        state.apply(PracticeAction::SetCategory(Category::Hobby));
        assert_eq!(current_id(&state), Some(SentenceId::Number(100)));
        assert_eq!(state.subset().len(), 5);

        let mut seen = Vec::new();
        for _ in 0..5 {
            state.apply(PracticeAction::Next);
            seen.push(current_id(&state).unwrap());
        }
        assert_eq!(
            seen,
            [101, 102, 103, 104, 100].map(SentenceId::Number).to_vec()
        );
        assert!(state
            .current
            .as_ref()
            .is_some_and(|s| s.matches(&state.filter)));
    }

    #[test]
    fn empty_subset_reports_error_and_keeps_current() {
        let mut state = loaded();
        let before = current_id(&state);

        state.apply(PracticeAction::SetPronoun(Pronoun::They));
        assert_eq!(state.error.as_deref(), Some(NO_MATCH_MESSAGE));
        assert_eq!(current_id(&state), before);
        assert_eq!(state.filter.pronoun, Pronoun::They);

        state.apply(PracticeAction::Next);
        assert_eq!(state.error.as_deref(), Some(NO_MATCH_MESSAGE));
        assert_eq!(current_id(&state), before);
    }

    #[test]
    fn filter_change_uses_new_triple_immediately() {
        let mut state = loaded();
        state.apply(PracticeAction::SetCategory(Category::Hobby));
        state.apply(PracticeAction::SetPronoun(Pronoun::We));
        // (Hobby, WE, 1) is empty; then level 2 matches.
        assert_eq!(state.error.as_deref(), Some(NO_MATCH_MESSAGE));
        state.apply(PracticeAction::SetLevel(Level::Numeric(2)));
        assert_eq!(state.error, None);
        assert_eq!(current_id(&state), Some(SentenceId::Number(300)));
    }

    #[test]
    fn next_from_outside_subset_starts_at_first_match() {
        let mut state = loaded();
        state.current = Some(sentence(999, Category::School, Pronoun::I, 3));
        state.apply(PracticeAction::Next);
        assert_eq!(current_id(&state), Some(SentenceId::Number(200)));
    }

    #[test]
    fn next_clears_answer_state() {
        let mut state = loaded();
        state.apply(PracticeAction::AnswerEdited("he run".into()));
        state.apply(PracticeAction::SpeechRecognized("he runs".into()));
        state.apply(PracticeAction::EvaluationStarted);
        state.apply(PracticeAction::EvaluationFinished(EvaluationReport::Failed(
            "x".into(),
        )));
        assert!(state.revealed);

        state.apply(PracticeAction::Next);
        assert!(state.answer.is_empty());
        assert!(state.speech_text.is_empty());
        assert!(state.evaluation.is_none());
        assert!(!state.revealed);
    }

    #[test]
    fn effective_answer_prefers_typed_text() {
        let mut state = loaded();
        state.apply(PracticeAction::SpeechRecognized("spoken answer".into()));
        assert_eq!(state.effective_answer(), "spoken answer");
        assert!(state.can_submit());

        state.apply(PracticeAction::AnswerEdited("typed answer".into()));
        assert_eq!(state.effective_answer(), "typed answer");
    }

    #[test]
    fn submit_gating() {
        let mut state = PracticeState::default();
        state.apply(PracticeAction::AnswerEdited("He runs.".into()));
        assert!(!state.can_submit(), "no current sentence");

        let mut state = loaded();
        state.apply(PracticeAction::AnswerEdited("   ".into()));
        assert!(!state.can_submit(), "blank answer");

        state.apply(PracticeAction::AnswerEdited("He runs.".into()));
        assert!(state.can_submit());
        state.apply(PracticeAction::EvaluationStarted);
        assert!(!state.can_submit(), "evaluation in flight");
    }

    #[test]
    fn speech_lifecycle() {
        let mut state = loaded();
        state.apply(PracticeAction::SpeechStarted);
        assert!(!state.can_listen());
        state.apply(PracticeAction::SpeechEnded(Some("音声認識中にエラーが発生しました。".into())));
        assert!(state.can_listen());
        assert!(state.error.is_some());
    }

    #[test]
    fn generation_flow() {
        let mut state = loaded();
        let gen = |id: &str| GeneratedSentence {
            id: id.into(),
            japanese: "私は泳ぎます。".into(),
            english: "I swim often.".into(),
            level: Level::Numeric(1),
            present_type: Pronoun::I,
            contents_type: Category::Hobby,
            selected: true,
        };

        state.apply(PracticeAction::GenerationStarted);
        assert!(state.generator.open && state.generator.running);
        assert!(!state.can_generate());
        assert!(!state.generator.can_save());

        state.apply(PracticeAction::GenerationProgress {
            percent: 50.0,
            sentences: vec![gen("gen_1")],
        });
        state.apply(PracticeAction::GenerationFinished(Ok(vec![gen("gen_1"), gen("gen_2")])));
        assert!(state.can_generate());
        assert_eq!(state.generator.progress, 100.0);
        assert_eq!(state.generator.selected_count(), 2);

        state.apply(PracticeAction::ToggleGenerated("gen_2".into()));
        assert_eq!(state.generator.selected_count(), 1);

        state.apply(PracticeAction::SaveStarted);
        assert!(!state.generator.can_save());
        state.apply(PracticeAction::SaveFinished(SaveResult {
            success: true,
            message: "1件の問題を送信しました。".into(),
        }));
        assert!(state.generator.can_save());

        state.apply(PracticeAction::CloseGenerator);
        assert!(!state.generator.open);
        assert!(state.generator.save_result.is_none());
    }

    fn generated(id: &str) -> GeneratedSentence {
        GeneratedSentence {
            id: id.into(),
            japanese: "彼らは本を読みます。".into(),
            english: "They read books.".into(),
            level: Level::Numeric(2),
            present_type: Pronoun::They,
            contents_type: Category::School,
            selected: true,
        }
    }

    #[test]
    fn closing_generator_discards_sentences_and_later_snapshots() {
        let mut state = loaded();
        state.apply(PracticeAction::GenerationStarted);
        state.apply(PracticeAction::GenerationProgress {
            percent: 50.0,
            sentences: vec![generated("gen_1")],
        });

        state.apply(PracticeAction::CloseGenerator);
        assert!(state.generator.sentences.is_empty());

        // The run keeps reporting after the window closed.
        state.apply(PracticeAction::GenerationProgress {
            percent: 100.0,
            sentences: vec![generated("gen_1"), generated("gen_2")],
        });
        assert!(state.generator.sentences.is_empty());

        state.apply(PracticeAction::GenerationFinished(Ok(vec![generated("gen_1"), generated("gen_2")])));
        assert!(!state.generator.running);
        assert!(state.generator.sentences.is_empty());
        assert!(state.can_generate());

        // A new run starts from an empty table.
        state.apply(PracticeAction::GenerationStarted);
        assert!(state.generator.open && state.generator.sentences.is_empty());
    }

    #[test]
    fn failed_generation_surfaces_message() {
        let mut state = loaded();
        state.apply(PracticeAction::GenerationStarted);
        state.apply(PracticeAction::GenerationFinished(Err("失敗".into())));
        assert!(!state.generator.running);
        assert_eq!(state.error.as_deref(), Some("失敗"));
    }

    #[test]
    fn fetch_failure_stops_loading() {
        let mut state = PracticeState::default();
        state.apply(PracticeAction::FetchFailed("データの取得に失敗しました".into()));
        assert!(!state.loading);
        assert!(state.current.is_none());
        assert_eq!(state.error.as_deref(), Some("データの取得に失敗しました"));
    }
}
