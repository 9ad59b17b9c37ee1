//! Answer evaluation through the language model.
//!
//! [`Evaluator::evaluate`] sends one grading prompt, pulls the JSON object
//! out of the reply and turns every failure into a user-facing message.
//! There is no retry here; the learner simply submits again.

pub mod extract;
pub mod report;

use std::sync::Arc;

use crate::llm::{evaluation_prompt, GenerationParams, LanguageModel};

pub use extract::extract_json_object;
pub use report::{Evaluation, EvaluationReport, ScoreBand};

/// Shown when the reply holds no usable JSON object.
pub const PARSE_FAILED_MESSAGE: &str = "評価結果の解析に失敗しました。もう一度お試しください。";
/// Shown when the service call itself failed.
pub const SERVICE_FAILED_MESSAGE: &str = "評価中にエラーが発生しました。もう一度お試しください。";

/// Parse a raw model reply into a report.
pub fn parse_evaluation(raw: &str) -> EvaluationReport {
    let Some(json) = extract_json_object(raw) else {
        log::warn!("evaluation: no JSON object in reply ({} chars)", raw.len());
        return EvaluationReport::Failed(PARSE_FAILED_MESSAGE.into());
    };

    match serde_json::from_str::<Evaluation>(json) {
        Ok(evaluation) => EvaluationReport::Scored(evaluation),
        Err(e) => {
            log::warn!("evaluation: invalid JSON: {e}");
            EvaluationReport::Failed(PARSE_FAILED_MESSAGE.into())
        }
    }
}

/// Grades answers against reference sentences.
#[derive(Clone)]
pub struct Evaluator {
    model: Arc<dyn LanguageModel>,
}

impl Evaluator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn evaluate(&self, reference: &str, answer: &str) -> EvaluationReport {
        let prompt = evaluation_prompt(reference, answer);

        match self.model.generate(&prompt, &GenerationParams::EVALUATION).await {
            Ok(raw) => {
                let report = parse_evaluation(&raw);
                if let EvaluationReport::Scored(e) = &report {
                    log::info!("evaluation: score {}", e.score);
                }
                report
            }
            Err(e) => {
                log::error!("evaluation: service call failed: {e}");
                EvaluationReport::Failed(SERVICE_FAILED_MESSAGE.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records the prompt and answers with a canned reply.
    struct CannedModel {
        reply: Result<String, LlmError>,
        prompt: Mutex<Option<String>>,
        params: Mutex<Option<GenerationParams>>,
    }

    impl CannedModel {
        fn new(reply: Result<String, LlmError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                prompt: Mutex::new(None),
                params: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn generate(
            &self,
            prompt: &str,
            params: &GenerationParams,
        ) -> Result<String, LlmError> {
            *self.prompt.lock().unwrap() = Some(prompt.to_string());
            *self.params.lock().unwrap() = Some(*params);
            self.reply.clone()
        }
    }

    const REPLY_60: &str = r#"Sure, here is my evaluation:
{
  "score": 60,
  "grammarCorrect": false,
  "wordOrderCorrect": true,
  "pronounCorrect": true,
  "verbCorrect": false,
  "feedback": "三人称単数の動詞と時を表す語句が抜けています。",
  "improvements": ["'drink'を'drinks'にしてください", "'every morning'を加えてください"]
}
Let me know if you need anything else."#;

    #[tokio::test]
    async fn he_drink_coffee_scenario() {
        let model = CannedModel::new(Ok(REPLY_60.into()));
        let evaluator = Evaluator::new(model.clone());

        let report = evaluator
            .evaluate("He drinks coffee every morning.", "he drink coffee")
            .await;

        let prompt = model.prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("He drinks coffee every morning."));
        assert!(prompt.contains("he drink coffee"));
        assert_eq!(
            *model.params.lock().unwrap(),
            Some(GenerationParams::EVALUATION)
        );

        let e = report.evaluation().unwrap();
        assert_eq!(e.score, 60);
        assert_eq!(e.band(), ScoreBand::Red);
        assert!(!e.verb_correct);
        assert_eq!(e.improvements.len(), 2);
    }

    #[tokio::test]
    async fn reply_without_json_is_parse_failure() {
        let model = CannedModel::new(Ok("I think the answer is mostly right.".into()));
        let report = Evaluator::new(model).evaluate("A.", "B").await;
        assert_eq!(report, EvaluationReport::Failed(PARSE_FAILED_MESSAGE.into()));
    }

    #[tokio::test]
    async fn json_missing_score_is_parse_failure() {
        let model = CannedModel::new(Ok(r#"{"feedback": "good"}"#.into()));
        let report = Evaluator::new(model).evaluate("A.", "B").await;
        assert_eq!(report, EvaluationReport::Failed(PARSE_FAILED_MESSAGE.into()));
    }

    #[tokio::test]
    async fn service_failure_has_its_own_message() {
        let model = CannedModel::new(Err(LlmError::Timeout));
        let report = Evaluator::new(model).evaluate("A.", "B").await;
        assert_eq!(report, EvaluationReport::Failed(SERVICE_FAILED_MESSAGE.into()));
    }

    #[test]
    fn parse_accepts_fenced_json() {
        let raw = "```json\n{\"score\": 92, \"grammarCorrect\": true, \"wordOrderCorrect\": true, \"pronounCorrect\": true, \"verbCorrect\": true, \"feedback\": \"よくできました。\", \"improvements\": []}\n```";
        let report = parse_evaluation(raw);
        assert_eq!(report.evaluation().map(|e| e.band()), Some(ScoreBand::Green));
    }
}
