//! Evaluation result types and their presentation.

use std::fmt::Write as _;

use serde::{Deserialize, Deserializer, Serialize};

/// The model's grading of one answer (camelCase on the wire).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    /// 0–100.  Fractional or out-of-range values are rounded and clamped.
    #[serde(deserialize_with = "score_from_number")]
    pub score: u8,
    #[serde(default)]
    pub grammar_correct: bool,
    #[serde(default)]
    pub word_order_correct: bool,
    #[serde(default)]
    pub pronoun_correct: bool,
    #[serde(default)]
    pub verb_correct: bool,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub improvements: Vec<String>,
}

/// Scores arrive as numbers, occasionally as numeric text (`"85"`).
#[derive(Deserialize)]
#[serde(untagged)]
enum ScoreRepr {
    Number(f64),
    Text(String),
}

fn score_from_number<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    let raw = match ScoreRepr::deserialize(d)? {
        ScoreRepr::Number(n) => n,
        ScoreRepr::Text(text) => text
            .trim()
            .trim_end_matches('点')
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| serde::de::Error::custom(format!("non-numeric score: {text:?}")))?,
    };
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}

impl Evaluation {
    /// Criteria in display order: pronoun, verb, word order, grammar.
    pub fn criteria(&self) -> [(&'static str, bool); 4] {
        [
            ("代名詞", self.pronoun_correct),
            ("動詞", self.verb_correct),
            ("語順", self.word_order_correct),
            ("文法", self.grammar_correct),
        ]
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::for_score(self.score)
    }

    /// Plain-text rendering with the same sections as the window.
    pub fn render_plain(&self) -> String {
        let mut out = format!("{}点\n", self.score);
        for (label, ok) in self.criteria() {
            let _ = writeln!(out, "{} {label}", if ok { "✓" } else { "✗" });
        }
        let _ = write!(out, "\nフィードバック\n{}\n", self.feedback);
        if !self.improvements.is_empty() {
            out.push_str("\n改善点\n");
            for item in &self.improvements {
                let _ = writeln!(out, "・{item}");
            }
        }
        out
    }
}

/// Colour band of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    /// Below 70.
    Red,
    /// 70 to 89.
    Yellow,
    /// 90 and above.
    Green,
}

impl ScoreBand {
    pub fn for_score(score: u8) -> Self {
        match score {
            90.. => ScoreBand::Green,
            70..=89 => ScoreBand::Yellow,
            _ => ScoreBand::Red,
        }
    }
}

/// What the evaluator hands back to the UI.  Failures carry the message to
/// show in place of a score.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationReport {
    Scored(Evaluation),
    Failed(String),
}

impl EvaluationReport {
    pub fn evaluation(&self) -> Option<&Evaluation> {
        match self {
            EvaluationReport::Scored(e) => Some(e),
            EvaluationReport::Failed(_) => None,
        }
    }

    pub fn render_plain(&self) -> String {
        match self {
            EvaluationReport::Scored(e) => e.render_plain(),
            EvaluationReport::Failed(message) => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(score: u8, improvements: Vec<String>) -> Evaluation {
        Evaluation {
            score,
            grammar_correct: false,
            word_order_correct: true,
            pronoun_correct: true,
            verb_correct: false,
            feedback: "動詞の形に注意しましょう。".into(),
            improvements,
        }
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(ScoreBand::for_score(0), ScoreBand::Red);
        assert_eq!(ScoreBand::for_score(69), ScoreBand::Red);
        assert_eq!(ScoreBand::for_score(70), ScoreBand::Yellow);
        assert_eq!(ScoreBand::for_score(89), ScoreBand::Yellow);
        assert_eq!(ScoreBand::for_score(90), ScoreBand::Green);
        assert_eq!(ScoreBand::for_score(100), ScoreBand::Green);
    }

    #[test]
    fn deserialises_camel_case_and_clamps_score() {
        let json = r#"{"score": 104.6, "grammarCorrect": true, "wordOrderCorrect": true,
            "pronounCorrect": true, "verbCorrect": true, "feedback": "完璧です。"}"#;
        let e: Evaluation = serde_json::from_str(json).unwrap();
        assert_eq!(e.score, 100);
        assert!(e.grammar_correct && e.word_order_correct);
        assert!(e.improvements.is_empty());
    }

    #[test]
    fn numeric_text_score_is_accepted() {
        let e: Evaluation = serde_json::from_str(r#"{"score": "85", "feedback": "良いです。"}"#).unwrap();
        assert_eq!(e.score, 85);
        assert_eq!(e.band(), ScoreBand::Yellow);

        let e: Evaluation = serde_json::from_str(r#"{"score": " 72.6点 "}"#).unwrap();
        assert_eq!(e.score, 73);

        assert!(serde_json::from_str::<Evaluation>(r#"{"score": "high"}"#).is_err());
    }

    #[test]
    fn plain_rendering_orders_criteria() {
        let text = sample(60, vec!["'drinks'を使いましょう".into()]).render_plain();
        let pronoun = text.find("✓ 代名詞").unwrap();
        let verb = text.find("✗ 動詞").unwrap();
        let order = text.find("✓ 語順").unwrap();
        let grammar = text.find("✗ 文法").unwrap();
        assert!(text.starts_with("60点"));
        assert!(pronoun < verb && verb < order && order < grammar);
        assert!(text.contains("改善点\n・'drinks'を使いましょう"));
    }

    #[test]
    fn improvements_section_omitted_when_empty() {
        let text = sample(95, Vec::new()).render_plain();
        assert!(text.contains("フィードバック"));
        assert!(!text.contains("改善点"));
    }
}
