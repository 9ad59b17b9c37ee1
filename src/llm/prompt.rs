//! Prompt builders for sentence generation and answer evaluation.
//!
//! Both prompts are written for a general-purpose model and ask for a rigid
//! output shape: two prefixed lines for generation, a bare JSON object for
//! evaluation.

use crate::model::{Category, Combination, Level};

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Line prefix carrying the Japanese sentence.
pub const JAPANESE_PREFIX: &str = "日本語:";
/// Line prefix carrying the English sentence.
pub const ENGLISH_PREFIX: &str = "英語:";

/// Scene phrase for a category.
fn scene(category: Category) -> &'static str {
    match category {
        Category::Life => "日常生活での",
        Category::Business => "ビジネスでの",
        Category::School => "学校での",
        Category::Hobby => "趣味に関する",
    }
}

/// Complexity phrase for a level key; unknown keys get no phrase.
fn complexity(level: &Level) -> &'static str {
    match level.prompt_key().as_str() {
        "1" => "簡単な",
        "2" => "やや複雑な",
        "3" => "複雑な",
        "business 1" => "ビジネスの基本的な",
        "business 2" => "ビジネスの複雑な",
        _ => "",
    }
}

/// Build the single-sentence generation prompt for one combination.
pub fn sentence_prompt(combination: &Combination) -> String {
    format!(
        "Create a simple present tense sentence pair in Japanese and English.
Subject: \"{subject}\"
Context: {scene}{complexity}

Required format:
{JAPANESE_PREFIX} [Japanese sentence]
{ENGLISH_PREFIX} [English sentence]

Guidelines:
1. Simple present tense only
2. Start with the given subject
3. Natural and correct grammar
4. Match the specified context
5. Length (words):
   - Level 1: 4-7
   - Level 2: 6-9
   - Level 3: 7-11
   - Business: 5-15

Example:
{JAPANESE_PREFIX} 彼は毎朝コーヒーを飲みます。
{ENGLISH_PREFIX} He drinks coffee every morning.",
        subject = combination.present_type.subject(),
        scene = scene(combination.category),
        complexity = complexity(&combination.level),
    )
}

/// Trim `prompt` and cut it to at most `max_chars` characters.
pub fn truncate_prompt(prompt: &str, max_chars: usize) -> String {
    prompt.trim().chars().take(max_chars).collect()
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Build the grading prompt.  Both sentences are embedded verbatim.
pub fn evaluation_prompt(reference: &str, answer: &str) -> String {
    format!(
        r#"
あなたは英語教師として生徒の回答を評価します。

正解: "{reference}"
生徒の回答: "{answer}"

以下の構造でJSONレスポンスを提供してください：
{{
  "score": (0-100の数値),
  "grammarCorrect": (真偽値),
  "wordOrderCorrect": (真偽値),
  "pronounCorrect": (真偽値),
  "verbCorrect": (真偽値),
  "feedback": (日本語でのフィードバック),
  "improvements": (日本語での改善点の配列)
}}

採点基準:
- 完全一致: 100点
- 代名詞の誤り: -30点
- 動詞の誤り: -20点
- 語順の誤り: -20点
- その他の文法ミス: -10点
- スペルミス: 1つにつき-5点

重要なルール:
1. 代名詞の違い（he/she/it/they）は重大なミスとして扱う
2. 大文字小文字の違いは無視する
3. 句読点の違いは無視する
4. 動詞の時制は厳密にチェックする
5. 語順は重要

レスポンス例:
{{
  "score": 70,
  "grammarCorrect": true,
  "wordOrderCorrect": true,
  "pronounCorrect": false,
  "verbCorrect": true,
  "feedback": "全体的によく書けていますが、代名詞の使い方に誤りがあります。",
  "improvements": ["'she'の代わりに'he'を使用してください"]
}}

JSONレスポンスのみを提供し、追加のテキストは含めないでください。"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pronoun;

    fn combo(category: Category, present_type: Pronoun, level: Level) -> Combination {
        Combination {
            category,
            present_type,
            level,
        }
    }

    #[test]
    fn sentence_prompt_names_subject_and_context() {
        let p = sentence_prompt(&combo(Category::Hobby, Pronoun::HeShe, Level::Numeric(2)));
        assert!(p.contains("Subject: \"he\""));
        assert!(p.contains("Context: 趣味に関するやや複雑な"));
        assert!(p.contains("日本語: [Japanese sentence]"));
        assert!(p.contains("英語: [English sentence]"));
    }

    #[test]
    fn business_tier_uses_business_complexity() {
        let p = sentence_prompt(&combo(Category::Business, Pronoun::We, Level::Business(1)));
        assert!(p.contains("Context: ビジネスでのビジネスの基本的な"));
        assert!(p.contains("Subject: \"we\""));
    }

    #[test]
    fn sentence_prompt_fits_default_budget() {
        for c in crate::model::all_combinations() {
            let p = sentence_prompt(&c);
            assert!(p.chars().count() <= 1_000, "prompt too long for {c:?}");
        }
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_prompt("  日本語テキスト  ", 3), "日本語");
        assert_eq!(truncate_prompt("short", 100), "short");
    }

    #[test]
    fn evaluation_prompt_embeds_both_sentences_verbatim() {
        let p = evaluation_prompt("He drinks coffee every morning.", "he drink coffee");
        assert!(p.contains("正解: \"He drinks coffee every morning.\""));
        assert!(p.contains("生徒の回答: \"he drink coffee\""));
        assert!(p.contains("\"improvements\""));
    }
}
