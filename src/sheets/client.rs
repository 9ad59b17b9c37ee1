//! Fetching practice sentences and saving generated ones.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::SheetsConfig;
use crate::model::{GeneratedSentence, Sentence};

use super::transport::{RawResponse, SheetTransport, SheetsError};

/// Shown when the sentence list could not be fetched.
pub const FETCH_FAILED_MESSAGE: &str = "データの取得に失敗しました";

const NO_SELECTION_MESSAGE: &str = "保存する問題を選択してください。";
const NOT_FOUND_MESSAGE: &str = "APIエンドポイントが見つかりません。URLを確認してください。";
const FORBIDDEN_MESSAGE: &str = "APIへのアクセスが拒否されました。権限を確認してください。";
const RATE_LIMITED_MESSAGE: &str =
    "リクエストの制限に達しました。しばらく待ってから再度お試しください。";
const UNPARSABLE_MESSAGE: &str = "サーバーからの応答を解析できませんでした。";
const EMPTY_BODY_MESSAGE: &str = "サーバーから空の応答が返されました。";
const REJECTED_MESSAGE: &str = "問題の登録に失敗しました。";
const NETWORK_MESSAGE: &str =
    "ネットワークエラーが発生しました。インターネット接続を確認してください。";

// ---------------------------------------------------------------------------
// Save outcome
// ---------------------------------------------------------------------------

/// Result of a save as far as the client can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The server confirmed the rows.
    Confirmed { count: usize },
    /// The request was delivered but the reply was not inspected.
    Indeterminate { count: usize },
    /// Anything else, with the message to show.
    Failed(String),
}

/// The UI-facing view of a [`SaveOutcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveResult {
    pub success: bool,
    pub message: String,
}

impl From<SaveOutcome> for SaveResult {
    fn from(outcome: SaveOutcome) -> Self {
        match outcome {
            SaveOutcome::Confirmed { count } => SaveResult {
                success: true,
                message: format!("{count}件の問題を登録しました。"),
            },
            // Delivered-but-unknown counts as success.
            SaveOutcome::Indeterminate { count } => SaveResult {
                success: true,
                message: format!("{count}件の問題を送信しました。"),
            },
            SaveOutcome::Failed(message) => SaveResult {
                success: false,
                message,
            },
        }
    }
}

/// Text of a reply's `message` field; numbers and booleans are shown as
/// written, blank or structured values are ignored.
fn reply_message(value: &Value) -> Option<String> {
    match value.get("message")? {
        Value::String(m) if !m.trim().is_empty() => Some(m.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Classify the reply to a save request carrying `count` rows.
pub fn classify_save_response(response: RawResponse, count: usize) -> SaveOutcome {
    let (status, body) = match response {
        RawResponse::Opaque => return SaveOutcome::Indeterminate { count },
        RawResponse::Http { status, body } => (status, body),
    };

    match status {
        200..=299 => {}
        404 => return SaveOutcome::Failed(NOT_FOUND_MESSAGE.into()),
        403 => return SaveOutcome::Failed(FORBIDDEN_MESSAGE.into()),
        429 => return SaveOutcome::Failed(RATE_LIMITED_MESSAGE.into()),
        other => {
            return SaveOutcome::Failed(format!("サーバーエラーが発生しました。ステータス: {other}"))
        }
    }

    let value: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("sheets: unparsable save reply: {e}");
            return SaveOutcome::Failed(UNPARSABLE_MESSAGE.into());
        }
    };
    if value.is_null() {
        return SaveOutcome::Failed(EMPTY_BODY_MESSAGE.into());
    }

    if value.get("status").and_then(Value::as_str) == Some("success") {
        return SaveOutcome::Confirmed { count };
    }

    log::warn!("sheets: save rejected: {value}");
    SaveOutcome::Failed(reply_message(&value).unwrap_or_else(|| REJECTED_MESSAGE.into()))
}

/// Request body for a save: only the wire fields, levels as text.
pub fn save_payload(rows: &[&GeneratedSentence]) -> Value {
    let data: Vec<Value> = rows
        .iter()
        .map(|s| {
            json!({
                "english": s.english,
                "japanese": s.japanese,
                "level": s.level.as_text(),
                "present_type": s.present_type,
                "contents_type": s.contents_type,
            })
        })
        .collect();
    json!({ "data": data })
}

/// Sentences from a fetch reply.  Anything but `{status: "success", data:
/// [...]}` yields an empty list; rows that fail to deserialise are dropped.
pub fn parse_fetch_body(body: &str) -> Result<Vec<Sentence>, SheetsError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| SheetsError::Parse(e.to_string()))?;

    let rows = match (value["status"].as_str(), value["data"].as_array()) {
        (Some("success"), Some(rows)) => rows,
        _ => {
            log::warn!("sheets: fetch reply has unexpected shape, treating as empty");
            return Ok(Vec::new());
        }
    };

    let mut sentences = Vec::with_capacity(rows.len());
    for row in rows {
        match Sentence::deserialize(row) {
            Ok(s) => sentences.push(s),
            Err(e) => log::warn!("sheets: skipping row {row}: {e}"),
        }
    }
    Ok(sentences)
}

// ---------------------------------------------------------------------------
// SheetsClient
// ---------------------------------------------------------------------------

/// Spreadsheet API client.
#[derive(Clone)]
pub struct SheetsClient {
    transport: Arc<dyn SheetTransport>,
    config: SheetsConfig,
}

impl SheetsClient {
    pub fn new(transport: Arc<dyn SheetTransport>, config: SheetsConfig) -> Self {
        Self { transport, config }
    }

    /// Fetch the whole sentence list.
    pub async fn fetch_sentences(&self) -> Result<Vec<Sentence>, SheetsError> {
        match self.transport.get(&self.config.fetch_url).await? {
            RawResponse::Opaque => Err(SheetsError::Parse("opaque fetch reply".into())),
            RawResponse::Http { status, body } => {
                if !(200..300).contains(&status) {
                    return Err(SheetsError::Status(status));
                }
                let sentences = parse_fetch_body(&body)?;
                log::info!("sheets: fetched {} sentences", sentences.len());
                Ok(sentences)
            }
        }
    }

    /// Save the selected rows of `sentences`.  Never fails; the outcome
    /// carries the message to show.
    pub async fn save(&self, sentences: &[GeneratedSentence]) -> SaveOutcome {
        let rows: Vec<&GeneratedSentence> = sentences.iter().filter(|s| s.selected).collect();
        if rows.is_empty() {
            return SaveOutcome::Failed(NO_SELECTION_MESSAGE.into());
        }

        let payload = save_payload(&rows);
        let outcome = match self.transport.post_json(&self.config.save_url, &payload).await {
            Ok(response) => classify_save_response(response, rows.len()),
            Err(e) => {
                log::error!("sheets: save failed: {e}");
                SaveOutcome::Failed(NETWORK_MESSAGE.into())
            }
        };

        log::info!("sheets: save of {} rows -> {outcome:?}", rows.len());
        outcome
    }
}
