//! Difficulty levels.
//!
//! Practice sentences use the numeric levels 1–3.  The generation prompt
//! additionally knows a business tier (`"business 1"`, `"business 2"`) which
//! is not part of the fixed combination set but can be requested explicitly.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A sentence difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "LevelRepr", into = "LevelRepr")]
pub enum Level {
    /// Numeric level (1, 2 or 3 in the fixed set).
    Numeric(u8),
    /// Business tier (`business 1`, `business 2`).
    Business(u8),
}

impl Level {
    /// The three levels used by the practice filter and the generator.
    pub const STANDARD: [Level; 3] = [Level::Numeric(1), Level::Numeric(2), Level::Numeric(3)];

    /// Key used to look up the complexity phrase of the generation prompt.
    ///
    /// ```
    /// use eigo_drill::model::Level;
    ///
    /// assert_eq!(Level::Numeric(2).prompt_key(), "2");
    /// assert_eq!(Level::Business(1).prompt_key(), "business 1");
    /// ```
    pub fn prompt_key(&self) -> String {
        match self {
            Level::Numeric(n) => n.to_string(),
            Level::Business(n) => format!("business {n}"),
        }
    }

    /// Text form sent to the spreadsheet API (levels are stored as text).
    pub fn as_text(&self) -> String {
        self.prompt_key()
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Numeric(1)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Numeric(n) => write!(f, "Level {n}"),
            Level::Business(n) => write!(f, "Business {n}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire representation
// ---------------------------------------------------------------------------

/// Levels arrive as JSON numbers from most sources but as text from the
/// spreadsheet (`"2"`), and the business tier is always text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Number(u8),
    Text(String),
}

impl TryFrom<LevelRepr> for Level {
    type Error = String;

    fn try_from(repr: LevelRepr) -> Result<Self, Self::Error> {
        match repr {
            LevelRepr::Number(n) => Ok(Level::Numeric(n)),
            LevelRepr::Text(text) => {
                let text = text.trim();
                if let Ok(n) = text.parse::<u8>() {
                    return Ok(Level::Numeric(n));
                }
                text.strip_prefix("business")
                    .and_then(|rest| rest.trim().parse::<u8>().ok())
                    .map(Level::Business)
                    .ok_or_else(|| format!("unrecognised level: {text:?}"))
            }
        }
    }
}

impl From<Level> for LevelRepr {
    fn from(level: Level) -> Self {
        match level {
            Level::Numeric(n) => LevelRepr::Number(n),
            Level::Business(_) => LevelRepr::Text(level.prompt_key()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_level_accepts_number_and_text() {
        let from_number: Level = serde_json::from_str("2").unwrap();
        let from_text: Level = serde_json::from_str("\"2\"").unwrap();
        assert_eq!(from_number, Level::Numeric(2));
        assert_eq!(from_text, Level::Numeric(2));
    }

    #[test]
    fn business_level_parses_from_text_key() {
        let level: Level = serde_json::from_str("\"business 2\"").unwrap();
        assert_eq!(level, Level::Business(2));
        assert_eq!(serde_json::to_string(&level).unwrap(), "\"business 2\"");
    }

    #[test]
    fn numeric_level_serialises_as_number() {
        assert_eq!(serde_json::to_string(&Level::Numeric(3)).unwrap(), "3");
    }

    #[test]
    fn garbage_level_is_rejected() {
        assert!(serde_json::from_str::<Level>("\"expert\"").is_err());
    }

    #[test]
    fn display_labels() {
        assert_eq!(Level::Numeric(1).to_string(), "Level 1");
        assert_eq!(Level::Business(2).to_string(), "Business 2");
    }
}
