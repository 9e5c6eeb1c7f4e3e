use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "banned_word_severity", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BannedWord {
    pub id: Uuid,
    pub word: String,
    pub severity: Severity,
    pub category: Option<String>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ListBannedWordsParams {
    pub severity: Option<Severity>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug)]
pub struct CreateBannedWord {
    pub word: String,
    pub severity: Severity,
    pub category: Option<String>,
}

#[derive(Debug, Default)]
pub struct UpdateBannedWord {
    pub word: Option<String>,
    pub severity: Option<Severity>,
    /// `Some(None)` clears the category.
    pub category: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Stored form of a banned word: trimmed and lower-cased.
pub fn normalize_word(word: &str) -> String {
    word.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WordMatch {
    pub word: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub is_flagged: bool,
    pub matches: Vec<WordMatch>,
    pub highest_severity: Option<Severity>,
}

/// Matches text against a set of banned words.
///
/// Entries and text are both split on Unicode word boundaries. An entry
/// matches when its words appear as a contiguous run in the text, so
/// `scam` does not match `scampi` and `jerk-off` matches `jerk off`.
/// Entries with no word characters fall back to a substring match.
pub struct WordFilter {
    entries: Vec<FilterEntry>,
}

struct FilterEntry {
    word: WordMatch,
    tokens: Vec<String>,
}

impl FilterEntry {
    fn matches(&self, text: &str, tokens: &[&str]) -> bool {
        if self.tokens.is_empty() {
            return text.contains(self.word.word.as_str());
        }
        tokens
            .windows(self.tokens.len())
            .any(|window| window.iter().zip(&self.tokens).all(|(a, b)| *a == b.as_str()))
    }
}

impl WordFilter {
    pub fn new(words: impl IntoIterator<Item = (String, Severity)>) -> Self {
        let entries = words
            .into_iter()
            .map(|(word, severity)| {
                let word = normalize_word(&word);
                let tokens = word.unicode_words().map(str::to_string).collect();
                FilterEntry {
                    word: WordMatch { word, severity },
                    tokens,
                }
            })
            .filter(|e| !e.word.word.is_empty())
            .collect();

        Self { entries }
    }

    pub fn check(&self, text: &str) -> CheckResult {
        let normalized = text.to_lowercase();
        let tokens: Vec<&str> = normalized.unicode_words().collect();

        let mut matches: Vec<WordMatch> = self
            .entries
            .iter()
            .filter(|entry| entry.matches(&normalized, &tokens))
            .map(|entry| entry.word.clone())
            .collect();

        matches.sort_by(|a, b| b.severity.cmp(&a.severity).then_with(|| a.word.cmp(&b.word)));
        matches.dedup();

        let highest_severity = matches.first().map(|m| m.severity);
        if !matches.is_empty() {
            tracing::debug!(count = matches.len(), "Banned words matched");
        }

        CheckResult {
            is_flagged: !matches.is_empty(),
            matches,
            highest_severity,
        }
    }
}
