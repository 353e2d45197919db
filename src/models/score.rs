// src/models/score.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'scores' table: one append-only row per graded attempt.
/// Invariant: `correct_answers + incorrect_answers == total_questions`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct ScoreEntry {
    pub id: i64,
    pub user_id: i64,
    pub subject_id: i64,
    pub mode: String,
    pub correct_answers: i64,
    pub incorrect_answers: i64,
    pub total_questions: i64,
    pub score: i64,
    pub time_taken_seconds: i64,
    pub request_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A score entry about to be appended to the ledger.
#[derive(Debug, Clone)]
pub struct NewScoreEntry {
    pub user_id: i64,
    pub subject_id: i64,
    pub mode: String,
    pub correct_answers: i64,
    pub incorrect_answers: i64,
    pub total_questions: i64,
    pub score: i64,
    pub time_taken_seconds: i64,
    pub request_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Result of appending to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Inserted(ScoreEntry),
    /// An entry with the same (user, request id) already existed; nothing was written.
    Duplicate(ScoreEntry),
}

impl RecordOutcome {
    pub fn entry(&self) -> &ScoreEntry {
        match self {
            RecordOutcome::Inserted(entry) | RecordOutcome::Duplicate(entry) => entry,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, RecordOutcome::Duplicate(_))
    }
}

/// Raw per-user totals over the whole ledger.
#[derive(Debug, Clone, Default, FromRow, PartialEq)]
pub struct ScoreTotals {
    pub total_quizzes: i64,
    pub correct_answers: i64,
    pub incorrect_answers: i64,
    pub total_questions: i64,
}

/// Aggregated statistics for a user's dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserStats {
    pub user_id: i64,
    pub total_quizzes_taken: i64,
    pub total_correct_answers: i64,
    pub total_incorrect_answers: i64,
    pub total_questions_answered: i64,
    pub accuracy_percent: f64,
}

/// Query parameters for listing a user's recent attempts.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}
