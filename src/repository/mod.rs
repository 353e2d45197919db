// src/repository/mod.rs

//! Narrow persistence gateway used by the quiz and leaderboard services.
//!
//! [`PgStore`] talks to Postgres; [`MemoryStore`] keeps everything in process
//! and backs the test-suite.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        leaderboard::Standing,
        question::{NewQuestion, Question, QuestionDetail, QuestionOption},
        score::{NewScoreEntry, RecordOutcome, ScoreEntry, ScoreTotals},
        subject::Subject,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Which score entries an aggregation looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerFilter {
    pub subject_id: Option<i64>,
    /// Inclusive lower bound: entries with `created_at >= since` qualify.
    pub since: Option<DateTime<Utc>>,
}

impl LedgerFilter {
    pub fn matches(&self, entry: &ScoreEntry) -> bool {
        self.subject_id.is_none_or(|id| entry.subject_id == id)
            && self.since.is_none_or(|since| entry.created_at >= since)
    }
}

/// Read access to subjects, questions, options and explanations,
/// plus the administrative writes that populate them.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn list_subjects(&self) -> Result<Vec<Subject>, AppError>;

    async fn subject_by_id(&self, id: i64) -> Result<Option<Subject>, AppError>;

    /// Fails with `Conflict` when the name is taken.
    async fn create_subject(&self, name: &str) -> Result<Subject, AppError>;

    /// One question drawn uniformly at random from the subject, `None` if it has none.
    async fn random_question(&self, subject_id: i64) -> Result<Option<Question>, AppError>;

    async fn question_by_id(&self, id: i64) -> Result<Option<Question>, AppError>;

    /// Options of a question ordered by id.
    async fn options_for_question(&self, question_id: i64) -> Result<Vec<QuestionOption>, AppError>;

    async fn option_by_id(&self, id: i64) -> Result<Option<QuestionOption>, AppError>;

    /// The canonical correct option: the lowest-id option flagged correct.
    async fn correct_option(&self, question_id: i64) -> Result<Option<QuestionOption>, AppError>;

    async fn explanation(&self, question_id: i64) -> Result<Option<String>, AppError>;

    /// Writes the question, its options and explanation as one unit.
    async fn create_question(&self, question: NewQuestion) -> Result<QuestionDetail, AppError>;

    /// Writes a batch of questions all-or-nothing, in input order.
    async fn create_questions(
        &self,
        questions: Vec<NewQuestion>,
    ) -> Result<Vec<QuestionDetail>, AppError>;

    /// Every question with its answer key, ordered by id, optionally for one subject.
    async fn list_questions(
        &self,
        subject_id: Option<i64>,
    ) -> Result<Vec<QuestionDetail>, AppError>;
}

/// The append-only score ledger and the aggregations read from it.
#[async_trait]
pub trait ScoreLedger: Send + Sync {
    /// Appends one entry. An entry whose `(user_id, request_id)` already exists
    /// is not written again; the stored one is returned as a duplicate.
    async fn record(&self, entry: NewScoreEntry) -> Result<RecordOutcome, AppError>;

    async fn user_totals(&self, user_id: i64) -> Result<ScoreTotals, AppError>;

    /// Most recent entries of a user, newest first.
    async fn recent_entries(&self, user_id: i64, limit: i64) -> Result<Vec<ScoreEntry>, AppError>;

    /// Per-user aggregates ordered by total score desc, correct answers desc, user id asc.
    async fn standings(
        &self,
        filter: &LedgerFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Standing>, AppError>;

    /// Number of distinct users with at least one entry matching the filter.
    async fn ranked_user_count(&self, filter: &LedgerFilter) -> Result<i64, AppError>;

    /// The user's aggregate and competition rank, `None` when they have no entries in scope.
    async fn user_standing(
        &self,
        user_id: i64,
        filter: &LedgerFilter,
    ) -> Result<Option<(Standing, i64)>, AppError>;
}
