// src/services/stats.rs

use crate::{
    error::AppError,
    models::score::{ScoreEntry, UserStats},
    ranking::accuracy_percent,
    repository::ScoreLedger,
};

pub const MAX_HISTORY_LIMIT: i64 = 50;

/// Lifetime totals of one user, read straight from the score ledger.
/// A user who never played gets all zeroes.
pub async fn user_stats(ledger: &dyn ScoreLedger, user_id: i64) -> Result<UserStats, AppError> {
    let totals = ledger.user_totals(user_id).await?;
    Ok(UserStats {
        user_id,
        total_quizzes_taken: totals.total_quizzes,
        total_correct_answers: totals.correct_answers,
        total_incorrect_answers: totals.incorrect_answers,
        total_questions_answered: totals.total_questions,
        accuracy_percent: accuracy_percent(totals.correct_answers, totals.total_questions),
    })
}

pub async fn recent_attempts(
    ledger: &dyn ScoreLedger,
    user_id: i64,
    limit: Option<i64>,
) -> Result<Vec<ScoreEntry>, AppError> {
    let limit = limit.unwrap_or(20).clamp(1, MAX_HISTORY_LIMIT);
    ledger.recent_entries(user_id, limit).await
}
