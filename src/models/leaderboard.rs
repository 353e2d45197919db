// src/models/leaderboard.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Time window a global leaderboard covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    #[default]
    AllTime,
    Weekly,
    Monthly,
}

/// Query parameters for `GET /api/leaderboard`.
#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub subject_id: Option<i64>,
    pub period: Option<Period>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for the rank endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct RankQuery {
    pub subject_id: Option<i64>,
    pub period: Option<Period>,
}

/// Per-user aggregate over the score entries of a scope, before ranking.
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct Standing {
    pub user_id: i64,
    pub user_name: String,
    pub total_score: i64,
    pub total_quizzes: i64,
    pub correct_answers: i64,
    pub total_questions: i64,
}

/// A single row of the leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: i64,
    pub user_name: String,
    pub total_score: i64,
    pub total_quizzes: i64,
    pub correct_answers: i64,
    pub total_questions: i64,
    pub accuracy_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    pub period: Period,
    pub total_users: i64,
    pub entries: Vec<LeaderboardEntry>,
}

/// A user's position on a leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRankResponse {
    pub user_id: i64,
    pub user_name: String,
    pub rank: i64,
    pub total_score: i64,
    pub total_quizzes: i64,
    pub correct_answers: i64,
    pub total_questions: i64,
    pub accuracy_percent: f64,
    pub total_users: i64,
}
