// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::question::QuizQuestion;

/// DTO for requesting a generated quiz.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct GenerateQuizRequest {
    #[validate(range(min = 1, message = "subject_id must be positive"))]
    pub subject_id: i64,
    #[validate(range(min = 1, max = 100, message = "num_of_questions must be between 1 and 100"))]
    pub num_of_questions: i64,
}

/// A freshly generated quiz. Options never reveal which one is correct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuiz {
    pub subject_id: i64,
    pub total_count: usize,
    pub questions: Vec<QuizQuestion>,
}

/// One answered question inside a submission.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnswerSubmission {
    pub question_id: i64,
    pub option_ids: Vec<i64>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SubmitQuizRequest {
    #[validate(length(min = 1, max = 100, message = "answers must contain 1 to 100 entries"))]
    pub answers: Vec<AnswerSubmission>,

    /// Client-generated key. Resubmitting with the same key replays the
    /// first recorded attempt instead of scoring it again.
    #[validate(length(min = 1, max = 64))]
    #[serde(default)]
    pub request_id: Option<String>,

    /// Best-effort, reported by the client.
    #[validate(range(min = 0))]
    #[serde(default)]
    pub time_taken_seconds: Option<i64>,
}

/// Graded outcome of a single answered question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionResult {
    pub question_id: i64,
    pub question: String,
    pub selected_options: Vec<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: String,
}

/// Response after grading a submission (reveals the answers).
///
/// Totals and score mirror the backing score entry. On a replay that is the first
/// recorded attempt, while `results` reviews the answers sent with the retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResult {
    pub user_id: i64,
    pub subject_id: i64,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub incorrect_answers: i64,
    pub score: i64,
    pub score_percent: i64,
    /// Id of the score entry backing this result.
    pub score_id: i64,
    /// True when the request id matched an attempt that was already recorded.
    pub replayed: bool,
    pub results: Vec<QuestionResult>,
}
