// src/handlers/quiz.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::{GenerateQuizRequest, SubmitQuizRequest},
    services::{quiz_generator, quiz_grader},
    state::AppState,
    utils::jwt::Claims,
};

/// Generates a random quiz from one subject.
///
/// Options come back without their correctness flags.
pub async fn generate_quiz(
    State(state): State<AppState>,
    Json(payload): Json<GenerateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let quiz = quiz_generator::generate_quiz(
        state.questions.as_ref(),
        payload.subject_id,
        payload.num_of_questions,
    )
    .await?;

    Ok(Json(quiz))
}

/// Grades the caller's answers and appends the attempt to the score ledger.
///
/// * A repeated `request_id` returns the stored attempt instead of scoring twice.
/// * Without a `request_id` every submission counts.
pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let result = quiz_grader::grade_submission(
        state.questions.as_ref(),
        state.scores.as_ref(),
        state.config.grading_mode,
        user_id,
        &payload,
        Utc::now(),
    )
    .await?;

    tracing::info!(
        "User {} scored {}/{} (replayed: {})",
        user_id,
        result.correct_answers,
        result.total_questions,
        result.replayed
    );

    Ok(Json(result))
}
