// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        question::{CreateQuestionRequest, QuestionListQuery},
        subject::CreateSubjectRequest,
    },
    services::catalog,
    state::AppState,
};

/// Creates a subject.
/// Admin only.
pub async fn create_subject(
    State(state): State<AppState>,
    Json(payload): Json<CreateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let subject = catalog::create_subject(state.questions.as_ref(), &payload).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

/// Adds a question with its options and explanation to a subject.
/// Admin only.
pub async fn create_question(
    State(state): State<AppState>,
    Path(subject_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = catalog::create_question(state.questions.as_ref(), subject_id, payload).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// Adds a batch of questions to a subject in one go; nothing is stored if any fails.
/// Admin only.
pub async fn create_questions_bulk(
    State(state): State<AppState>,
    Path(subject_id): Path<i64>,
    Json(payload): Json<Vec<CreateQuestionRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let questions =
        catalog::create_questions(state.questions.as_ref(), subject_id, payload).await?;
    Ok((StatusCode::CREATED, Json(questions)))
}

/// Lists questions with their answer keys, optionally for one subject.
/// Admin only.
pub async fn list_questions(
    State(state): State<AppState>,
    Query(params): Query<QuestionListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let questions = catalog::list_questions(state.questions.as_ref(), params.subject_id).await?;
    Ok(Json(questions))
}

/// Admin only.
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = catalog::get_question(state.questions.as_ref(), id).await?;
    Ok(Json(question))
}
