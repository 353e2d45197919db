// src/handlers/subject.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{error::AppError, services::catalog, state::AppState};

pub async fn list_subjects(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let subjects = state.questions.list_subjects().await?;
    Ok(Json(subjects))
}

pub async fn get_subject(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let subject = catalog::get_subject(state.questions.as_ref(), id).await?;
    Ok(Json(subject))
}
