// src/handlers/profile.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::score::HistoryParams,
    services::stats,
    state::AppState,
    utils::jwt::Claims,
};

/// Lifetime totals of the current user.
pub async fn get_my_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let stats = stats::user_stats(state.scores.as_ref(), user_id).await?;
    Ok(Json(stats))
}

/// The current user's latest attempts, newest first.
pub async fn list_my_scores(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let entries = stats::recent_attempts(state.scores.as_ref(), user_id, params.limit).await?;
    Ok(Json(entries))
}
