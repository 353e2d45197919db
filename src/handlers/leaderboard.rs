// src/handlers/leaderboard.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    error::AppError,
    models::leaderboard::{LeaderboardQuery, RankQuery, UserRankResponse},
    services::leaderboard::{self, LeaderboardScope, Page},
    state::AppState,
    utils::jwt::Claims,
};

/// Ranked users for a period, or for one subject when `subject_id` is given.
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardQuery>,
) -> Result<impl IntoResponse, AppError> {
    let scope = LeaderboardScope::from_params(params.subject_id, params.period)?;
    let page = Page::new(params.limit, params.offset)?;

    let board = leaderboard::leaderboard(
        state.questions.as_ref(),
        state.scores.as_ref(),
        scope,
        page,
        Utc::now(),
    )
    .await?;

    Ok(Json(board))
}

pub async fn get_my_rank(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<RankQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    rank_of(&state, user_id, params).await
}

pub async fn get_user_rank(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<RankQuery>,
) -> Result<impl IntoResponse, AppError> {
    rank_of(&state, user_id, params).await
}

async fn rank_of(
    state: &AppState,
    user_id: i64,
    params: RankQuery,
) -> Result<Json<UserRankResponse>, AppError> {
    let scope = LeaderboardScope::from_params(params.subject_id, params.period)?;
    let rank = leaderboard::user_rank(state.scores.as_ref(), user_id, scope, Utc::now()).await?;
    Ok(Json(rank))
}
