// src/routes.rs

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    handlers::{admin, leaderboard, profile, quiz, subject},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public: subjects, quiz generation, leaderboards.
/// * Authenticated: quiz submission, own rank and stats.
/// * Admin: subject and question authoring.
/// * Global middleware: trace, CORS, request timeout.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let subject_routes = Router::new()
        .route("/", get(subject::list_subjects))
        .route("/{id}", get(subject::get_subject));

    let quiz_routes = Router::new()
        .route("/generate", post(quiz::generate_quiz))
        // Protected quiz routes
        .merge(
            Router::new()
                .route("/submit", post(quiz::submit_quiz))
                .layer(auth.clone()),
        );

    let leaderboard_routes = Router::new()
        .route("/", get(leaderboard::get_leaderboard))
        .route("/users/{user_id}", get(leaderboard::get_user_rank))
        .merge(
            Router::new()
                .route("/me", get(leaderboard::get_my_rank))
                .layer(auth.clone()),
        );

    let user_routes = Router::new()
        .route("/me/stats", get(profile::get_my_stats))
        .route("/me/scores", get(profile::list_my_scores))
        .layer(auth.clone());

    let admin_routes = Router::new()
        .route("/subjects", post(admin::create_subject))
        .route("/subjects/{id}/questions", post(admin::create_question))
        .route(
            "/subjects/{id}/questions/bulk",
            post(admin::create_questions_bulk),
        )
        .route("/questions", get(admin::list_questions))
        .route("/questions/{id}", get(admin::get_question))
        // Auth first, then the admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(auth);

    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        .nest("/api/subjects", subject_routes)
        .nest("/api/quiz", quiz_routes)
        .nest("/api/leaderboard", leaderboard_routes)
        .nest("/api/users", user_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (Router::layer wraps outward: cors is outermost, timeout innermost)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
