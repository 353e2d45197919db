// src/config.rs

use std::{env, fmt, str::FromStr};

use dotenvy::dotenv;

/// Upper bound on questions per generated quiz.
pub const MAX_QUIZ_QUESTIONS: i64 = 100;

/// Upper bound on questions per bulk upload.
pub const MAX_BULK_QUESTIONS: usize = 100;

/// How many times a duplicate draw is retried before it is accepted.
pub const DRAW_RETRY_LIMIT: usize = 10;

/// Mode tag stored on every score entry written by the grader.
pub const DEFAULT_SCORE_MODE: &str = "practice";

pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;
pub const MAX_LEADERBOARD_LIMIT: i64 = 100;

/// Days covered by the weekly and monthly leaderboards.
pub const WEEKLY_WINDOW_DAYS: i64 = 7;
pub const MONTHLY_WINDOW_DAYS: i64 = 30;

/// What the grader does with a submitted answer whose question no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradingMode {
    /// Skip the entry and grade the rest of the batch.
    #[default]
    Lenient,
    /// Fail the whole submission.
    Strict,
}

impl FromStr for GradingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(GradingMode::Lenient),
            "strict" => Ok(GradingMode::Strict),
            other => Err(format!("unknown grading mode '{}'", other)),
        }
    }
}

impl fmt::Display for GradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingMode::Lenient => f.write_str("lenient"),
            GradingMode::Strict => f.write_str("strict"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: String,
    pub grading_mode: GradingMode,
    pub request_timeout_secs: u64,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let grading_mode = env::var("GRADING_MODE")
            .ok()
            .map(|raw| raw.parse().expect("GRADING_MODE must be 'lenient' or 'strict'"))
            .unwrap_or_default();

        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(10);

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|raw| split_origins(&raw))
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        Self {
            database_url,
            jwt_secret,
            rust_log,
            bind_addr,
            grading_mode,
            request_timeout_secs,
            cors_allowed_origins,
        }
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
