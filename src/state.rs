// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    config::Config,
    repository::{MemoryStore, PgStore, QuestionStore, ScoreLedger},
};

#[derive(Clone)]
pub struct AppState {
    pub questions: Arc<dyn QuestionStore>,
    pub scores: Arc<dyn ScoreLedger>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        questions: Arc<dyn QuestionStore>,
        scores: Arc<dyn ScoreLedger>,
        config: Config,
    ) -> Self {
        Self {
            questions,
            scores,
            config,
        }
    }

    /// Both repositories backed by the same Postgres pool.
    pub fn postgres(pool: PgPool, config: Config) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self::new(store.clone(), store, config)
    }

    /// Both repositories backed by one in-process store.
    pub fn in_memory(store: Arc<MemoryStore>, config: Config) -> Self {
        Self::new(store.clone(), store, config)
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
