// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use quizrank::{
    config::{Config, GradingMode},
    models::question::{NewOptionRequest, NewQuestion},
    repository::{MemoryStore, QuestionStore},
    routes,
    state::AppState,
    utils::jwt::sign_jwt,
};

pub const JWT_SECRET: &str = "test_secret_for_integration_tests";

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

pub fn test_config(grading_mode: GradingMode) -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: JWT_SECRET.to_string(),
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        grading_mode,
        request_timeout_secs: 10,
        cors_allowed_origins: vec!["http://localhost:3000".to_string()],
    }
}

/// Spawns the app on a random port, backed by a fresh in-memory store.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(GradingMode::Lenient).await
}

pub async fn spawn_app_with(grading_mode: GradingMode) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::in_memory(store.clone(), test_config(grading_mode));
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a player and returns `(user_id, bearer token)`.
    pub async fn player(&self, role: &str) -> (i64, String) {
        let name = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
        let id = self.store.insert_user(&name).await;
        let token = sign_jwt(id, role, JWT_SECRET, 600).unwrap();
        (id, token)
    }
}

/// Subject id plus `(question_id, correct option id, wrong option id)` per question.
pub struct Seeded {
    pub subject_id: i64,
    pub questions: Vec<(i64, i64, i64)>,
}

/// "General Knowledge" with the capital-of-France question; extra questions
/// are simple yes/no items.
fn option(text: &str, is_correct: bool) -> NewOptionRequest {
    NewOptionRequest {
        option: text.to_string(),
        is_correct,
    }
}

pub async fn seed_general_knowledge(store: &MemoryStore, extra: usize) -> Seeded {
    let subject = store.create_subject("General Knowledge").await.unwrap();

    let mut drafts = vec![NewQuestion {
        subject_id: subject.id,
        question: "What is the capital of France?".to_string(),
        is_multiple_choice: false,
        options: vec![
            option("Paris", true),
            option("London", false),
            option("Berlin", false),
        ],
        explanation: "Paris has been the capital since 987.".to_string(),
    }];
    for i in 0..extra {
        drafts.push(NewQuestion {
            subject_id: subject.id,
            question: format!("Is statement {} true?", i),
            is_multiple_choice: false,
            options: vec![
                option("Yes", true),
                option("No", false),
            ],
            explanation: String::new(),
        });
    }

    let mut questions = Vec::new();
    for draft in drafts {
        let detail = store.create_question(draft).await.unwrap();
        questions.push((detail.question.id, detail.options[0].id, detail.options[1].id));
    }

    Seeded {
        subject_id: subject.id,
        questions,
    }
}
