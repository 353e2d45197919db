// src/services/quiz_generator.rs

use std::collections::HashSet;

use crate::{
    config::{DRAW_RETRY_LIMIT, MAX_QUIZ_QUESTIONS},
    error::AppError,
    models::{
        question::{Question, QuizQuestion},
        quiz::GeneratedQuiz,
    },
    repository::QuestionStore,
};

/// Generates a quiz of `count` random questions from one subject.
///
/// * Each slot draws uniformly from the subject's pool.
/// * A draw that repeats an already selected question is retried up to
///   `DRAW_RETRY_LIMIT` times; after that the repeat is kept, so a pool smaller
///   than `count` still yields `count` questions.
/// * Correctness flags are stripped from every option.
///
/// Read-only: nothing is reserved, two players may receive the same questions.
pub async fn generate_quiz(
    store: &dyn QuestionStore,
    subject_id: i64,
    count: i64,
) -> Result<GeneratedQuiz, AppError> {
    if subject_id <= 0 {
        return Err(AppError::BadRequest("subject_id must be positive".to_string()));
    }
    if !(1..=MAX_QUIZ_QUESTIONS).contains(&count) {
        return Err(AppError::BadRequest(format!(
            "num_of_questions must be between 1 and {}",
            MAX_QUIZ_QUESTIONS
        )));
    }

    store
        .subject_by_id(subject_id)
        .await?
        .ok_or(AppError::NotFound("Subject not found".to_string()))?;

    let mut selected: HashSet<i64> = HashSet::new();
    let mut questions = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let mut question = draw(store, subject_id).await?;
        let mut attempts = 1;
        while selected.contains(&question.id) && attempts < DRAW_RETRY_LIMIT {
            question = draw(store, subject_id).await?;
            attempts += 1;
        }
        selected.insert(question.id);

        let options = store
            .options_for_question(question.id)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch options of question {}: {:?}", question.id, e);
                AppError::internal(format!("options unavailable for question {}", question.id))
            })?;
        if options.is_empty() {
            return Err(AppError::internal(format!(
                "options unavailable for question {}",
                question.id
            )));
        }

        questions.push(QuizQuestion::new(question, options));
    }

    Ok(GeneratedQuiz {
        subject_id,
        total_count: questions.len(),
        questions,
    })
}

async fn draw(store: &dyn QuestionStore, subject_id: i64) -> Result<Question, AppError> {
    store
        .random_question(subject_id)
        .await?
        .ok_or(AppError::NotFound("Subject has no questions".to_string()))
}
