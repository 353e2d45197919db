// src/services/catalog.rs

use validator::Validate;

use crate::{
    config::MAX_BULK_QUESTIONS,
    error::AppError,
    models::{
        question::{CreateQuestionRequest, NewOptionRequest, NewQuestion, QuestionDetail},
        subject::{CreateSubjectRequest, Subject},
    },
    repository::QuestionStore,
    utils::html::clean_html,
};

pub async fn get_subject(store: &dyn QuestionStore, id: i64) -> Result<Subject, AppError> {
    if id <= 0 {
        return Err(AppError::BadRequest("subject id must be positive".to_string()));
    }
    store
        .subject_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Subject not found".to_string()))
}

pub async fn create_subject(
    store: &dyn QuestionStore,
    req: &CreateSubjectRequest,
) -> Result<Subject, AppError> {
    req.validate()?;
    let name = clean_html(req.name.trim());
    if name.is_empty() {
        return Err(AppError::BadRequest("Subject name cannot be empty".to_string()));
    }
    store.create_subject(&name).await
}

fn sanitize(subject_id: i64, req: CreateQuestionRequest) -> NewQuestion {
    NewQuestion {
        subject_id,
        question: clean_html(&req.question),
        is_multiple_choice: req.is_multiple_choice,
        options: req
            .options
            .into_iter()
            .map(|o| NewOptionRequest {
                option: clean_html(&o.option),
                is_correct: o.is_correct,
            })
            .collect(),
        explanation: clean_html(&req.explanation),
    }
}

/// Validates and sanitizes an authored question, then stores it under `subject_id`.
pub async fn create_question(
    store: &dyn QuestionStore,
    subject_id: i64,
    req: CreateQuestionRequest,
) -> Result<QuestionDetail, AppError> {
    req.validate()?;

    get_subject(store, subject_id).await?;

    let question = store.create_question(sanitize(subject_id, req)).await?;

    tracing::info!(
        "Created question {} in subject {}",
        question.question.id,
        subject_id
    );
    Ok(question)
}

/// Bulk upload into one subject. Every question is validated before anything is
/// written, and the batch is stored all-or-nothing.
pub async fn create_questions(
    store: &dyn QuestionStore,
    subject_id: i64,
    reqs: Vec<CreateQuestionRequest>,
) -> Result<Vec<QuestionDetail>, AppError> {
    if reqs.is_empty() {
        return Err(AppError::BadRequest("No questions submitted".to_string()));
    }
    if reqs.len() > MAX_BULK_QUESTIONS {
        return Err(AppError::BadRequest(format!(
            "At most {} questions per upload",
            MAX_BULK_QUESTIONS
        )));
    }
    for (i, req) in reqs.iter().enumerate() {
        req.validate()
            .map_err(|e| AppError::BadRequest(format!("question {}: {}", i + 1, e)))?;
    }

    get_subject(store, subject_id).await?;

    let batch = reqs.into_iter().map(|req| sanitize(subject_id, req)).collect();
    let created = store.create_questions(batch).await?;

    tracing::info!(
        "Created {} questions in subject {}",
        created.len(),
        subject_id
    );
    Ok(created)
}

/// All questions with answer keys, optionally restricted to an existing subject.
pub async fn list_questions(
    store: &dyn QuestionStore,
    subject_id: Option<i64>,
) -> Result<Vec<QuestionDetail>, AppError> {
    if let Some(id) = subject_id {
        get_subject(store, id).await?;
    }
    store.list_questions(subject_id).await
}

pub async fn get_question(store: &dyn QuestionStore, id: i64) -> Result<QuestionDetail, AppError> {
    if id <= 0 {
        return Err(AppError::BadRequest("question id must be positive".to_string()));
    }
    let question = store
        .question_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;
    let options = store.options_for_question(id).await?;
    let explanation = store.explanation(id).await?.unwrap_or_default();

    Ok(QuestionDetail {
        question,
        options,
        explanation,
    })
}
