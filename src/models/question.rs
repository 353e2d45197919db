// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::{Validate, ValidationError};

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: i64,

    pub subject_id: i64,

    /// The prompt shown to the player.
    pub question: String,

    /// Multi-select questions allow more than one option to be picked.
    pub is_multiple_choice: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'options' table. Carries the correctness flag,
/// so it must never be serialized into a quiz sent to players.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct QuestionOption {
    pub id: i64,
    pub question_id: i64,

    /// Display text. Stored as 'option_text' since `option` reads poorly in SQL.
    #[sqlx(rename = "option_text")]
    pub option: String,

    pub is_correct: bool,
}

/// DTO for an option inside a generated quiz (excludes `is_correct`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicOption {
    pub id: i64,
    pub option: String,
}

impl From<QuestionOption> for PublicOption {
    fn from(opt: QuestionOption) -> Self {
        PublicOption {
            id: opt.id,
            option: opt.option,
        }
    }
}

/// DTO for a question inside a generated quiz.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizQuestion {
    pub question_id: i64,
    pub question: String,
    pub subject_id: i64,
    pub is_multiple_choice: bool,
    pub options: Vec<PublicOption>,
}

impl QuizQuestion {
    pub fn new(question: Question, options: Vec<QuestionOption>) -> Self {
        QuizQuestion {
            question_id: question.id,
            question: question.question,
            subject_id: question.subject_id,
            is_multiple_choice: question.is_multiple_choice,
            options: options.into_iter().map(PublicOption::from).collect(),
        }
    }
}

/// One option of a question being authored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewOptionRequest {
    pub option: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// DTO for creating a new question (admin).
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = validate_answer_key))]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub question: String,
    #[serde(default)]
    pub is_multiple_choice: bool,
    #[validate(custom(function = validate_options))]
    pub options: Vec<NewOptionRequest>,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub explanation: String,
}

fn validate_options(options: &[NewOptionRequest]) -> Result<(), ValidationError> {
    if options.len() < 2 {
        return Err(ValidationError::new("at_least_two_options"));
    }
    for opt in options {
        if opt.option.trim().is_empty() {
            return Err(ValidationError::new("option_cannot_be_empty"));
        }
        if opt.option.len() > 500 {
            return Err(ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// A question needs at least one correct option; single-select exactly one.
fn validate_answer_key(req: &CreateQuestionRequest) -> Result<(), ValidationError> {
    let correct = req.options.iter().filter(|o| o.is_correct).count();
    if correct == 0 {
        return Err(ValidationError::new("no_correct_option"));
    }
    if !req.is_multiple_choice && correct != 1 {
        return Err(ValidationError::new("single_choice_needs_exactly_one_correct_option"));
    }
    Ok(())
}

/// Query parameters for the admin question listing.
#[derive(Debug, Default, Deserialize)]
pub struct QuestionListQuery {
    pub subject_id: Option<i64>,
}

/// A validated, sanitized question ready to be written to the question store.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub subject_id: i64,
    pub question: String,
    pub is_multiple_choice: bool,
    pub options: Vec<NewOptionRequest>,
    pub explanation: String,
}

/// Full view of an authored question, including the answer key (admin only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: Question,
    pub options: Vec<QuestionOption>,
    pub explanation: String,
}
