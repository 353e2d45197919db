// src/models/subject.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'subjects' table: a topic grouping questions.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a subject (admin).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubjectRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Subject name length must be between 1 and 100 characters."
    ))]
    pub name: String,
}
