// src/repository/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::{
        leaderboard::Standing,
        question::{NewQuestion, Question, QuestionDetail, QuestionOption},
        score::{NewScoreEntry, RecordOutcome, ScoreEntry, ScoreTotals},
        subject::Subject,
    },
    ranking,
    repository::{LedgerFilter, QuestionStore, ScoreLedger},
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: HashMap<i64, String>,
    subjects: Vec<Subject>,
    questions: Vec<Question>,
    options: Vec<QuestionOption>,
    explanations: HashMap<i64, String>,
    scores: Vec<ScoreEntry>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn has_subject(&self, id: i64) -> bool {
        self.subjects.iter().any(|s| s.id == id)
    }

    fn insert_question(&mut self, new: NewQuestion) -> QuestionDetail {
        let now = Utc::now();
        let question = Question {
            id: self.next_id(),
            subject_id: new.subject_id,
            question: new.question,
            is_multiple_choice: new.is_multiple_choice,
            created_at: now,
            updated_at: now,
        };

        let mut options = Vec::with_capacity(new.options.len());
        for opt in new.options {
            options.push(QuestionOption {
                id: self.next_id(),
                question_id: question.id,
                option: opt.option,
                is_correct: opt.is_correct,
            });
        }

        self.questions.push(question.clone());
        self.options.extend(options.iter().cloned());
        self.explanations.insert(question.id, new.explanation.clone());

        QuestionDetail {
            question,
            options,
            explanation: new.explanation,
        }
    }

    fn standings(&self, filter: &LedgerFilter) -> Vec<Standing> {
        ranking::aggregate(
            self.scores.iter().filter(|s| filter.matches(s)),
            &self.users,
        )
    }
}

/// Process-local store. Tables live behind one `RwLock`, mirroring the
/// constraints of the Postgres schema (foreign keys, unique names, request ids).
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user display name and returns the new user id.
    pub async fn insert_user(&self, name: &str) -> i64 {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        tables.users.insert(id, name.to_string());
        id
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn list_subjects(&self) -> Result<Vec<Subject>, AppError> {
        let tables = self.tables.read().await;
        let mut subjects = tables.subjects.clone();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subjects)
    }

    async fn subject_by_id(&self, id: i64) -> Result<Option<Subject>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.subjects.iter().find(|s| s.id == id).cloned())
    }

    async fn create_subject(&self, name: &str) -> Result<Subject, AppError> {
        let mut tables = self.tables.write().await;
        if tables.subjects.iter().any(|s| s.name == name) {
            return Err(AppError::Conflict(format!("Subject '{}' already exists", name)));
        }
        let subject = Subject {
            id: tables.next_id(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        tables.subjects.push(subject.clone());
        Ok(subject)
    }

    async fn random_question(&self, subject_id: i64) -> Result<Option<Question>, AppError> {
        let tables = self.tables.read().await;
        let pool: Vec<&Question> = tables
            .questions
            .iter()
            .filter(|q| q.subject_id == subject_id)
            .collect();
        if pool.is_empty() {
            return Ok(None);
        }
        let pick = rand::thread_rng().gen_range(0..pool.len());
        Ok(Some(pool[pick].clone()))
    }

    async fn question_by_id(&self, id: i64) -> Result<Option<Question>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn options_for_question(
        &self,
        question_id: i64,
    ) -> Result<Vec<QuestionOption>, AppError> {
        let tables = self.tables.read().await;
        let mut options: Vec<QuestionOption> = tables
            .options
            .iter()
            .filter(|o| o.question_id == question_id)
            .cloned()
            .collect();
        options.sort_by_key(|o| o.id);
        Ok(options)
    }

    async fn option_by_id(&self, id: i64) -> Result<Option<QuestionOption>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.options.iter().find(|o| o.id == id).cloned())
    }

    async fn correct_option(&self, question_id: i64) -> Result<Option<QuestionOption>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .options
            .iter()
            .filter(|o| o.question_id == question_id && o.is_correct)
            .min_by_key(|o| o.id)
            .cloned())
    }

    async fn explanation(&self, question_id: i64) -> Result<Option<String>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.explanations.get(&question_id).cloned())
    }

    async fn create_question(&self, new: NewQuestion) -> Result<QuestionDetail, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.has_subject(new.subject_id) {
            return Err(AppError::NotFound("Subject not found".to_string()));
        }
        Ok(tables.insert_question(new))
    }

    async fn create_questions(
        &self,
        questions: Vec<NewQuestion>,
    ) -> Result<Vec<QuestionDetail>, AppError> {
        let mut tables = self.tables.write().await;
        // Check the whole batch first so a bad entry leaves nothing behind.
        if questions.iter().any(|q| !tables.has_subject(q.subject_id)) {
            return Err(AppError::NotFound("Subject not found".to_string()));
        }
        Ok(questions
            .into_iter()
            .map(|q| tables.insert_question(q))
            .collect())
    }

    async fn list_questions(
        &self,
        subject_id: Option<i64>,
    ) -> Result<Vec<QuestionDetail>, AppError> {
        let tables = self.tables.read().await;
        let mut questions: Vec<&Question> = tables
            .questions
            .iter()
            .filter(|q| subject_id.is_none_or(|id| q.subject_id == id))
            .collect();
        questions.sort_by_key(|q| q.id);

        Ok(questions
            .into_iter()
            .map(|q| {
                let mut options: Vec<QuestionOption> = tables
                    .options
                    .iter()
                    .filter(|o| o.question_id == q.id)
                    .cloned()
                    .collect();
                options.sort_by_key(|o| o.id);
                QuestionDetail {
                    question: q.clone(),
                    options,
                    explanation: tables.explanations.get(&q.id).cloned().unwrap_or_default(),
                }
            })
            .collect())
    }
}

#[async_trait]
impl ScoreLedger for MemoryStore {
    async fn record(&self, new: NewScoreEntry) -> Result<RecordOutcome, AppError> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&new.user_id) {
            return Err(AppError::internal(format!(
                "score entry references unknown user {}",
                new.user_id
            )));
        }
        if !tables.has_subject(new.subject_id) {
            return Err(AppError::internal(format!(
                "score entry references unknown subject {}",
                new.subject_id
            )));
        }

        if let Some(request_id) = new.request_id.as_deref() {
            let existing = tables.scores.iter().find(|s| {
                s.user_id == new.user_id && s.request_id.as_deref() == Some(request_id)
            });
            if let Some(existing) = existing {
                return Ok(RecordOutcome::Duplicate(existing.clone()));
            }
        }

        let entry = ScoreEntry {
            id: tables.next_id(),
            user_id: new.user_id,
            subject_id: new.subject_id,
            mode: new.mode,
            correct_answers: new.correct_answers,
            incorrect_answers: new.incorrect_answers,
            total_questions: new.total_questions,
            score: new.score,
            time_taken_seconds: new.time_taken_seconds,
            request_id: new.request_id,
            created_at: new.created_at,
        };
        tables.scores.push(entry.clone());
        Ok(RecordOutcome::Inserted(entry))
    }

    async fn user_totals(&self, user_id: i64) -> Result<ScoreTotals, AppError> {
        let tables = self.tables.read().await;
        let totals = tables
            .scores
            .iter()
            .filter(|s| s.user_id == user_id)
            .fold(ScoreTotals::default(), |mut acc, s| {
                acc.total_quizzes += 1;
                acc.correct_answers += s.correct_answers;
                acc.incorrect_answers += s.incorrect_answers;
                acc.total_questions += s.total_questions;
                acc
            });
        Ok(totals)
    }

    async fn recent_entries(&self, user_id: i64, limit: i64) -> Result<Vec<ScoreEntry>, AppError> {
        let tables = self.tables.read().await;
        let mut entries: Vec<ScoreEntry> = tables
            .scores
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        entries.truncate(limit.max(0) as usize);
        Ok(entries)
    }

    async fn standings(
        &self,
        filter: &LedgerFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Standing>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .standings(filter)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn ranked_user_count(&self, filter: &LedgerFilter) -> Result<i64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.standings(filter).len() as i64)
    }

    async fn user_standing(
        &self,
        user_id: i64,
        filter: &LedgerFilter,
    ) -> Result<Option<(Standing, i64)>, AppError> {
        let tables = self.tables.read().await;
        let standings = tables.standings(filter);
        let Some(rank) = ranking::competition_rank(&standings, user_id) else {
            return Ok(None);
        };
        Ok(standings
            .into_iter()
            .find(|s| s.user_id == user_id)
            .map(|s| (s, rank)))
    }
}
