// src/repository/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use crate::{
    error::AppError,
    models::{
        leaderboard::Standing,
        question::{NewQuestion, Question, QuestionDetail, QuestionOption},
        score::{NewScoreEntry, RecordOutcome, ScoreEntry, ScoreTotals},
        subject::Subject,
    },
    repository::{LedgerFilter, QuestionStore, ScoreLedger},
};

const QUESTION_COLUMNS: &str =
    "id, subject_id, question, is_multiple_choice, created_at, updated_at";

const OPTION_COLUMNS: &str = "id, question_id, option_text, is_correct";

const SCORE_COLUMNS: &str = "id, user_id, subject_id, mode, correct_answers, incorrect_answers, \
     total_questions, score, time_taken_seconds, request_id, created_at";

/// Aggregate per user over the filtered ledger. `$1` subject, `$2` cutoff.
const STANDINGS_CTE: &str = r#"
    SELECT
        u.id AS user_id,
        u.name AS user_name,
        COALESCE(SUM(s.score), 0)::BIGINT AS total_score,
        COUNT(s.id) AS total_quizzes,
        COALESCE(SUM(s.correct_answers), 0)::BIGINT AS correct_answers,
        COALESCE(SUM(s.total_questions), 0)::BIGINT AS total_questions
    FROM users u
    INNER JOIN scores s ON u.id = s.user_id
    WHERE ($1::BIGINT IS NULL OR s.subject_id = $1)
      AND ($2::TIMESTAMPTZ IS NULL OR s.created_at >= $2)
    GROUP BY u.id, u.name
"#;

/// Postgres-backed implementation of both repository traits.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

/// Inserts one question with its options and explanation on an open connection.
/// Callers own the transaction.
async fn insert_question(
    conn: &mut PgConnection,
    new: NewQuestion,
) -> Result<QuestionDetail, AppError> {
    let question = sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (subject_id, question, is_multiple_choice) \
         VALUES ($1, $2, $3) RETURNING {QUESTION_COLUMNS}"
    ))
    .bind(new.subject_id)
    .bind(&new.question)
    .bind(new.is_multiple_choice)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        tracing::error!("Failed to insert question: {:?}", e);
        AppError::from(e)
    })?;

    let mut options = Vec::with_capacity(new.options.len());
    for opt in &new.options {
        let option = sqlx::query_as::<_, QuestionOption>(&format!(
            "INSERT INTO options (question_id, option_text, is_correct) \
             VALUES ($1, $2, $3) RETURNING {OPTION_COLUMNS}"
        ))
        .bind(question.id)
        .bind(&opt.option)
        .bind(opt.is_correct)
        .fetch_one(&mut *conn)
        .await?;
        options.push(option);
    }

    sqlx::query("INSERT INTO explanations (question_id, explanation) VALUES ($1, $2)")
        .bind(question.id)
        .bind(&new.explanation)
        .execute(&mut *conn)
        .await?;

    Ok(QuestionDetail {
        question,
        options,
        explanation: new.explanation,
    })
}

#[async_trait]
impl QuestionStore for PgStore {
    async fn list_subjects(&self) -> Result<Vec<Subject>, AppError> {
        let subjects = sqlx::query_as::<_, Subject>(
            "SELECT id, name, created_at FROM subjects ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(subjects)
    }

    async fn subject_by_id(&self, id: i64) -> Result<Option<Subject>, AppError> {
        let subject = sqlx::query_as::<_, Subject>(
            "SELECT id, name, created_at FROM subjects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(subject)
    }

    async fn create_subject(&self, name: &str) -> Result<Subject, AppError> {
        sqlx::query_as::<_, Subject>(
            "INSERT INTO subjects (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Subject '{}' already exists", name))
            } else {
                tracing::error!("Failed to create subject: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn random_question(&self, subject_id: i64) -> Result<Option<Question>, AppError> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions \
             WHERE subject_id = $1 ORDER BY RANDOM() LIMIT 1"
        ))
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    async fn question_by_id(&self, id: i64) -> Result<Option<Question>, AppError> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    async fn options_for_question(
        &self,
        question_id: i64,
    ) -> Result<Vec<QuestionOption>, AppError> {
        let options = sqlx::query_as::<_, QuestionOption>(&format!(
            "SELECT {OPTION_COLUMNS} FROM options WHERE question_id = $1 ORDER BY id"
        ))
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(options)
    }

    async fn option_by_id(&self, id: i64) -> Result<Option<QuestionOption>, AppError> {
        let option = sqlx::query_as::<_, QuestionOption>(&format!(
            "SELECT {OPTION_COLUMNS} FROM options WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(option)
    }

    async fn correct_option(&self, question_id: i64) -> Result<Option<QuestionOption>, AppError> {
        let option = sqlx::query_as::<_, QuestionOption>(&format!(
            "SELECT {OPTION_COLUMNS} FROM options \
             WHERE question_id = $1 AND is_correct = TRUE ORDER BY id LIMIT 1"
        ))
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(option)
    }

    async fn explanation(&self, question_id: i64) -> Result<Option<String>, AppError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT explanation FROM explanations WHERE question_id = $1")
                .bind(question_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(explanation,)| explanation))
    }

    async fn create_question(&self, new: NewQuestion) -> Result<QuestionDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        let detail = insert_question(&mut *tx, new).await?;
        tx.commit().await?;
        Ok(detail)
    }

    async fn create_questions(
        &self,
        questions: Vec<NewQuestion>,
    ) -> Result<Vec<QuestionDetail>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(questions.len());
        for new in questions {
            // Dropping `tx` on error rolls the whole batch back.
            created.push(insert_question(&mut *tx, new).await?);
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn list_questions(
        &self,
        subject_id: Option<i64>,
    ) -> Result<Vec<QuestionDetail>, AppError> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions \
             WHERE ($1::BIGINT IS NULL OR subject_id = $1) ORDER BY id"
        ))
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list questions: {:?}", e);
            AppError::from(e)
        })?;

        let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();

        let options = sqlx::query_as::<_, QuestionOption>(&format!(
            "SELECT {OPTION_COLUMNS} FROM options WHERE question_id = ANY($1) ORDER BY id"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let explanations: Vec<(i64, String)> = sqlx::query_as(
            "SELECT question_id, explanation FROM explanations WHERE question_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut options_by_question: HashMap<i64, Vec<QuestionOption>> = HashMap::new();
        for option in options {
            options_by_question
                .entry(option.question_id)
                .or_default()
                .push(option);
        }
        let mut explanations: HashMap<i64, String> = explanations.into_iter().collect();

        Ok(questions
            .into_iter()
            .map(|question| QuestionDetail {
                options: options_by_question.remove(&question.id).unwrap_or_default(),
                explanation: explanations.remove(&question.id).unwrap_or_default(),
                question,
            })
            .collect())
    }
}

#[async_trait]
impl ScoreLedger for PgStore {
    async fn record(&self, new: NewScoreEntry) -> Result<RecordOutcome, AppError> {
        // NULL request ids never collide, so plain retries still append.
        let inserted = sqlx::query_as::<_, ScoreEntry>(&format!(
            r#"
            INSERT INTO scores (
                user_id, subject_id, mode, correct_answers, incorrect_answers,
                total_questions, score, time_taken_seconds, request_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id, request_id) DO NOTHING
            RETURNING {SCORE_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.subject_id)
        .bind(&new.mode)
        .bind(new.correct_answers)
        .bind(new.incorrect_answers)
        .bind(new.total_questions)
        .bind(new.score)
        .bind(new.time_taken_seconds)
        .bind(&new.request_id)
        .bind(new.created_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert score entry: {:?}", e);
            AppError::from(e)
        })?;

        if let Some(entry) = inserted {
            return Ok(RecordOutcome::Inserted(entry));
        }

        let existing = sqlx::query_as::<_, ScoreEntry>(&format!(
            "SELECT {SCORE_COLUMNS} FROM scores WHERE user_id = $1 AND request_id = $2"
        ))
        .bind(new.user_id)
        .bind(&new.request_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(RecordOutcome::Duplicate(existing))
    }

    async fn user_totals(&self, user_id: i64) -> Result<ScoreTotals, AppError> {
        let totals = sqlx::query_as::<_, ScoreTotals>(
            r#"
            SELECT
                COUNT(id) AS total_quizzes,
                COALESCE(SUM(correct_answers), 0)::BIGINT AS correct_answers,
                COALESCE(SUM(incorrect_answers), 0)::BIGINT AS incorrect_answers,
                COALESCE(SUM(total_questions), 0)::BIGINT AS total_questions
            FROM scores
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }

    async fn recent_entries(&self, user_id: i64, limit: i64) -> Result<Vec<ScoreEntry>, AppError> {
        let entries = sqlx::query_as::<_, ScoreEntry>(&format!(
            "SELECT {SCORE_COLUMNS} FROM scores WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn standings(
        &self,
        filter: &LedgerFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Standing>, AppError> {
        let standings = sqlx::query_as::<_, Standing>(&format!(
            "{STANDINGS_CTE} \
             ORDER BY total_score DESC, correct_answers DESC, u.id ASC \
             LIMIT $3 OFFSET $4"
        ))
        .bind(filter.subject_id)
        .bind(filter.since)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch leaderboard: {:?}", e);
            AppError::from(e)
        })?;
        Ok(standings)
    }

    async fn ranked_user_count(&self, filter: &LedgerFilter) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(DISTINCT s.user_id)
            FROM scores s
            INNER JOIN users u ON u.id = s.user_id
            WHERE ($1::BIGINT IS NULL OR s.subject_id = $1)
              AND ($2::TIMESTAMPTZ IS NULL OR s.created_at >= $2)
            "#,
        )
        .bind(filter.subject_id)
        .bind(filter.since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn user_standing(
        &self,
        user_id: i64,
        filter: &LedgerFilter,
    ) -> Result<Option<(Standing, i64)>, AppError> {
        #[derive(sqlx::FromRow)]
        struct RankedRow {
            #[sqlx(flatten)]
            standing: Standing,
            rank: i64,
        }

        let row = sqlx::query_as::<_, RankedRow>(&format!(
            r#"
            WITH standings AS ({STANDINGS_CTE}),
            ranked AS (
                SELECT *, RANK() OVER (ORDER BY total_score DESC, correct_answers DESC) AS rank
                FROM standings
            )
            SELECT user_id, user_name, total_score, total_quizzes, correct_answers,
                   total_questions, rank
            FROM ranked
            WHERE user_id = $3
            "#
        ))
        .bind(filter.subject_id)
        .bind(filter.since)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| (r.standing, r.rank)))
    }
}
