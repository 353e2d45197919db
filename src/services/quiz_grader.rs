// src/services/quiz_grader.rs

use chrono::{DateTime, Utc};

use crate::{
    config::{DEFAULT_SCORE_MODE, GradingMode},
    error::AppError,
    models::{
        quiz::{AttemptResult, QuestionResult, SubmitQuizRequest},
        score::NewScoreEntry,
    },
    repository::{QuestionStore, ScoreLedger},
};

/// Percentage of a quiz answered correctly, truncated toward zero.
/// Returns 0 when the quiz had no questions.
pub fn calculate_quiz_score(total_questions: i64, score: i64) -> i64 {
    if total_questions == 0 {
        return 0;
    }
    score * 100 / total_questions
}

/// Grades a submission and appends exactly one score entry for it.
///
/// * An answer is correct iff the selected ids include the question's canonical
///   correct option. Multi-select questions are not required to match every
///   correct option.
/// * One point per correct answer.
/// * The attempt is filed under the subject of the first question resolved.
/// * Answers to unknown questions are skipped in `Lenient` mode and fail the
///   submission in `Strict` mode. Skipped answers are not counted in the total.
///
/// Grading and the ledger write are one unit: if the write fails no result is returned.
pub async fn grade_submission(
    questions: &dyn QuestionStore,
    ledger: &dyn ScoreLedger,
    mode: GradingMode,
    user_id: i64,
    submission: &SubmitQuizRequest,
    now: DateTime<Utc>,
) -> Result<AttemptResult, AppError> {
    if user_id <= 0 {
        return Err(AppError::BadRequest("user id must be positive".to_string()));
    }
    if submission.answers.is_empty() {
        return Err(AppError::BadRequest("No answers submitted".to_string()));
    }
    for answer in &submission.answers {
        if answer.question_id <= 0 {
            return Err(AppError::BadRequest("question_id must be positive".to_string()));
        }
        if answer.option_ids.is_empty() || answer.option_ids.iter().any(|&id| id <= 0) {
            return Err(AppError::BadRequest(format!(
                "question {} needs at least one positive option id",
                answer.question_id
            )));
        }
    }

    let mut subject_id: Option<i64> = None;
    let mut correct_answers = 0i64;
    let mut incorrect_answers = 0i64;
    let mut results = Vec::with_capacity(submission.answers.len());

    for answer in &submission.answers {
        let Some(question) = questions.question_by_id(answer.question_id).await? else {
            match mode {
                GradingMode::Lenient => {
                    tracing::warn!(
                        "Skipping answer to unknown question {} (user {})",
                        answer.question_id,
                        user_id
                    );
                    continue;
                }
                GradingMode::Strict => {
                    return Err(AppError::NotFound(format!(
                        "Question {} not found",
                        answer.question_id
                    )));
                }
            }
        };

        subject_id.get_or_insert(question.subject_id);

        let correct_option = questions
            .correct_option(question.id)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!("question {} has no correct option", question.id))
            })?;

        let is_correct = answer.option_ids.contains(&correct_option.id);
        if is_correct {
            correct_answers += 1;
        } else {
            incorrect_answers += 1;
        }

        let mut selected_options = Vec::with_capacity(answer.option_ids.len());
        for &option_id in &answer.option_ids {
            match questions.option_by_id(option_id).await? {
                Some(opt) if opt.question_id == question.id => selected_options.push(opt.option),
                _ => tracing::debug!(
                    "Option {} does not belong to question {}",
                    option_id,
                    question.id
                ),
            }
        }

        let explanation = questions.explanation(question.id).await?.unwrap_or_default();

        results.push(QuestionResult {
            question_id: question.id,
            question: question.question,
            selected_options,
            correct_answer: correct_option.option,
            is_correct,
            explanation,
        });
    }

    let subject_id = subject_id
        .ok_or(AppError::NotFound("None of the submitted questions exist".to_string()))?;

    let total_questions = correct_answers + incorrect_answers;
    let score = correct_answers;

    let outcome = ledger
        .record(NewScoreEntry {
            user_id,
            subject_id,
            mode: DEFAULT_SCORE_MODE.to_string(),
            correct_answers,
            incorrect_answers,
            total_questions,
            score,
            time_taken_seconds: submission.time_taken_seconds.unwrap_or(0),
            request_id: submission.request_id.clone(),
            created_at: now,
        })
        .await
        .map_err(|e| {
            tracing::error!("Failed to record score for user {}: {:?}", user_id, e);
            e
        })?;

    // A replay reports what the ledger holds, not what was just graded.
    let recorded = outcome.entry();
    if outcome.is_duplicate() {
        tracing::info!(
            "Replayed submission {:?} for user {} (score entry {})",
            submission.request_id,
            user_id,
            recorded.id
        );
    }

    Ok(AttemptResult {
        user_id,
        subject_id: recorded.subject_id,
        total_questions: recorded.total_questions,
        correct_answers: recorded.correct_answers,
        incorrect_answers: recorded.incorrect_answers,
        score: recorded.score,
        score_percent: calculate_quiz_score(recorded.total_questions, recorded.score),
        score_id: recorded.id,
        replayed: outcome.is_duplicate(),
        results,
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        models::{
            leaderboard::Standing,
            question::{NewOptionRequest, NewQuestion, QuestionDetail},
            quiz::AnswerSubmission,
            score::{RecordOutcome, ScoreEntry, ScoreTotals},
        },
        repository::{LedgerFilter, MemoryStore},
    };

    struct Fixture {
        store: MemoryStore,
        user_id: i64,
        capital: QuestionDetail,
        primes: QuestionDetail,
    }

    impl Fixture {
        fn option_id(detail: &QuestionDetail, text: &str) -> i64 {
            detail.options.iter().find(|o| o.option == text).unwrap().id
        }
    }

    fn option(text: &str, is_correct: bool) -> NewOptionRequest {
        NewOptionRequest {
            option: text.to_string(),
            is_correct,
        }
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let user_id = store.insert_user("alice").await;
        let subject = store.create_subject("General Knowledge").await.unwrap();

        let capital = store
            .create_question(NewQuestion {
                subject_id: subject.id,
                question: "What is the capital of France?".to_string(),
                is_multiple_choice: false,
                options: vec![
                    option("Paris", true),
                    option("London", false),
                    option("Berlin", false),
                ],
                explanation: "Paris is the capital of France.".to_string(),
            })
            .await
            .unwrap();

        let primes = store
            .create_question(NewQuestion {
                subject_id: subject.id,
                question: "Which numbers are prime?".to_string(),
                is_multiple_choice: true,
                options: vec![
                    option("2", true),
                    option("3", true),
                    option("4", false),
                ],
                explanation: "4 = 2 * 2.".to_string(),
            })
            .await
            .unwrap();

        Fixture {
            store,
            user_id,
            capital,
            primes,
        }
    }

    fn submit(answers: Vec<(i64, Vec<i64>)>) -> SubmitQuizRequest {
        SubmitQuizRequest {
            answers: answers
                .into_iter()
                .map(|(question_id, option_ids)| AnswerSubmission {
                    question_id,
                    option_ids,
                })
                .collect(),
            request_id: None,
            time_taken_seconds: None,
        }
    }

    async fn grade(
        f: &Fixture,
        mode: GradingMode,
        req: &SubmitQuizRequest,
    ) -> Result<AttemptResult, AppError> {
        grade_submission(&f.store, &f.store, mode, f.user_id, req, Utc::now()).await
    }

    #[test]
    fn quiz_score_truncates() {
        assert_eq!(calculate_quiz_score(0, 0), 0);
        assert_eq!(calculate_quiz_score(3, 1), 33);
        assert_eq!(calculate_quiz_score(3, 2), 66);
        assert_eq!(calculate_quiz_score(4, 4), 100);
    }

    #[tokio::test]
    async fn grades_correct_single_choice_answer() {
        let f = fixture().await;
        let paris = Fixture::option_id(&f.capital, "Paris");
        let req = submit(vec![(f.capital.question.id, vec![paris])]);

        let result = grade(&f, GradingMode::Lenient, &req).await.unwrap();

        assert_eq!(result.score, 1);
        assert_eq!(result.correct_answers, 1);
        assert_eq!(result.incorrect_answers, 0);
        assert_eq!(result.total_questions, 1);
        assert_eq!(result.score_percent, 100);
        assert!(result.results[0].is_correct);
        assert_eq!(result.results[0].selected_options, vec!["Paris"]);
        assert_eq!(result.results[0].correct_answer, "Paris");
        assert_eq!(result.results[0].explanation, "Paris is the capital of France.");

        let entries = f.store.recent_entries(f.user_id, 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].correct_answers, 1);
        assert_eq!(entries[0].incorrect_answers, 0);
        assert_eq!(entries[0].total_questions, 1);
        assert_eq!(entries[0].mode, "practice");
    }

    #[tokio::test]
    async fn wrong_answer_reveals_correct_one() {
        let f = fixture().await;
        let london = Fixture::option_id(&f.capital, "London");
        let req = submit(vec![(f.capital.question.id, vec![london])]);

        let result = grade(&f, GradingMode::Lenient, &req).await.unwrap();

        assert_eq!(result.score, 0);
        assert_eq!(result.incorrect_answers, 1);
        assert!(!result.results[0].is_correct);
        assert_eq!(result.results[0].correct_answer, "Paris");
    }

    #[tokio::test]
    async fn multi_select_only_needs_canonical_option() {
        let f = fixture().await;
        let two = Fixture::option_id(&f.primes, "2");
        let three = Fixture::option_id(&f.primes, "3");
        let four = Fixture::option_id(&f.primes, "4");

        // "2" is the canonical (lowest id) correct option.
        let with_canonical = submit(vec![(f.primes.question.id, vec![two, four])]);
        let without_canonical = submit(vec![(f.primes.question.id, vec![three])]);

        let accepted = grade(&f, GradingMode::Lenient, &with_canonical).await.unwrap();
        let rejected = grade(&f, GradingMode::Lenient, &without_canonical).await.unwrap();
        assert!(accepted.results[0].is_correct);
        assert!(!rejected.results[0].is_correct);
    }

    #[tokio::test]
    async fn lenient_mode_skips_unknown_questions() {
        let f = fixture().await;
        let paris = Fixture::option_id(&f.capital, "Paris");
        let req = submit(vec![(9999, vec![1]), (f.capital.question.id, vec![paris])]);

        let result = grade(&f, GradingMode::Lenient, &req).await.unwrap();

        assert_eq!(result.total_questions, 1);
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.correct_answers + result.incorrect_answers, result.total_questions);
    }

    #[tokio::test]
    async fn strict_mode_rejects_unknown_questions() {
        let f = fixture().await;
        let paris = Fixture::option_id(&f.capital, "Paris");
        let req = submit(vec![(f.capital.question.id, vec![paris]), (9999, vec![1])]);

        let err = grade(&f, GradingMode::Strict, &req).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(f.store.recent_entries(f.user_id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn all_unknown_questions_is_not_found() {
        let f = fixture().await;
        let req = submit(vec![(9998, vec![1]), (9999, vec![1])]);
        let err = grade(&f, GradingMode::Lenient, &req).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn rejects_empty_or_malformed_submissions() {
        let f = fixture().await;
        let empty = submit(vec![]);
        let no_options = submit(vec![(f.capital.question.id, vec![])]);

        for req in [&empty, &no_options] {
            let err = grade(&f, GradingMode::Lenient, req).await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }
    }

    #[tokio::test]
    async fn foreign_option_ids_are_not_displayed() {
        let f = fixture().await;
        let two = Fixture::option_id(&f.primes, "2");
        let paris = Fixture::option_id(&f.capital, "Paris");
        let req = submit(vec![(f.capital.question.id, vec![paris, two])]);

        let result = grade(&f, GradingMode::Lenient, &req).await.unwrap();
        assert_eq!(result.results[0].selected_options, vec!["Paris"]);
    }

    #[tokio::test]
    async fn counts_always_add_up() {
        let f = fixture().await;
        let paris = Fixture::option_id(&f.capital, "Paris");
        let four = Fixture::option_id(&f.primes, "4");
        let req = submit(vec![
            (f.capital.question.id, vec![paris]),
            (f.primes.question.id, vec![four]),
            (12345, vec![1]),
        ]);

        grade(&f, GradingMode::Lenient, &req).await.unwrap();

        for entry in f.store.recent_entries(f.user_id, 10).await.unwrap() {
            assert_eq!(entry.correct_answers + entry.incorrect_answers, entry.total_questions);
        }
    }

    #[tokio::test]
    async fn resubmitting_without_request_id_scores_twice() {
        let f = fixture().await;
        let paris = Fixture::option_id(&f.capital, "Paris");
        let req = submit(vec![(f.capital.question.id, vec![paris])]);

        let first = grade(&f, GradingMode::Lenient, &req).await.unwrap();
        let second = grade(&f, GradingMode::Lenient, &req).await.unwrap();

        assert_ne!(first.score_id, second.score_id);
        assert!(!second.replayed);
        assert_eq!(f.store.recent_entries(f.user_id, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn resubmitting_with_request_id_scores_once() {
        let f = fixture().await;
        let paris = Fixture::option_id(&f.capital, "Paris");
        let mut req = submit(vec![(f.capital.question.id, vec![paris])]);
        req.request_id = Some("attempt-1".to_string());

        let first = grade(&f, GradingMode::Lenient, &req).await.unwrap();
        let second = grade(&f, GradingMode::Lenient, &req).await.unwrap();

        assert_eq!(first.score_id, second.score_id);
        assert!(second.replayed);
        assert_eq!(f.store.recent_entries(f.user_id, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn replay_reports_the_recorded_attempt() {
        let f = fixture().await;
        let london = Fixture::option_id(&f.capital, "London");
        let paris = Fixture::option_id(&f.capital, "Paris");

        let mut first = submit(vec![(f.capital.question.id, vec![london])]);
        first.request_id = Some("attempt-7".to_string());
        let mut retry = submit(vec![(f.capital.question.id, vec![paris])]);
        retry.request_id = Some("attempt-7".to_string());

        let original = grade(&f, GradingMode::Lenient, &first).await.unwrap();
        let replayed = grade(&f, GradingMode::Lenient, &retry).await.unwrap();

        let stored = f.store.recent_entries(f.user_id, 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(replayed.replayed);
        assert_eq!(replayed.score_id, stored[0].id);
        assert_eq!(replayed.score, stored[0].score);
        assert_eq!(replayed.score, 0);
        assert_eq!(replayed.correct_answers, stored[0].correct_answers);
        assert_eq!(replayed.incorrect_answers, stored[0].incorrect_answers);
        assert_eq!(replayed.total_questions, stored[0].total_questions);
        assert_eq!(replayed.score_percent, original.score_percent);
    }

    /// Ledger whose writes always fail.
    struct BrokenLedger;

    #[async_trait]
    impl ScoreLedger for BrokenLedger {
        async fn record(&self, _entry: NewScoreEntry) -> Result<RecordOutcome, AppError> {
            Err(AppError::internal("disk full"))
        }
        async fn user_totals(&self, _user_id: i64) -> Result<ScoreTotals, AppError> {
            Ok(ScoreTotals::default())
        }
        async fn recent_entries(
            &self,
            _user_id: i64,
            _limit: i64,
        ) -> Result<Vec<ScoreEntry>, AppError> {
            Ok(vec![])
        }
        async fn standings(
            &self,
            _filter: &LedgerFilter,
            _limit: i64,
            _offset: i64,
        ) -> Result<Vec<Standing>, AppError> {
            Ok(vec![])
        }
        async fn ranked_user_count(&self, _filter: &LedgerFilter) -> Result<i64, AppError> {
            Ok(0)
        }
        async fn user_standing(
            &self,
            _user_id: i64,
            _filter: &LedgerFilter,
        ) -> Result<Option<(Standing, i64)>, AppError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn ledger_failure_fails_the_whole_grading() {
        let f = fixture().await;
        let paris = Fixture::option_id(&f.capital, "Paris");
        let req = submit(vec![(f.capital.question.id, vec![paris])]);

        let err = grade_submission(
            &f.store,
            &BrokenLedger,
            GradingMode::Lenient,
            f.user_id,
            &req,
            Utc::now(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::InternalServerError(_)));
    }
}
