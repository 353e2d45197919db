// src/services/leaderboard.rs

use chrono::{DateTime, Duration, Utc};

use crate::{
    config::{
        DEFAULT_LEADERBOARD_LIMIT, MAX_LEADERBOARD_LIMIT, MONTHLY_WINDOW_DAYS, WEEKLY_WINDOW_DAYS,
    },
    error::AppError,
    models::leaderboard::{LeaderboardResponse, Period, UserRankResponse},
    ranking,
    repository::{LedgerFilter, QuestionStore, ScoreLedger},
};

/// Which slice of the score ledger a leaderboard ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardScope {
    Global(Period),
    /// Subject leaderboards are always all-time.
    Subject(i64),
}

impl LeaderboardScope {
    /// A subject id wins over the period; a missing period means all-time.
    pub fn from_params(subject_id: Option<i64>, period: Option<Period>) -> Result<Self, AppError> {
        match subject_id {
            Some(id) if id <= 0 => Err(AppError::BadRequest(
                "subject_id must be positive".to_string(),
            )),
            Some(id) => Ok(LeaderboardScope::Subject(id)),
            None => Ok(LeaderboardScope::Global(period.unwrap_or_default())),
        }
    }

    pub fn period(&self) -> Period {
        match self {
            LeaderboardScope::Global(period) => *period,
            LeaderboardScope::Subject(_) => Period::AllTime,
        }
    }

    /// Ledger filter at instant `now`. Window cutoffs are inclusive (`created_at >= cutoff`).
    pub fn filter(&self, now: DateTime<Utc>) -> LedgerFilter {
        match self {
            LeaderboardScope::Subject(id) => LedgerFilter {
                subject_id: Some(*id),
                since: None,
            },
            LeaderboardScope::Global(Period::AllTime) => LedgerFilter::default(),
            LeaderboardScope::Global(Period::Weekly) => LedgerFilter {
                subject_id: None,
                since: Some(now - Duration::days(WEEKLY_WINDOW_DAYS)),
            },
            LeaderboardScope::Global(Period::Monthly) => LedgerFilter {
                subject_id: None,
                since: Some(now - Duration::days(MONTHLY_WINDOW_DAYS)),
            },
        }
    }
}

/// Limit/offset page over the full ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, AppError> {
        let limit = limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
        let offset = offset.unwrap_or(0);
        if !(1..=MAX_LEADERBOARD_LIMIT).contains(&limit) {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {}",
                MAX_LEADERBOARD_LIMIT
            )));
        }
        if offset < 0 {
            return Err(AppError::BadRequest("offset must not be negative".to_string()));
        }
        Ok(Page { limit, offset })
    }
}

impl Default for Page {
    fn default() -> Self {
        Page {
            limit: DEFAULT_LEADERBOARD_LIMIT,
            offset: 0,
        }
    }
}

/// Ranks every user with score entries in `scope`, recomputed on each call.
/// Ranks are positions in the full ordering, so page two starts at `offset + 1`.
pub async fn leaderboard(
    questions: &dyn QuestionStore,
    ledger: &dyn ScoreLedger,
    scope: LeaderboardScope,
    page: Page,
    now: DateTime<Utc>,
) -> Result<LeaderboardResponse, AppError> {
    let subject = match scope {
        LeaderboardScope::Subject(id) => Some(
            questions
                .subject_by_id(id)
                .await?
                .ok_or(AppError::NotFound("Subject not found".to_string()))?,
        ),
        LeaderboardScope::Global(_) => None,
    };

    let filter = scope.filter(now);
    let total_users = ledger.ranked_user_count(&filter).await?;
    let standings = ledger.standings(&filter, page.limit, page.offset).await?;

    Ok(LeaderboardResponse {
        subject_id: subject.as_ref().map(|s| s.id),
        subject_name: subject.map(|s| s.name),
        period: scope.period(),
        total_users,
        entries: ranking::rank_page(standings, page.offset),
    })
}

/// A single user's position in `scope`. `NotFound` when they have not played in it.
pub async fn user_rank(
    ledger: &dyn ScoreLedger,
    user_id: i64,
    scope: LeaderboardScope,
    now: DateTime<Utc>,
) -> Result<UserRankResponse, AppError> {
    if user_id <= 0 {
        return Err(AppError::BadRequest("user id must be positive".to_string()));
    }

    let filter = scope.filter(now);
    let (standing, rank) = ledger
        .user_standing(user_id, &filter)
        .await?
        .ok_or(AppError::NotFound("User has no ranked scores".to_string()))?;
    let total_users = ledger.ranked_user_count(&filter).await?;

    Ok(UserRankResponse {
        user_id: standing.user_id,
        user_name: standing.user_name,
        rank,
        total_score: standing.total_score,
        total_quizzes: standing.total_quizzes,
        correct_answers: standing.correct_answers,
        total_questions: standing.total_questions,
        accuracy_percent: ranking::accuracy_percent(
            standing.correct_answers,
            standing.total_questions,
        ),
        total_users,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::score::NewScoreEntry, repository::MemoryStore};

    struct Fixture {
        store: MemoryStore,
        subject_id: i64,
        other_subject_id: i64,
        now: DateTime<Utc>,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let subject_id = store.create_subject("Mathematics").await.unwrap().id;
        let other_subject_id = store.create_subject("History").await.unwrap().id;
        Fixture {
            store,
            subject_id,
            other_subject_id,
            now: Utc::now(),
        }
    }

    impl Fixture {
        async fn play(
            &self,
            user_id: i64,
            subject_id: i64,
            correct: i64,
            total: i64,
            at: DateTime<Utc>,
        ) {
            self.store
                .record(NewScoreEntry {
                    user_id,
                    subject_id,
                    mode: "practice".to_string(),
                    correct_answers: correct,
                    incorrect_answers: total - correct,
                    total_questions: total,
                    score: correct,
                    time_taken_seconds: 0,
                    request_id: None,
                    created_at: at,
                })
                .await
                .unwrap();
        }

        async fn board(&self, scope: LeaderboardScope, page: Page) -> LeaderboardResponse {
            leaderboard(&self.store, &self.store, scope, page, self.now).await.unwrap()
        }
    }

    #[test]
    fn scope_prefers_subject_over_period() {
        assert_eq!(
            LeaderboardScope::from_params(Some(3), Some(Period::Weekly)).unwrap(),
            LeaderboardScope::Subject(3)
        );
        assert_eq!(
            LeaderboardScope::from_params(None, None).unwrap(),
            LeaderboardScope::Global(Period::AllTime)
        );
        assert!(LeaderboardScope::from_params(Some(0), None).is_err());
    }

    #[test]
    fn page_bounds() {
        assert_eq!(Page::new(None, None).unwrap(), Page::default());
        assert!(Page::new(Some(0), None).is_err());
        assert!(Page::new(Some(101), None).is_err());
        assert!(Page::new(Some(10), Some(-1)).is_err());
    }

    #[tokio::test]
    async fn empty_ledger_is_an_empty_success() {
        let f = fixture().await;
        let board = f.board(LeaderboardScope::Global(Period::AllTime), Page::default()).await;
        assert_eq!(board.total_users, 0);
        assert!(board.entries.is_empty());
        assert_eq!(board.period, Period::AllTime);
    }

    #[tokio::test]
    async fn orders_by_score_then_correct_answers() {
        let f = fixture().await;
        let alice = f.store.insert_user("alice").await;
        let bob = f.store.insert_user("bob").await;
        let carol = f.store.insert_user("carol").await;

        f.play(alice, f.subject_id, 3, 5, f.now).await;
        f.play(bob, f.subject_id, 5, 5, f.now).await;
        f.play(carol, f.subject_id, 1, 1, f.now).await;
        f.play(carol, f.subject_id, 2, 4, f.now).await;

        let board = f.board(LeaderboardScope::Global(Period::AllTime), Page::default()).await;
        let order: Vec<&str> = board.entries.iter().map(|e| e.user_name.as_str()).collect();
        assert_eq!(order, vec!["bob", "alice", "carol"]);
        assert_eq!(board.total_users, 3);

        let carol_row = &board.entries[2];
        assert_eq!(carol_row.rank, 3);
        assert_eq!(carol_row.total_quizzes, 2);
        assert_eq!(carol_row.total_questions, 5);
        assert_eq!(carol_row.accuracy_percent, 60.0);
    }

    #[tokio::test]
    async fn pages_keep_global_rank() {
        let f = fixture().await;
        for i in 0..5 {
            let user = f.store.insert_user(&format!("user{}", i)).await;
            f.play(user, f.subject_id, i, 5, f.now).await;
        }

        let page = Page::new(Some(2), Some(2)).unwrap();
        let board = f.board(LeaderboardScope::Global(Period::AllTime), page).await;

        assert_eq!(board.total_users, 5);
        let ranks: Vec<i64> = board.entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![3, 4]);
        assert_eq!(board.entries[0].total_score, 2);
    }

    #[tokio::test]
    async fn weekly_cutoff_is_inclusive() {
        let f = fixture().await;
        let on_edge = f.store.insert_user("on_edge").await;
        let just_outside = f.store.insert_user("just_outside").await;

        let cutoff = f.now - Duration::days(WEEKLY_WINDOW_DAYS);
        f.play(on_edge, f.subject_id, 1, 1, cutoff).await;
        f.play(just_outside, f.subject_id, 1, 1, cutoff - Duration::seconds(1)).await;

        let weekly = f.board(LeaderboardScope::Global(Period::Weekly), Page::default()).await;
        assert_eq!(weekly.total_users, 1);
        assert_eq!(weekly.entries[0].user_id, on_edge);
        assert_eq!(weekly.period, Period::Weekly);

        let all_time = f.board(LeaderboardScope::Global(Period::AllTime), Page::default()).await;
        assert_eq!(all_time.total_users, 2);
    }

    #[tokio::test]
    async fn monthly_cutoff_is_inclusive() {
        let f = fixture().await;
        let on_edge = f.store.insert_user("on_edge").await;
        let just_outside = f.store.insert_user("just_outside").await;

        let cutoff = f.now - Duration::days(MONTHLY_WINDOW_DAYS);
        f.play(on_edge, f.subject_id, 1, 1, cutoff).await;
        f.play(just_outside, f.subject_id, 1, 1, cutoff - Duration::milliseconds(1)).await;

        let monthly = f.board(LeaderboardScope::Global(Period::Monthly), Page::default()).await;
        assert_eq!(monthly.total_users, 1);
        assert_eq!(monthly.entries[0].user_id, on_edge);

        let monthly_scope = LeaderboardScope::Global(Period::Monthly);
        let rank = user_rank(&f.store, just_outside, monthly_scope, f.now)
            .await
            .unwrap_err();
        assert!(matches!(rank, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn subject_scope_filters_and_names_subject() {
        let f = fixture().await;
        let alice = f.store.insert_user("alice").await;
        let bob = f.store.insert_user("bob").await;
        f.play(alice, f.subject_id, 2, 2, f.now).await;
        f.play(bob, f.other_subject_id, 9, 9, f.now).await;

        let board = f.board(LeaderboardScope::Subject(f.subject_id), Page::default()).await;

        assert_eq!(board.subject_id, Some(f.subject_id));
        assert_eq!(board.subject_name.as_deref(), Some("Mathematics"));
        assert_eq!(board.total_users, 1);
        assert_eq!(board.entries[0].user_id, alice);
    }

    #[tokio::test]
    async fn unknown_subject_is_not_found() {
        let f = fixture().await;
        let scope = LeaderboardScope::Subject(999);
        let err = leaderboard(&f.store, &f.store, scope, Page::default(), f.now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn user_rank_matches_leaderboard_position() {
        let f = fixture().await;
        let alice = f.store.insert_user("alice").await;
        let bob = f.store.insert_user("bob").await;
        let carol = f.store.insert_user("carol").await;
        f.play(alice, f.subject_id, 4, 5, f.now).await;
        f.play(bob, f.subject_id, 5, 5, f.now).await;
        f.play(carol, f.subject_id, 1, 5, f.now).await;

        let scope = LeaderboardScope::Global(Period::AllTime);
        let board = f.board(scope, Page::default()).await;

        for entry in &board.entries {
            let rank = user_rank(&f.store, entry.user_id, scope, f.now).await.unwrap();
            assert_eq!(rank.rank, entry.rank);
            assert_eq!(rank.total_users, 3);
            assert_eq!(rank.total_score, entry.total_score);
        }
    }

    #[tokio::test]
    async fn full_ties_share_user_rank() {
        let f = fixture().await;
        let alice = f.store.insert_user("alice").await;
        let bob = f.store.insert_user("bob").await;
        f.play(alice, f.subject_id, 3, 3, f.now).await;
        f.play(bob, f.subject_id, 3, 3, f.now).await;

        let scope = LeaderboardScope::Global(Period::AllTime);
        assert_eq!(user_rank(&f.store, alice, scope, f.now).await.unwrap().rank, 1);
        assert_eq!(user_rank(&f.store, bob, scope, f.now).await.unwrap().rank, 1);
    }

    #[tokio::test]
    async fn user_without_scores_has_no_rank() {
        let f = fixture().await;
        let idle = f.store.insert_user("idle").await;
        let err = user_rank(&f.store, idle, LeaderboardScope::Global(Period::AllTime), f.now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
