// src/ranking.rs

//! Ordering and rank arithmetic shared by every leaderboard path.
//!
//! Standings are ordered by total score (desc), then total correct answers (desc).
//! User id (asc) breaks the remaining ties so that pages are stable.

use std::{cmp::Ordering, collections::HashMap};

use crate::models::{
    leaderboard::{LeaderboardEntry, Standing},
    score::ScoreEntry,
};

/// Total order used to list standings.
pub fn standing_order(a: &Standing, b: &Standing) -> Ordering {
    b.total_score
        .cmp(&a.total_score)
        .then_with(|| b.correct_answers.cmp(&a.correct_answers))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// True when `a` ranks strictly ahead of `b` (user id does not count).
fn ranks_ahead(a: &Standing, b: &Standing) -> bool {
    (a.total_score, a.correct_answers) > (b.total_score, b.correct_answers)
}

/// Groups score entries per user and returns the sorted standings.
/// Entries of users without a display name are ignored.
pub fn aggregate<'a, I>(entries: I, names: &HashMap<i64, String>) -> Vec<Standing>
where
    I: IntoIterator<Item = &'a ScoreEntry>,
{
    let mut per_user: HashMap<i64, Standing> = HashMap::new();

    for entry in entries {
        let Some(name) = names.get(&entry.user_id) else {
            continue;
        };
        let standing = per_user.entry(entry.user_id).or_insert_with(|| Standing {
            user_id: entry.user_id,
            user_name: name.clone(),
            total_score: 0,
            total_quizzes: 0,
            correct_answers: 0,
            total_questions: 0,
        });
        standing.total_score += entry.score;
        standing.total_quizzes += 1;
        standing.correct_answers += entry.correct_answers;
        standing.total_questions += entry.total_questions;
    }

    let mut standings: Vec<Standing> = per_user.into_values().collect();
    standings.sort_by(standing_order);
    standings
}

/// Competition rank ("1224"): one plus the number of users strictly ahead.
/// Users tied on both score and correct answers share a rank.
pub fn competition_rank(standings: &[Standing], user_id: i64) -> Option<i64> {
    let me = standings.iter().find(|s| s.user_id == user_id)?;
    let ahead = standings.iter().filter(|s| ranks_ahead(s, me)).count() as i64;
    Some(ahead + 1)
}

/// `correct / total * 100`, or 0 when nothing was answered.
pub fn accuracy_percent(correct_answers: i64, total_questions: i64) -> f64 {
    if total_questions == 0 {
        return 0.0;
    }
    correct_answers as f64 / total_questions as f64 * 100.0
}

/// Turns one page of ordered standings into leaderboard rows.
/// Ranks continue from `offset`, so they reflect the position in the full ordering.
pub fn rank_page(standings: Vec<Standing>, offset: i64) -> Vec<LeaderboardEntry> {
    standings
        .into_iter()
        .zip(offset + 1..)
        .map(|(s, rank)| LeaderboardEntry {
            rank,
            accuracy_percent: accuracy_percent(s.correct_answers, s.total_questions),
            user_id: s.user_id,
            user_name: s.user_name,
            total_score: s.total_score,
            total_quizzes: s.total_quizzes,
            correct_answers: s.correct_answers,
            total_questions: s.total_questions,
        })
        .collect()
}
