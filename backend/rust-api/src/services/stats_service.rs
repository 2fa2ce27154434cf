use mongodb::{bson::doc, Collection, Database};

use crate::error::ApiError;
use crate::metrics::PERFECT_SCORES_TOTAL;
use crate::models::user::{User, UserStatistics};
use crate::services::user_service::UserService;

/// Maximum attainable correct-answer count for a daily quiz.
pub const MAX_SCORE: i64 = 10;

/// How often the compare-and-set below retries before giving up. Contention
/// requires concurrent submissions by the same user, so retries are rare.
const CAS_ATTEMPTS: usize = 5;

pub struct StatsService {
    mongo: Database,
}

impl StatsService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn users(&self) -> Collection<User> {
        self.mongo.collection("users")
    }

    /// Incorporate one submitted quiz into the user's running statistics.
    /// The write is conditioned on the pre-update `quizzes_submitted` so a
    /// concurrent submission cannot cause a lost update; the loser re-reads
    /// and recomputes.
    pub async fn record_submission(
        &self,
        user_id: &str,
        correct_count: i64,
    ) -> Result<UserStatistics, ApiError> {
        for _ in 0..CAS_ATTEMPTS {
            let user = self
                .users()
                .find_one(doc! { "_id": user_id })
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("no user found for id '{user_id}'")))?;

            let next = fold_submission(&user.stats, correct_count);

            let result = self
                .users()
                .update_one(
                    doc! {
                        "_id": user_id,
                        "stats.quizzes_submitted": user.stats.quizzes_submitted,
                    },
                    doc! { "$set": {
                        "stats.quizzes_submitted": next.quizzes_submitted,
                        "stats.average_score": next.average_score,
                        "stats.num_perfect_scores": next.num_perfect_scores,
                    }},
                )
                .await?;

            if result.matched_count == 1 {
                if correct_count == MAX_SCORE {
                    PERFECT_SCORES_TOTAL.inc();
                }
                tracing::info!(
                    "Recorded submission for user {}: count={}, average={:.2}, perfect={}",
                    user_id,
                    next.quizzes_submitted,
                    next.average_score,
                    next.num_perfect_scores
                );
                return Ok(next);
            }

            tracing::debug!("Statistics update raced for user {}, retrying", user_id);
        }

        Err(ApiError::Internal(format!(
            "statistics update kept racing for user '{user_id}'"
        )))
    }

    pub async fn get_statistics(&self, username: &str) -> Result<UserStatistics, ApiError> {
        let user = UserService::new(self.mongo.clone())
            .find_by_username(username)
            .await?;
        Ok(user.stats)
    }
}

/// Running-mean update: the prior count weights the old average, the
/// post-increment count divides. Guarded so a non-positive count can never
/// divide; the first submission sets the average outright.
pub fn fold_submission(stats: &UserStatistics, correct_count: i64) -> UserStatistics {
    let prior = stats.quizzes_submitted.max(0);
    let new_count = prior + 1;

    let average_score = if prior == 0 {
        correct_count as f64
    } else {
        (stats.average_score * prior as f64 + correct_count as f64) / new_count as f64
    };

    UserStatistics {
        quizzes_submitted: new_count,
        average_score,
        num_perfect_scores: stats.num_perfect_scores + i64::from(correct_count == MAX_SCORE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_score_moves_average_and_perfect_count() {
        let stats = UserStatistics {
            quizzes_submitted: 2,
            average_score: 7.0,
            num_perfect_scores: 0,
        };

        let next = fold_submission(&stats, 10);

        assert_eq!(next.quizzes_submitted, 3);
        assert!((next.average_score - 8.0).abs() < f64::EPSILON);
        assert_eq!(next.num_perfect_scores, 1);
    }

    #[test]
    fn first_submission_sets_average_directly() {
        let next = fold_submission(&UserStatistics::default(), 6);

        assert_eq!(next.quizzes_submitted, 1);
        assert!((next.average_score - 6.0).abs() < f64::EPSILON);
        assert_eq!(next.num_perfect_scores, 0);
    }

    #[test]
    fn imperfect_score_leaves_perfect_count_alone() {
        let stats = UserStatistics {
            quizzes_submitted: 4,
            average_score: 5.0,
            num_perfect_scores: 2,
        };

        let next = fold_submission(&stats, 9);

        assert_eq!(next.quizzes_submitted, 5);
        assert!((next.average_score - 5.8).abs() < 1e-9);
        assert_eq!(next.num_perfect_scores, 2);
    }

    #[test]
    fn zero_score_still_counts_the_submission() {
        let stats = UserStatistics {
            quizzes_submitted: 1,
            average_score: 10.0,
            num_perfect_scores: 1,
        };

        let next = fold_submission(&stats, 0);

        assert_eq!(next.quizzes_submitted, 2);
        assert!((next.average_score - 5.0).abs() < f64::EPSILON);
        assert_eq!(next.num_perfect_scores, 1);
    }
}
