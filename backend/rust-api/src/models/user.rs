use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User model stored in MongoDB "users" collection. Identity management is
/// an external concern; only the username key and the statistics this core
/// maintains live here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(with = "super::bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub stats: UserStatistics,
}

/// Running quiz statistics embedded in the user record. `average_score` is
/// the incrementally maintained mean of correct-answer counts on a 0-10
/// scale; it is only ever rewritten together with `quizzes_submitted`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStatistics {
    pub quizzes_submitted: i64,
    pub average_score: f64,
    pub num_perfect_scores: i64,
}

/// Request to create a user
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 1,
        max = 64,
        message = "username must be between 1 and 64 characters"
    ))]
    pub username: String,
}

/// User returned to the client
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub stats: UserStatistics,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
            stats: user.stats,
        }
    }
}
