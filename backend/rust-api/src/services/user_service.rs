use chrono::Utc;
use mongodb::{bson::doc, Collection, Database};
use uuid::Uuid;

use crate::error::{is_duplicate_key, ApiError};
use crate::models::user::{User, UserStatistics};

/// Minimal identity collaborator: resolves a username to a stable user id
/// and owns the statistics-bearing user record. Authentication lives
/// outside this service.
pub struct UserService {
    mongo: Database,
}

impl UserService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn users(&self) -> Collection<User> {
        self.mongo.collection("users")
    }

    pub async fn find_by_username(&self, username: &str) -> Result<User, ApiError> {
        let username = validated(username)?;

        self.users()
            .find_one(doc! { "username": username })
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("no user found for username '{username}'")))
    }

    pub async fn create(&self, username: &str) -> Result<User, ApiError> {
        let username = validated(username)?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            created_at: Utc::now(),
            stats: UserStatistics::default(),
        };

        match self.users().insert_one(&user).await {
            Ok(_) => {
                tracing::info!("Created user '{}' ({})", user.username, user.id);
                Ok(user)
            }
            Err(e) if is_duplicate_key(&e) => Err(ApiError::Conflict(format!(
                "user '{username}' already exists"
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

fn validated(username: &str) -> Result<&str, ApiError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ApiError::Validation(
            "invalid or missing 'username', must be a non-empty string".to_string(),
        ));
    }
    Ok(username)
}
