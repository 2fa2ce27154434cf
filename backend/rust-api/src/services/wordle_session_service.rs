use chrono::{NaiveDate, Utc};
use mongodb::{bson::doc, options::ReturnDocument, Collection, Database};
use uuid::Uuid;

use crate::error::{is_duplicate_key, ApiError};
use crate::metrics::{SESSIONS_CREATED_TOTAL, SUBMISSIONS_TOTAL};
use crate::models::{UserWordleSession, WordPuzzle};
use crate::services::user_service::UserService;
use crate::utils::time::ensure_today;

/// Wordle mirror of the quiz session lifecycle: `guesses` instead of
/// options, `completed` instead of `is_submitted`. Submission does not feed
/// the scoring aggregator; only the trivia track carries statistics.
pub struct WordleSessionService {
    mongo: Database,
}

impl WordleSessionService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn sessions(&self) -> Collection<UserWordleSession> {
        self.mongo.collection("user_wordle_sessions")
    }

    pub async fn get_or_create(
        &self,
        username: &str,
        date: NaiveDate,
    ) -> Result<UserWordleSession, ApiError> {
        let user = UserService::new(self.mongo.clone())
            .find_by_username(username)
            .await?;

        if let Some(existing) = self
            .sessions()
            .find_one(doc! { "user_id": &user.id, "date": date.to_string() })
            .await?
        {
            return Ok(existing);
        }

        let puzzle = self
            .mongo
            .collection::<WordPuzzle>("word_puzzles")
            .find_one(doc! { "date": date.to_string() })
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("no word found for {}", date)))?;

        let session = UserWordleSession {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            date,
            word_puzzle_id: puzzle.id,
            completed: false,
            started_at: Utc::now(),
            guesses: Vec::new(),
        };

        match self.sessions().insert_one(&session).await {
            Ok(_) => {
                tracing::info!(
                    "Created wordle session {} for user '{}' on {}",
                    session.id,
                    username,
                    date
                );
                SESSIONS_CREATED_TOTAL.with_label_values(&["wordle"]).inc();
                Ok(session)
            }
            Err(e) if is_duplicate_key(&e) => {
                self.sessions()
                    .find_one(doc! { "user_id": &user.id, "date": date.to_string() })
                    .await?
                    .ok_or_else(|| {
                        ApiError::Internal(format!(
                            "wordle session for user '{username}' on {date} vanished after duplicate insert"
                        ))
                    })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_guesses(
        &self,
        username: &str,
        date: NaiveDate,
        guesses: Vec<String>,
    ) -> Result<UserWordleSession, ApiError> {
        ensure_today(date)?;

        let user = UserService::new(self.mongo.clone())
            .find_by_username(username)
            .await?;

        let updated = self
            .sessions()
            .find_one_and_update(
                doc! {
                    "user_id": &user.id,
                    "date": date.to_string(),
                    "completed": false,
                },
                doc! { "$set": { "guesses": guesses } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        match updated {
            Some(session) => Ok(session),
            None => Err(self.open_session_missing_reason(&user.id, username, date).await?),
        }
    }

    pub async fn submit(
        &self,
        username: &str,
        date: NaiveDate,
        guesses: Vec<String>,
    ) -> Result<UserWordleSession, ApiError> {
        ensure_today(date)?;

        let user = UserService::new(self.mongo.clone())
            .find_by_username(username)
            .await?;

        let submitted = self
            .sessions()
            .find_one_and_update(
                doc! {
                    "user_id": &user.id,
                    "date": date.to_string(),
                    "completed": false,
                },
                doc! { "$set": { "guesses": guesses, "completed": true } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        match submitted {
            Some(session) => {
                SUBMISSIONS_TOTAL.with_label_values(&["wordle"]).inc();
                tracing::info!("User '{}' completed wordle for {}", username, date);
                Ok(session)
            }
            None => Err(self.open_session_missing_reason(&user.id, username, date).await?),
        }
    }

    async fn open_session_missing_reason(
        &self,
        user_id: &str,
        username: &str,
        date: NaiveDate,
    ) -> Result<ApiError, ApiError> {
        let existing = self
            .sessions()
            .find_one(doc! { "user_id": user_id, "date": date.to_string() })
            .await?;

        Ok(match existing {
            Some(_) => ApiError::Conflict(format!(
                "wordle for {date} has already been completed by '{username}'"
            )),
            None => {
                ApiError::NotFound(format!("no wordle session for '{username}' on {date}"))
            }
        })
    }
}
