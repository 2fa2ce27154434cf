use chrono::{NaiveDate, Utc};
use mongodb::{bson::doc, options::ReturnDocument, Collection, Database};
use uuid::Uuid;

use crate::error::{is_duplicate_key, ApiError};
use crate::metrics::{SESSIONS_CREATED_TOTAL, SUBMISSIONS_TOTAL};
use crate::models::{QuestionSet, UserQuizSession};
use crate::services::stats_service::{StatsService, MAX_SCORE};
use crate::services::user_service::UserService;
use crate::utils::time::ensure_today;

/// Per-user, per-day quiz session lifecycle: lazily created, mutable while
/// open and dated today, terminal once submitted.
pub struct SessionService {
    mongo: Database,
}

impl SessionService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn sessions(&self) -> Collection<UserQuizSession> {
        self.mongo.collection("user_quiz_sessions")
    }

    /// Return the user's session for `date`, creating a blank one bound to
    /// that day's question set on first touch. A racing duplicate insert
    /// resolves to the winner's row, which is what makes this idempotent.
    pub async fn get_or_create(
        &self,
        username: &str,
        date: NaiveDate,
    ) -> Result<UserQuizSession, ApiError> {
        let user = UserService::new(self.mongo.clone())
            .find_by_username(username)
            .await?;

        if let Some(existing) = self
            .sessions()
            .find_one(doc! { "user_id": &user.id, "quiz_date": date.to_string() })
            .await?
        {
            return Ok(existing);
        }

        let question_set = self
            .mongo
            .collection::<QuestionSet>("question_sets")
            .find_one(doc! { "quiz_date": date.to_string() })
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("no quiz found for {}", date)))?;

        let session = UserQuizSession {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            quiz_date: date,
            question_set_id: question_set.id,
            is_submitted: false,
            started_at: Utc::now(),
            user_options: Vec::new(),
        };

        match self.sessions().insert_one(&session).await {
            Ok(_) => {
                tracing::info!(
                    "Created quiz session {} for user '{}' on {}",
                    session.id,
                    username,
                    date
                );
                SESSIONS_CREATED_TOTAL.with_label_values(&["quiz"]).inc();
                Ok(session)
            }
            Err(e) if is_duplicate_key(&e) => {
                self.sessions()
                    .find_one(doc! { "user_id": &user.id, "quiz_date": date.to_string() })
                    .await?
                    .ok_or_else(|| {
                        ApiError::Internal(format!(
                            "quiz session for user '{username}' on {date} vanished after duplicate insert"
                        ))
                    })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the selected options of an open session dated today.
    pub async fn update_options(
        &self,
        username: &str,
        date: NaiveDate,
        options: Vec<String>,
    ) -> Result<UserQuizSession, ApiError> {
        ensure_today(date)?;

        let user = UserService::new(self.mongo.clone())
            .find_by_username(username)
            .await?;

        let updated = self
            .sessions()
            .find_one_and_update(
                doc! {
                    "user_id": &user.id,
                    "quiz_date": date.to_string(),
                    "is_submitted": false,
                },
                doc! { "$set": { "user_options": options } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        match updated {
            Some(session) => Ok(session),
            None => Err(self.open_session_missing_reason(&user.id, username, date).await?),
        }
    }

    /// One-way submission: atomically flips `is_submitted` and feeds the
    /// scoring aggregator exactly once. A second submit observes a conflict
    /// and leaves the statistics untouched.
    pub async fn submit(
        &self,
        username: &str,
        date: NaiveDate,
        options: Vec<String>,
        correct_count: i64,
    ) -> Result<UserQuizSession, ApiError> {
        ensure_today(date)?;

        if !(0..=MAX_SCORE).contains(&correct_count) {
            return Err(ApiError::Validation(format!(
                "correct_count must be between 0 and {}",
                MAX_SCORE
            )));
        }

        let user = UserService::new(self.mongo.clone())
            .find_by_username(username)
            .await?;

        let submitted = self
            .sessions()
            .find_one_and_update(
                doc! {
                    "user_id": &user.id,
                    "quiz_date": date.to_string(),
                    "is_submitted": false,
                },
                doc! { "$set": { "user_options": options, "is_submitted": true } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        let session = match submitted {
            Some(session) => session,
            None => {
                return Err(self.open_session_missing_reason(&user.id, username, date).await?);
            }
        };

        StatsService::new(self.mongo.clone())
            .record_submission(&user.id, correct_count)
            .await?;

        SUBMISSIONS_TOTAL.with_label_values(&["quiz"]).inc();
        tracing::info!(
            "User '{}' submitted quiz for {} with {} correct",
            username,
            date,
            correct_count
        );

        Ok(session)
    }

    /// A filtered update on an open session matched nothing: either the
    /// session is already submitted (conflict) or it never existed.
    async fn open_session_missing_reason(
        &self,
        user_id: &str,
        username: &str,
        date: NaiveDate,
    ) -> Result<ApiError, ApiError> {
        let existing = self
            .sessions()
            .find_one(doc! { "user_id": user_id, "quiz_date": date.to_string() })
            .await?;

        Ok(match existing {
            Some(_) => ApiError::Conflict(format!(
                "quiz for {date} has already been submitted by '{username}'"
            )),
            None => {
                ApiError::NotFound(format!("no quiz session for '{username}' on {date}"))
            }
        })
    }
}
