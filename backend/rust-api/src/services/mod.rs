use anyhow::Context;
use mongodb::{bson::doc, options::IndexOptions, Client as MongoClient, Database, IndexModel};

use crate::config::Config;
use crate::models::{user::User, QuestionSet, UserQuizSession, UserWordleSession, WordPuzzle};

pub struct AppState {
    pub config: Config,
    pub mongo: Database,
}

impl AppState {
    pub async fn new(config: Config, mongo_client: MongoClient) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);

        tracing::info!("Verifying MongoDB connection...");

        tokio::time::timeout(
            std::time::Duration::from_secs(5),
            mongo.run_command(doc! { "ping": 1 }),
        )
        .await
        .map_err(|_| anyhow::anyhow!("MongoDB ping timeout after 5s"))?
        .context("MongoDB ping failed")?;

        ensure_indexes(&mongo)
            .await
            .context("Failed to create unique indexes")?;

        tracing::info!("MongoDB connection established, unique indexes ensured");

        Ok(Self { config, mongo })
    }
}

/// Result of an idempotent create-if-absent operation on daily content.
#[derive(Debug)]
pub enum EnsureOutcome<T> {
    Created(T),
    AlreadyExists(T),
}

impl<T> EnsureOutcome<T> {
    pub fn into_inner(self) -> T {
        match self {
            EnsureOutcome::Created(value) | EnsureOutcome::AlreadyExists(value) => value,
        }
    }
}

/// The one-row-per-natural-key rule is enforced here, at the persistence
/// layer, so racing check-then-insert callers cannot both win.
async fn ensure_indexes(mongo: &Database) -> mongodb::error::Result<()> {
    fn unique(keys: mongodb::bson::Document) -> IndexModel {
        IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build()
    }

    mongo
        .collection::<QuestionSet>("question_sets")
        .create_index(unique(doc! { "quiz_date": 1 }))
        .await?;
    mongo
        .collection::<WordPuzzle>("word_puzzles")
        .create_index(unique(doc! { "date": 1 }))
        .await?;
    mongo
        .collection::<User>("users")
        .create_index(unique(doc! { "username": 1 }))
        .await?;
    mongo
        .collection::<UserQuizSession>("user_quiz_sessions")
        .create_index(unique(doc! { "user_id": 1, "quiz_date": 1 }))
        .await?;
    mongo
        .collection::<UserWordleSession>("user_wordle_sessions")
        .create_index(unique(doc! { "user_id": 1, "date": 1 }))
        .await?;

    Ok(())
}

pub mod quiz_service;
pub mod session_service;
pub mod stats_service;
pub mod user_service;
pub mod wordle_service;
pub mod wordle_session_service;
