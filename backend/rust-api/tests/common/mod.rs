use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use mongodb::bson::doc;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use dailytrivia_api::{config::Config, create_router, services::AppState};

pub async fn create_test_app() -> Router {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    // Load test environment from .env.test
    dotenvy::from_filename(".env.test").ok();

    let config = Config::load().expect("Failed to load test configuration");

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to connect to test MongoDB");

    let app_state = Arc::new(
        AppState::new(config.clone(), mongo_client.clone())
            .await
            .expect("Failed to initialize test app state"),
    );

    seed_test_data(&mongo_client, &config.mongo_database).await;

    create_router(app_state)
}

/// Question set used by the past-date read tests.
pub const PAST_QUIZ_DATE: &str = "2020-01-01";

async fn seed_test_data(mongo_client: &mongodb::Client, db_name: &str) {
    let db = mongo_client.database(db_name);
    let today = chrono::Utc::now().date_naive().to_string();

    let sets = db.collection::<mongodb::bson::Document>("question_sets");
    for date in [PAST_QUIZ_DATE, today.as_str()] {
        insert_ignoring_duplicates(
            &sets,
            doc! {
                "_id": Uuid::new_v4().to_string(),
                "response_code": 0,
                "quiz_date": date,
                "questions": [ {
                    "type": "multiple",
                    "difficulty": "easy",
                    "category": "General Knowledge",
                    "question": "Which answer is correct?",
                    "correct_answer": "D",
                    "incorrect_answers": ["A", "B", "C"],
                    "options": ["B", "D", "A", "C"],
                } ],
            },
            &format!("question set for {date}"),
        )
        .await;
    }

    let words = db.collection::<mongodb::bson::Document>("valid_words");
    let seeded = words
        .count_documents(doc! {})
        .await
        .expect("Failed to count valid_words");
    if seeded == 0 {
        for (i, word) in ["aback", "abase", "abate", "abbey", "abbot"].iter().enumerate() {
            insert_ignoring_duplicates(
                &words,
                doc! { "_id": i as i64 + 1, "word": *word },
                &format!("valid word {word}"),
            )
            .await;
        }
    }

    let puzzles = db.collection::<mongodb::bson::Document>("word_puzzles");
    insert_ignoring_duplicates(
        &puzzles,
        doc! {
            "_id": Uuid::new_v4().to_string(),
            "word": "abbey",
            "date": &today,
        },
        "word puzzle for today",
    )
    .await;
}

async fn insert_ignoring_duplicates(
    collection: &mongodb::Collection<mongodb::bson::Document>,
    document: mongodb::bson::Document,
    label: &str,
) {
    if let Err(e) = collection.insert_one(document).await {
        // Ignore duplicate key error (code 11000) raced by parallel tests
        if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(ref we)) =
            *e.kind
        {
            if we.code == 11000 {
                return;
            }
        }
        panic!("Failed to seed {label}: {e:?}");
    }
}

/// Registers a unique throwaway user and returns its username.
pub async fn create_user(app: &Router) -> String {
    let username = format!("user-{}", Uuid::new_v4());
    let (status, body) = send_json(
        app,
        "POST",
        "/api/v1/users",
        Some(serde_json::json!({ "username": username })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create_user failed: {body}");
    username
}

pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

pub fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}
