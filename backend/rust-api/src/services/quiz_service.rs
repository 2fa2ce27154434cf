use mongodb::{bson::doc, Collection, Database};
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{is_duplicate_key, ApiError};
use crate::metrics::QUESTION_SETS_CREATED_TOTAL;
use crate::models::{Question, QuestionSet};
use crate::services::EnsureOutcome;
use crate::utils::retry::{retry_async_with_config, RetryConfig};
use crate::utils::time::today_utc;

/// One raw record from the trivia provider batch.
#[derive(Debug, Deserialize)]
struct ProviderQuestion {
    #[serde(rename = "type")]
    kind: Option<String>,
    difficulty: Option<String>,
    category: Option<String>,
    question: String,
    correct_answer: String,
    #[serde(default)]
    incorrect_answers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    response_code: i32,
    #[serde(default)]
    results: Vec<ProviderQuestion>,
}

pub struct QuizService {
    mongo: Database,
    http_client: Client,
    config: Config,
}

impl QuizService {
    pub fn new(mongo: Database, config: Config) -> Self {
        Self {
            mongo,
            http_client: Client::new(),
            config,
        }
    }

    fn question_sets(&self) -> Collection<QuestionSet> {
        self.mongo.collection("question_sets")
    }

    /// Create today's question set if it does not exist yet. The insert is a
    /// single embedded document, so the set and its questions land
    /// all-or-nothing; a racing creator loses on the `quiz_date` unique
    /// index and resolves to the winner's row.
    pub async fn ensure_todays_question_set<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<EnsureOutcome<QuestionSet>, ApiError> {
        let today = today_utc();

        if let Some(existing) = self
            .question_sets()
            .find_one(doc! { "quiz_date": today.to_string() })
            .await?
        {
            tracing::info!("Question set for {} already exists", today);
            QUESTION_SETS_CREATED_TOTAL
                .with_label_values(&["exists"])
                .inc();
            return Ok(EnsureOutcome::AlreadyExists(existing));
        }

        tracing::info!("Fetching trivia batch from provider");
        let batch = self.fetch_trivia_batch().await?;

        if batch.results.is_empty() {
            tracing::warn!("No trivia data returned, nothing written");
            return Err(ApiError::UpstreamUnavailable(
                "trivia provider returned no usable questions".to_string(),
            ));
        }

        let mut questions = Vec::with_capacity(batch.results.len());
        for raw in batch.results {
            questions.push(Question::with_shuffled_options(
                raw.kind,
                raw.difficulty,
                raw.category,
                raw.question,
                raw.correct_answer,
                raw.incorrect_answers,
                &mut *rng,
            ));
        }

        let set = QuestionSet {
            id: Uuid::new_v4().to_string(),
            response_code: batch.response_code,
            quiz_date: today,
            questions,
        };

        match self.question_sets().insert_one(&set).await {
            Ok(_) => {
                tracing::info!(
                    "Created question set {} for {} with {} questions",
                    set.id,
                    today,
                    set.questions.len()
                );
                QUESTION_SETS_CREATED_TOTAL
                    .with_label_values(&["created"])
                    .inc();
                Ok(EnsureOutcome::Created(set))
            }
            Err(e) if is_duplicate_key(&e) => {
                tracing::info!("Lost question-set creation race for {}, reusing row", today);
                QUESTION_SETS_CREATED_TOTAL
                    .with_label_values(&["exists"])
                    .inc();
                let existing = self.get_question_set_by_date(today).await?;
                Ok(EnsureOutcome::AlreadyExists(existing))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_question_set_by_date(
        &self,
        date: chrono::NaiveDate,
    ) -> Result<QuestionSet, ApiError> {
        self.question_sets()
            .find_one(doc! { "quiz_date": date.to_string() })
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("no quiz found for {}", date)))
    }

    async fn fetch_trivia_batch(&self) -> Result<ProviderResponse, ApiError> {
        let url = format!(
            "{}?amount={}",
            self.config.trivia_api_url, self.config.trivia_question_count
        );

        retry_async_with_config(RetryConfig::default(), || async {
            self.http_client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .json::<ProviderResponse>()
                .await
        })
        .await
        .map_err(|e| ApiError::UpstreamUnavailable(format!("trivia provider request failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_payload() {
        let payload = r#"{
            "response_code": 0,
            "results": [
                {
                    "type": "multiple",
                    "difficulty": "medium",
                    "category": "Science & Nature",
                    "question": "What is the chemical symbol for gold?",
                    "correct_answer": "Au",
                    "incorrect_answers": ["Ag", "Fe", "Go"]
                }
            ]
        }"#;

        let parsed: ProviderResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.response_code, 0);
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].correct_answer, "Au");
        assert_eq!(parsed.results[0].incorrect_answers.len(), 3);
    }

    #[test]
    fn empty_batch_parses_to_no_results() {
        let parsed: ProviderResponse =
            serde_json::from_str(r#"{ "response_code": 1 }"#).unwrap();
        assert_eq!(parsed.response_code, 1);
        assert!(parsed.results.is_empty());
    }
}
