use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::fmt::init;

use dailytrivia_api::{
    config::Config,
    metrics::CONTENT_WORKER_TICKS_TOTAL,
    services::{
        quiz_service::QuizService,
        wordle_service::{seed_word_corpus, WordleService},
        AppState, EnsureOutcome,
    },
};

/// Scheduled stand-in for an external cron: periodically makes sure today's
/// question set and word puzzle exist. Both operations are idempotent, so
/// the interval only bounds how late in the day content can appear.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();

    let config = Config::load().expect("Failed to load configuration");

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to connect to MongoDB");

    let app_state = AppState::new(config.clone(), mongo_client)
        .await
        .expect("Failed to initialize app state");

    seed_word_corpus(&app_state.config, &app_state.mongo)
        .await
        .expect("Failed to seed word corpus");

    let quiz_service = QuizService::new(app_state.mongo.clone(), config.clone());
    let wordle_service = WordleService::new(app_state.mongo.clone());

    let interval = Duration::from_secs(config.content_worker_interval_secs);
    info!("Starting content worker (interval={}s)", interval.as_secs());

    loop {
        let mut rng = StdRng::from_os_rng();
        let mut tick_ok = true;

        match quiz_service.ensure_todays_question_set(&mut rng).await {
            Ok(EnsureOutcome::Created(set)) => {
                info!("Created question set for {}", set.quiz_date)
            }
            Ok(EnsureOutcome::AlreadyExists(_)) => {}
            Err(err) => {
                tick_ok = false;
                warn!(error = %err, "question set ensure failed");
            }
        }

        match wordle_service.ensure_todays_word_puzzle(&mut rng).await {
            Ok(EnsureOutcome::Created(puzzle)) => {
                info!("Created word of the day for {}", puzzle.date)
            }
            Ok(EnsureOutcome::AlreadyExists(_)) => {}
            Err(err) => {
                tick_ok = false;
                warn!(error = %err, "word puzzle ensure failed");
            }
        }

        CONTENT_WORKER_TICKS_TOTAL
            .with_label_values(&[if tick_ok { "success" } else { "error" }])
            .inc();

        sleep(interval).await;
    }
}
