use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mongo_uri: String,
    pub mongo_database: String,
    pub trivia_api_url: String,
    pub trivia_question_count: u32,
    pub word_list_file: Option<String>,
    pub content_worker_interval_secs: u64,
    pub bind_addr: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            // Load base config from TOML file
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        // Extract values with fallbacks to ENV or defaults
        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "dailytrivia".to_string());

        let trivia_api_url = settings
            .get_string("trivia.api_url")
            .or_else(|_| env::var("TRIVIA_API_URL"))
            .unwrap_or_else(|_| "https://opentdb.com/api.php".to_string());

        let trivia_question_count = settings
            .get_int("trivia.question_count")
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .or_else(|| {
                env::var("TRIVIA_QUESTION_COUNT")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .filter(|v| *v > 0)
            .unwrap_or(10);

        let word_list_file = settings
            .get_string("wordle.word_list_file")
            .ok()
            .or_else(|| env::var("WORD_LIST_FILE").ok())
            .filter(|v| !v.is_empty());

        let content_worker_interval_secs = settings
            .get_int("worker.content_interval_secs")
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .or_else(|| {
                env::var("CONTENT_WORKER_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .filter(|v| *v > 0)
            .unwrap_or(300);

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        Ok(Config {
            mongo_uri,
            mongo_database,
            trivia_api_url,
            trivia_question_count,
            word_list_file,
            content_worker_interval_secs,
            bind_addr,
        })
    }
}
