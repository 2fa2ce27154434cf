use mongodb::{bson::doc, Collection, Database};
use rand::Rng;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{is_duplicate_key, ApiError};
use crate::metrics::WORD_PUZZLES_CREATED_TOTAL;
use crate::models::{ValidWord, WordPuzzle};
use crate::services::EnsureOutcome;
use crate::utils::time::today_utc;

/// A draw hitting a corpus gap is retried with a fresh id this many times
/// before the operation fails with nothing written.
const WORD_DRAW_ATTEMPTS: usize = 5;

pub struct WordleService {
    mongo: Database,
}

impl WordleService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn word_puzzles(&self) -> Collection<WordPuzzle> {
        self.mongo.collection("word_puzzles")
    }

    fn valid_words(&self) -> Collection<ValidWord> {
        self.mongo.collection("valid_words")
    }

    /// Pick today's word uniformly from the corpus if no puzzle exists yet.
    pub async fn ensure_todays_word_puzzle<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<EnsureOutcome<WordPuzzle>, ApiError> {
        let today = today_utc();

        if let Some(existing) = self
            .word_puzzles()
            .find_one(doc! { "date": today.to_string() })
            .await?
        {
            tracing::info!("Word for {} already exists", today);
            WORD_PUZZLES_CREATED_TOTAL
                .with_label_values(&["exists"])
                .inc();
            return Ok(EnsureOutcome::AlreadyExists(existing));
        }

        let corpus_len = self.valid_words().count_documents(doc! {}).await? as i64;
        if corpus_len == 0 {
            return Err(ApiError::NotFound(
                "word corpus is empty, seed valid_words first".to_string(),
            ));
        }

        let selected = self.draw_word(corpus_len, rng).await?;

        let puzzle = WordPuzzle {
            id: Uuid::new_v4().to_string(),
            word: selected.word,
            date: today,
        };

        match self.word_puzzles().insert_one(&puzzle).await {
            Ok(_) => {
                tracing::info!("Word of the day created for {}", today);
                WORD_PUZZLES_CREATED_TOTAL
                    .with_label_values(&["created"])
                    .inc();
                Ok(EnsureOutcome::Created(puzzle))
            }
            Err(e) if is_duplicate_key(&e) => {
                tracing::info!("Lost word-puzzle creation race for {}, reusing row", today);
                WORD_PUZZLES_CREATED_TOTAL
                    .with_label_values(&["exists"])
                    .inc();
                let existing = self.get_word_of_the_day(today).await?;
                Ok(EnsureOutcome::AlreadyExists(existing))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Uniform draw over the 1-based corpus ids. Seeding assigns dense ids,
    /// so a miss only happens with a hand-edited corpus; a silent empty word
    /// is never inserted.
    async fn draw_word<R: Rng + ?Sized>(
        &self,
        corpus_len: i64,
        rng: &mut R,
    ) -> Result<ValidWord, ApiError> {
        for _ in 0..WORD_DRAW_ATTEMPTS {
            let id = rng.random_range(1..=corpus_len);
            if let Some(word) = self.valid_words().find_one(doc! { "_id": id }).await? {
                return Ok(word);
            }
            tracing::warn!("No word found for corpus id {}, redrawing", id);
        }

        Err(ApiError::NotFound(format!(
            "no word found in corpus after {} draws",
            WORD_DRAW_ATTEMPTS
        )))
    }

    pub async fn get_word_of_the_day(
        &self,
        date: chrono::NaiveDate,
    ) -> Result<WordPuzzle, ApiError> {
        self.word_puzzles()
            .find_one(doc! { "date": date.to_string() })
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("no word found for {}", date)))
    }
}

/// One-time corpus bootstrap: loads the flat word list into "valid_words"
/// with dense 1-based ids. Skipped when no file is configured or the corpus
/// is already populated.
pub async fn seed_word_corpus(config: &Config, mongo: &Database) -> Result<(), ApiError> {
    let path = match &config.word_list_file {
        Some(path) if !path.is_empty() => path,
        _ => {
            tracing::debug!("No word list file configured, skipping corpus seed");
            return Ok(());
        }
    };

    let collection: Collection<ValidWord> = mongo.collection("valid_words");
    if collection.count_documents(doc! {}).await? > 0 {
        tracing::debug!("Word corpus already seeded, skipping");
        return Ok(());
    }

    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to read word list {}: {}", path, e)))?;

    let words = parse_corpus_lines(&contents);
    if words.is_empty() {
        return Err(ApiError::Internal(format!(
            "word list {} contains no usable words",
            path
        )));
    }

    let count = words.len();
    collection.insert_many(words).await?;
    tracing::info!("Seeded word corpus with {} words from {}", count, path);

    Ok(())
}

fn parse_corpus_lines(contents: &str) -> Vec<ValidWord> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, word)| ValidWord {
            id: i as i64 + 1,
            word: word.to_lowercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_lines_get_dense_one_based_ids() {
        let words = parse_corpus_lines("aback\nabase\n\n  abate  \nABBEY\n");
        assert_eq!(words.len(), 4);
        assert_eq!(words[0].id, 1);
        assert_eq!(words[0].word, "aback");
        assert_eq!(words[3].id, 4);
        assert_eq!(words[3].word, "abbey");
    }

    #[test]
    fn blank_corpus_parses_to_nothing() {
        assert!(parse_corpus_lines("\n  \n\t\n").is_empty());
    }
}
