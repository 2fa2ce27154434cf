use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub mod user;

/// A calendar day's trivia content, stored in the "question_sets" collection.
/// The day's questions are embedded so the whole set is written in a single
/// insert; `quiz_date` carries a unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    #[serde(rename = "_id")]
    pub id: String,
    /// Status code reported by the trivia provider for the fetched batch.
    pub response_code: i32,
    pub quiz_date: NaiveDate,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
    /// Permutation of `incorrect_answers` + `correct_answer`, shuffled once
    /// at creation and stored; never re-shuffled on read.
    pub options: Vec<String>,
}

impl Question {
    /// Builds a question with its answer options shuffled via the supplied
    /// rng (Fisher-Yates through `SliceRandom::shuffle`).
    pub fn with_shuffled_options<R: Rng + ?Sized>(
        kind: Option<String>,
        difficulty: Option<String>,
        category: Option<String>,
        question: String,
        correct_answer: String,
        incorrect_answers: Vec<String>,
        rng: &mut R,
    ) -> Self {
        let mut options = incorrect_answers.clone();
        options.push(correct_answer.clone());
        options.shuffle(rng);

        Self {
            kind,
            difficulty,
            category,
            question,
            correct_answer,
            incorrect_answers,
            options,
        }
    }
}

/// The word-game track's daily puzzle ("word_puzzles" collection, unique
/// index on `date`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordPuzzle {
    #[serde(rename = "_id")]
    pub id: String,
    pub word: String,
    pub date: NaiveDate,
}

/// One row of the immutable word corpus ("valid_words" collection). Ids are
/// dense and 1-based, assigned at seeding time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidWord {
    #[serde(rename = "_id")]
    pub id: i64,
    pub word: String,
}

/// A user's attempt at a given day's quiz ("user_quiz_sessions" collection,
/// unique index on `(user_id, quiz_date)`). Once `is_submitted` flips to
/// true the record is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserQuizSession {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub quiz_date: NaiveDate,
    pub question_set_id: String,
    pub is_submitted: bool,
    #[serde(with = "bson_datetime_as_chrono")]
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub user_options: Vec<String>,
}

/// Wordle mirror of [`UserQuizSession`] ("user_wordle_sessions" collection,
/// unique index on `(user_id, date)`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserWordleSession {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub word_puzzle_id: String,
    /// Set on submission; does not imply the user actually guessed the word.
    pub completed: bool,
    #[serde(with = "bson_datetime_as_chrono")]
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub guesses: Vec<String>,
}

/// Query parameter shared by the date-keyed read endpoints.
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOptionsRequest {
    pub date: String,
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    pub date: String,
    pub options: Vec<String>,
    #[validate(range(min = 0, max = 10, message = "correct_count must be between 0 and 10"))]
    pub correct_count: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateGuessesRequest {
    pub date: String,
    pub guesses: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitWordleRequest {
    pub date: String,
    pub guesses: Vec<String>,
}

// Serde converters for chrono::DateTime <-> mongodb::bson::DateTime
pub(crate) mod bson_datetime_as_chrono {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bson_dt = bson::DateTime::from_millis(date.timestamp_millis());
        bson_dt.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bson_dt = bson::DateTime::deserialize(deserializer)?;
        DateTime::from_timestamp_millis(bson_dt.timestamp_millis())
            .ok_or_else(|| serde::de::Error::custom("timestamp out of range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build(rng: &mut StdRng) -> Question {
        Question::with_shuffled_options(
            Some("multiple".to_string()),
            Some("easy".to_string()),
            Some("General Knowledge".to_string()),
            "Which answer is correct?".to_string(),
            "D".to_string(),
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            rng,
        )
    }

    #[test]
    fn options_are_a_permutation_of_all_answers() {
        let mut rng = StdRng::seed_from_u64(7);
        let question = build(&mut rng);

        assert_eq!(question.options.len(), question.incorrect_answers.len() + 1);

        let mut expected = question.incorrect_answers.clone();
        expected.push(question.correct_answer.clone());
        expected.sort();

        let mut actual = question.options.clone();
        actual.sort();

        assert_eq!(actual, expected);
    }

    #[test]
    fn shuffle_is_deterministic_for_a_seed() {
        let a = build(&mut StdRng::seed_from_u64(42));
        let b = build(&mut StdRng::seed_from_u64(42));
        assert_eq!(a.options, b.options);
    }

    #[test]
    fn single_answer_question_still_holds_invariant() {
        let mut rng = StdRng::seed_from_u64(1);
        let question = Question::with_shuffled_options(
            Some("boolean".to_string()),
            None,
            None,
            "True or false?".to_string(),
            "True".to_string(),
            vec!["False".to_string()],
            &mut rng,
        );
        assert_eq!(question.options.len(), 2);
        assert!(question.options.contains(&"True".to_string()));
        assert!(question.options.contains(&"False".to_string()));
    }
}
