use chrono::{NaiveDate, Utc};

use crate::error::ApiError;

/// The current calendar day in UTC. Daily content and session keys all use
/// this clock.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Strict `YYYY-MM-DD` parsing for user-supplied date parameters.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError::Validation(format!(
            "invalid or missing 'date' value '{}', use format YYYY-MM-DD",
            raw
        ))
    })
}

/// Mutations are only allowed against the current day's session, regardless
/// of submission state.
pub fn ensure_today(date: NaiveDate) -> Result<(), ApiError> {
    if date != today_utc() {
        return Err(ApiError::Validation(
            "cannot update answers on a previous day's quiz".to_string(),
        ));
    }
    Ok(())
}
