use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::models::{DateQuery, SubmitWordleRequest, UpdateGuessesRequest};
use crate::services::{
    wordle_service::WordleService, wordle_session_service::WordleSessionService, AppState,
    EnsureOutcome,
};
use crate::utils::time::parse_date;

/// Administrative/scheduler trigger: pick today's word if absent.
pub async fn ensure_today(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let service = WordleService::new(state.mongo.clone());
    let mut rng = StdRng::from_os_rng();

    match service.ensure_todays_word_puzzle(&mut rng).await? {
        EnsureOutcome::Created(puzzle) => Ok((StatusCode::CREATED, Json(puzzle))),
        EnsureOutcome::AlreadyExists(puzzle) => Ok((StatusCode::OK, Json(puzzle))),
    }
}

pub async fn get_word_of_the_day(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let date = parse_date(&query.date)?;
    let service = WordleService::new(state.mongo.clone());

    let puzzle = service.get_word_of_the_day(date).await?;
    Ok(Json(puzzle))
}

pub async fn get_or_create_session(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let date = parse_date(&query.date)?;
    let service = WordleSessionService::new(state.mongo.clone());

    let session = service.get_or_create(&username, date).await?;
    Ok(Json(session))
}

pub async fn update_guesses(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Json(req): Json<UpdateGuessesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let date = parse_date(&req.date)?;
    let service = WordleSessionService::new(state.mongo.clone());

    let session = service.update_guesses(&username, date, req.guesses).await?;
    Ok(Json(session))
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Json(req): Json<SubmitWordleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let date = parse_date(&req.date)?;
    let service = WordleSessionService::new(state.mongo.clone());

    let session = service.submit(&username, date, req.guesses).await?;
    Ok(Json(session))
}
