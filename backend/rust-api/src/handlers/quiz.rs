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
use crate::models::{DateQuery, SubmitQuizRequest, UpdateOptionsRequest};
use crate::services::{
    quiz_service::QuizService, session_service::SessionService, AppState, EnsureOutcome,
};
use crate::utils::time::parse_date;

/// Administrative/scheduler trigger: create today's question set if absent.
pub async fn ensure_today(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let service = QuizService::new(state.mongo.clone(), state.config.clone());
    let mut rng = StdRng::from_os_rng();

    match service.ensure_todays_question_set(&mut rng).await? {
        EnsureOutcome::Created(set) => Ok((StatusCode::CREATED, Json(set))),
        EnsureOutcome::AlreadyExists(set) => Ok((StatusCode::OK, Json(set))),
    }
}

pub async fn get_by_date(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let date = parse_date(&query.date)?;
    let service = QuizService::new(state.mongo.clone(), state.config.clone());

    let set = service.get_question_set_by_date(date).await?;
    Ok(Json(set))
}

pub async fn get_or_create_session(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let date = parse_date(&query.date)?;
    let service = SessionService::new(state.mongo.clone());

    let session = service.get_or_create(&username, date).await?;
    Ok(Json(session))
}

pub async fn update_options(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Json(req): Json<UpdateOptionsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let date = parse_date(&req.date)?;
    let service = SessionService::new(state.mongo.clone());

    let session = service.update_options(&username, date, req.options).await?;
    Ok(Json(session))
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let date = parse_date(&req.date)?;
    let service = SessionService::new(state.mongo.clone());

    let session = service
        .submit(&username, date, req.options, req.correct_count)
        .await?;
    Ok(Json(session))
}
