use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::models::user::{CreateUserRequest, UserProfile};
use crate::services::{stats_service::StatsService, user_service::UserService, AppState};

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let service = UserService::new(state.mongo.clone());
    let user = service.create(&req.username).await?;

    Ok((StatusCode::CREATED, Json(UserProfile::from(user))))
}

pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = StatsService::new(state.mongo.clone());

    let stats = service.get_statistics(&username).await?;
    Ok(Json(stats))
}
