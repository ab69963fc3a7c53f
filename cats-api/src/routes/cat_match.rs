use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

use cats_shared::errors::AppResult;
use cats_shared::middleware::ValidatedJson;
use cats_shared::types::auth::AuthUser;
use cats_shared::types::ApiResponse;

use crate::models::{CreateMatchRequest, CreatedResponse, MatchView, RespondMatchRequest};
use crate::repository::Store;
use crate::AppState;

// --- POST /v1/cat/match ---

pub async fn create_match<S: Store>(
    user: AuthUser,
    State(state): State<Arc<AppState<S>>>,
    ValidatedJson(req): ValidatedJson<CreateMatchRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreatedResponse>>)> {
    let created = state.matches.create_match(user.id, req)?;
    Ok(ApiResponse::ok_with_message(created, "successfully send match request").created())
}

// --- GET /v1/cat/match ---

pub async fn list_matches<S: Store>(
    user: AuthUser,
    State(state): State<Arc<AppState<S>>>,
) -> AppResult<Json<ApiResponse<Vec<MatchView>>>> {
    let matches = state.matches.list_matches(user.id)?;
    Ok(Json(ApiResponse::ok_with_message(matches, "success")))
}

// --- GET /v1/cat/match/:id ---

pub async fn get_match<S: Store>(
    user: AuthUser,
    State(state): State<Arc<AppState<S>>>,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MatchView>>> {
    let view = state.matches.get_match(user.id, match_id)?;
    Ok(Json(ApiResponse::ok(view)))
}

// --- PUT /v1/cat/match/:id ---

pub async fn respond_match<S: Store>(
    user: AuthUser,
    State(state): State<Arc<AppState<S>>>,
    Path(match_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<RespondMatchRequest>,
) -> AppResult<Json<ApiResponse<MatchView>>> {
    let view = state.matches.respond_match(user.id, match_id, req.status)?;
    Ok(Json(ApiResponse::ok_with_message(view, "successfully respond match request")))
}

// --- DELETE /v1/cat/match/:id ---

pub async fn delete_match<S: Store>(
    user: AuthUser,
    State(state): State<Arc<AppState<S>>>,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.matches.delete_match(user.id, match_id)?;
    Ok(Json(ApiResponse::ok_with_message((), "successfully remove match request")))
}
