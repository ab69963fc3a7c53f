use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use cats_shared::errors::AppResult;
use cats_shared::middleware::ValidatedJson;
use cats_shared::types::ApiResponse;

use crate::models::{AuthResponse, RegisterRequest};
use crate::repository::Store;
use crate::AppState;

// --- POST /v1/user/register ---

pub async fn register<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    let auth = state.users.register(req)?;
    Ok(ApiResponse::ok_with_message(auth, "User registered successfully").created())
}
