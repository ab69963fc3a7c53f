use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use cats_shared::errors::AppResult;
use cats_shared::middleware::ValidatedJson;
use cats_shared::types::ApiResponse;

use crate::models::{AuthResponse, LoginRequest};
use crate::repository::Store;
use crate::AppState;

// --- POST /v1/user/login ---

pub async fn login<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let auth = state.users.login(req)?;
    Ok(Json(ApiResponse::ok_with_message(auth, "User logged successfully")))
}
