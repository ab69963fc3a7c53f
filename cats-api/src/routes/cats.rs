use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use cats_shared::errors::AppResult;
use cats_shared::middleware::ValidatedJson;
use cats_shared::types::auth::AuthUser;
use cats_shared::types::ApiResponse;

use crate::cat_filter::CatFilter;
use crate::models::{CatRequest, CatView, CreatedResponse};
use crate::repository::Store;
use crate::AppState;

// --- POST /v1/cat ---

pub async fn create_cat<S: Store>(
    user: AuthUser,
    State(state): State<Arc<AppState<S>>>,
    ValidatedJson(req): ValidatedJson<CatRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreatedResponse>>)> {
    let created = state.cats.create_cat(user.id, req)?;
    Ok(ApiResponse::ok_with_message(created, "success").created())
}

// --- GET /v1/cat ---

pub async fn list_cats<S: Store>(
    user: AuthUser,
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ApiResponse<Vec<CatView>>>> {
    let filter = CatFilter::from_query(&params);
    let cats = state.cats.list_cats(user.id, &filter)?;
    Ok(Json(ApiResponse::ok_with_message(cats, "success")))
}

// --- PUT /v1/cat/:id ---

pub async fn update_cat<S: Store>(
    user: AuthUser,
    State(state): State<Arc<AppState<S>>>,
    Path(cat_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CatRequest>,
) -> AppResult<Json<ApiResponse<CatView>>> {
    let cat = state.cats.update_cat(user.id, cat_id, req)?;
    Ok(Json(ApiResponse::ok_with_message(cat, "successfully update cat")))
}

// --- DELETE /v1/cat/:id ---

pub async fn delete_cat<S: Store>(
    user: AuthUser,
    State(state): State<Arc<AppState<S>>>,
    Path(cat_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.cats.delete_cat(user.id, cat_id)?;
    Ok(Json(ApiResponse::ok_with_message((), "successfully delete cat")))
}
