pub mod cat_match;
pub mod cats;
pub mod health;
pub mod login;
pub mod register;

use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use cats_shared::middleware::metrics_middleware;

use crate::repository::Store;
use crate::AppState;

pub fn router<S: Store>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/health", get(health::health_check::<S>))
        .route("/metrics", get(health::metrics::<S>))
        .route("/v1/user/register", post(register::register::<S>))
        .route("/v1/user/login", post(login::login::<S>))
        .route("/v1/cat", post(cats::create_cat::<S>).get(cats::list_cats::<S>))
        .route("/v1/cat/:id", put(cats::update_cat::<S>).delete(cats::delete_cat::<S>))
        .route(
            "/v1/cat/match",
            post(cat_match::create_match::<S>).get(cat_match::list_matches::<S>),
        )
        .route(
            "/v1/cat/match/:id",
            get(cat_match::get_match::<S>)
                .put(cat_match::respond_match::<S>)
                .delete(cat_match::delete_match::<S>),
        )
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
