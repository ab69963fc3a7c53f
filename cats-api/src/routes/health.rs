use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cats_shared::{HealthCheck, HealthResponse, HealthStatus};
use std::sync::Arc;

use crate::repository::Store;
use crate::AppState;

/// Health check that pings the database.
pub async fn health_check<S: Store>(State(state): State<Arc<AppState<S>>>) -> Response {
    let postgres = match state.store.ping() {
        Ok(()) => HealthCheck {
            name: "postgres".to_string(),
            status: HealthStatus::Healthy,
            message: None,
        },
        Err(e) => HealthCheck {
            name: "postgres".to_string(),
            status: HealthStatus::Unhealthy,
            message: Some(e.to_string()),
        },
    };

    let response = HealthResponse::healthy("cats-api", env!("CARGO_PKG_VERSION"))
        .with_checks(vec![postgres]);

    let status = match response.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(response)).into_response()
}

/// Returns Prometheus metrics.
pub async fn metrics<S: Store>(State(state): State<Arc<AppState<S>>>) -> String {
    state.metrics_handle.render()
}
