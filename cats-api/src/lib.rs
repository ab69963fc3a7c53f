use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

pub mod cat_filter;
pub mod config;
pub mod models;
pub mod repository;
pub mod routes;
pub mod schema;
pub mod services;

use cats_shared::types::auth::JwtSecretSource;
use config::AppConfig;
use repository::Store;
use services::{CatMatchService, CatService, UserService};

pub struct AppState<S: Store> {
    pub config: AppConfig,
    pub store: Arc<S>,
    pub users: UserService<S>,
    pub cats: CatService<S>,
    pub matches: CatMatchService<S>,
    pub metrics_handle: PrometheusHandle,
}

impl<S: Store> AppState<S> {
    pub fn new(config: AppConfig, store: Arc<S>, metrics_handle: PrometheusHandle) -> Self {
        Self {
            users: UserService::new(store.clone(), config.jwt_secret.clone(), config.jwt_access_ttl),
            cats: CatService::new(store.clone()),
            matches: CatMatchService::new(store.clone()),
            store,
            config,
            metrics_handle,
        }
    }
}

impl<S: Store> JwtSecretSource for AppState<S> {
    fn jwt_secret(&self) -> &str {
        &self.config.jwt_secret
    }
}
