// src/lib.rs

use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use services::conversion::ConversionService;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub conversion: ConversionService,
}

pub mod config;

pub mod entities {
    pub mod prelude;
    pub mod exchange_rates;
}

pub mod services {
    pub mod conversion;
    pub mod exchange_history;
    pub mod exchange_rate_api;
}

pub mod models;
pub mod handlers;

/// Full HTTP surface, shared by the binary and the integration tests
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home::home))
        .route("/exchange/", post(handlers::exchange::convert_currency))
        .route("/exchange", post(handlers::exchange::convert_currency))
        .route("/exchange/history", get(handlers::exchange::get_exchange_history))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
