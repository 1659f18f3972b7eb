use axum::{extract::DefaultBodyLimit, http::Method, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};

use crate::AppState;

pub mod analysis;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_check))
        .merge(analysis::routes())
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
pub(crate) fn test_state(max_body_size: usize) -> Arc<AppState> {
    use crate::config::Config;
    use crate::services::{
        analysis::AnalysisService, content_rules::ContentPolicy, store::AnalysisStore,
    };

    let config = Config {
        addr: "127.0.0.1:0".parse().expect("valid test address"),
        database: ":memory:".to_string(),
        max_body_size,
        forbidden_content: vec!["Sonny Hayes".to_string()],
    };
    let store = Arc::new(AnalysisStore::open(&config.database).expect("in-memory store"));
    let service = AnalysisService::new(store, ContentPolicy::new(config.forbidden_content.clone()));
    Arc::new(AppState::new(config, service))
}
