use axum::{
    extract::{
        rejection::{PathRejection, StringRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::{
    AppState,
    error::AppError,
    models::AnalysisReport,
    services::analysis::AnalysisService,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/analysis", post(ingest_csv))
        .route("/analysis/:id", get(get_analysis).delete(delete_analysis))
        .route("/analysis/:id/statistics", get(get_statistics))
}

/// Runs a service call on the blocking pool; SQLite access is synchronous.
async fn with_service<T, F>(state: &Arc<AppState>, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&AnalysisService) -> Result<T, AppError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state.service))
        .await
        .map_err(|e| AppError::Internal(format!("Analysis task failed: {}", e)))?
}

#[axum::debug_handler]
async fn ingest_csv(
    State(state): State<Arc<AppState>>,
    body: Result<String, StringRejection>,
) -> Result<Json<AnalysisReport>, AppError> {
    let body = body?;
    let start = std::time::Instant::now();
    tracing::info!("Received CSV upload, {} bytes", body.len());

    let report = with_service(&state, move |service| service.ingest(&body)).await?;

    tracing::info!(
        "Analysis {:?} completed in {:?}: {} rows, {} columns",
        report.id,
        start.elapsed(),
        report.number_of_rows,
        report.number_of_columns
    );
    Ok(Json(report))
}

async fn get_analysis(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<AnalysisReport>, AppError> {
    let Path(id) = id?;
    let report = with_service(&state, move |service| service.get_by_id(id)).await?;
    Ok(Json(report))
}

async fn get_statistics(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<AnalysisReport>, AppError> {
    let Path(id) = id?;
    let report = with_service(&state, move |service| service.get_statistics_by_id(id)).await?;
    Ok(Json(report))
}

async fn delete_analysis(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    with_service(&state, move |service| service.delete_by_id(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
