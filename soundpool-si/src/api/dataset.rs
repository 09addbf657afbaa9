//! Dataset survey endpoint
//!
//! Read-only view of what has been collected so far, for monitoring
//! collection progress from the capture page. Never mutates the store.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::services::dataset_scanner::{DatasetScanner, DatasetStats};
use crate::AppState;

/// GET /dataset/stats response
#[derive(Debug, Serialize)]
pub struct DatasetStatsResponse {
    pub root: String,
    #[serde(flatten)]
    pub stats: DatasetStats,
}

/// GET /dataset/stats
pub async fn dataset_stats(State(state): State<AppState>) -> ApiResult<Json<DatasetStatsResponse>> {
    let root = state.store.root().to_path_buf();
    let scanner = DatasetScanner::new(root.clone());

    // walkdir is synchronous; keep it off the async workers
    let stats = tokio::task::spawn_blocking(move || scanner.scan())
        .await
        .map_err(|e| ApiError::Internal(format!("Scan task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("Dataset scan failed: {e}")))?;

    Ok(Json(DatasetStatsResponse {
        root: root.display().to_string(),
        stats,
    }))
}

/// Build dataset survey routes
pub fn dataset_routes() -> Router<AppState> {
    Router::new().route("/dataset/stats", get(dataset_stats))
}
