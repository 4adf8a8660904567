use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::types::AppState;

/// GET /health
///
/// Also reports which portal page and output directory the server uses.
pub async fn get_health(State(s): State<Arc<AppState>>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "portal": s.config.base_url,
            "output_dir": s.config.output_dir.display().to_string(),
        })),
    )
        .into_response()
}
