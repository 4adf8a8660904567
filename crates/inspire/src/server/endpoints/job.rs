//! Endpoints driving the scrape job: start, status, stop and download.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::job::{DownloadError, StartError, StartRequest};
use crate::server::types::ApiErrorType;
use crate::types::AppState;

fn start_error_to_response(error: StartError) -> Response {
    let status = match &error {
        StartError::AlreadyRunning => StatusCode::CONFLICT,
        StartError::InvalidState { .. }
        | StartError::InvalidDistrict { .. }
        | StartError::NoDistricts => StatusCode::BAD_REQUEST,
        StartError::CatalogUnavailable { .. } => StatusCode::BAD_GATEWAY,
    };

    ApiErrorType::from((status, error.to_string(), Some(error.code().to_string())))
        .into_response()
}

/// POST /api/start
///
/// Body: `{"state_id": "39", "district_ids": ["612"] | "all"}`. The job runs
/// in the background; poll `/api/status` for progress.
pub async fn post_start(
    State(s): State<Arc<AppState>>,
    body: Result<Json<StartRequest>, JsonRejection>,
) -> Response {
    info!("POST /api/start");

    let Json(request) = match body {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Rejected malformed start request");
            return ApiErrorType::from((
                StatusCode::BAD_REQUEST,
                "Invalid request body",
                Some(e.body_text()),
            ))
            .into_response();
        }
    };

    match s.controller.start(request).await {
        Ok(accepted) => (StatusCode::ACCEPTED, Json(accepted)).into_response(),
        Err(e) => {
            warn!(reason = e.code(), "Start request rejected: {}", e);
            start_error_to_response(e)
        }
    }
}

/// GET /api/status
pub async fn get_status(State(s): State<Arc<AppState>>) -> Response {
    (StatusCode::OK, Json(s.controller.status().await)).into_response()
}

/// POST /api/stop
///
/// Asks the running job to stop after its current school. Stopping when
/// nothing runs is not an error.
pub async fn post_stop(State(s): State<Arc<AppState>>) -> Response {
    info!("POST /api/stop");

    let stopping = s.controller.cancel().await;
    let message = if stopping {
        "Stopping after current school..."
    } else {
        "Scraper is not running"
    };

    (
        StatusCode::OK,
        Json(json!({ "stopping": stopping, "message": message })),
    )
        .into_response()
}

/// GET /api/download
///
/// Sends the last job's single CSV file, or a zip of all its files.
pub async fn get_download(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/download");

    match s.controller.download().await {
        Ok(bundle) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, bundle.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", bundle.file_name),
                ),
            ],
            bundle.bytes,
        )
            .into_response(),
        Err(e @ DownloadError::NotReady) => {
            ApiErrorType::from((StatusCode::CONFLICT, e.to_string(), None)).into_response()
        }
        Err(e @ DownloadError::NoOutput) => {
            ApiErrorType::from((StatusCode::NOT_FOUND, e.to_string(), None)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to package download");
            ApiErrorType::from((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to prepare download",
                Some(e.to_string()),
            ))
            .into_response()
        }
    }
}
