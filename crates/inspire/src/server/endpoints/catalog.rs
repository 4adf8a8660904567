//! Endpoints listing the states and districts a job can target.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::server::types::ApiErrorType;
use crate::types::AppState;

/// GET /api/states
///
/// Returns every state in portal order.
pub async fn get_states(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/states");
    (StatusCode::OK, Json(s.controller.catalog().states())).into_response()
}

/// GET /api/districts/:state_id
///
/// Returns the districts of a state, asking the portal the first time a
/// state is requested. `state_id` may also be the state's name.
pub async fn get_districts(
    State(s): State<Arc<AppState>>,
    Path(state_id): Path<String>,
) -> Response {
    info!("GET /api/districts/{}", state_id);

    let Some(state) = s.controller.catalog().state(&state_id).cloned() else {
        return ApiErrorType::from((
            StatusCode::NOT_FOUND,
            "Unknown state",
            Some(state_id),
        ))
        .into_response();
    };

    match s.controller.districts(&state).await {
        Ok(districts) => (StatusCode::OK, Json(districts)).into_response(),
        Err(e) => {
            error!(state = %state.name, error = %e, "District discovery failed");
            ApiErrorType::from((
                StatusCode::BAD_GATEWAY,
                format!("Could not load districts for {}", state.name),
                Some(e.to_string()),
            ))
            .into_response()
        }
    }
}
