use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// The body of every error response.
#[derive(Serialize, Debug)]
pub struct ApiErrorType {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<String>,
}

impl<S: Into<String>> From<(StatusCode, S, Option<String>)> for ApiErrorType {
    fn from((status, error, context): (StatusCode, S, Option<String>)) -> Self {
        Self {
            status,
            error: error.into(),
            context,
        }
    }
}

impl IntoResponse for ApiErrorType {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
