use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use search_engine::SearchEngineError;
use serde::Serialize;

/// Failure of an API call, rendered as `{"result": false, "error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    Engine(SearchEngineError),
    /// Request body could not be read
    BadRequest(String),
}

impl From<SearchEngineError> for ApiError {
    fn from(err: SearchEngineError) -> Self {
        ApiError::Engine(err)
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    result: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Engine(err) if err.is_user_error() => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Engine(err) => {
                tracing::error!(error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };

        (
            status,
            Json(ErrorResponse {
                result: false,
                error: message,
            }),
        )
            .into_response()
    }
}
