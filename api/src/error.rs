use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lectio_lib::LectioError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<LectioError> for ApiError {
    fn from(e: LectioError) -> Self {
        let status = match &e {
            LectioError::CorpusNotReady(_) | LectioError::LoadFailed(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            LectioError::NotFound(_) => StatusCode::NOT_FOUND,
            LectioError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            LectioError::Search(_) | LectioError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}
