use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::inference::service::StructureError;

/// Error returned by handlers, rendered as `{"error": "..."}` with its status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: HttpErrorResponse,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HttpErrorResponse {
    pub error: String,
}

impl From<String> for HttpErrorResponse {
    fn from(message: String) -> Self {
        HttpErrorResponse { error: message }
    }
}

impl From<&str> for HttpErrorResponse {
    fn from(message: &str) -> Self {
        HttpErrorResponse {
            error: message.to_string(),
        }
    }
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<HttpErrorResponse>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut res = Json(self.message).into_response();
        *res.status_mut() = self.status;
        res
    }
}

impl From<StructureError> for ApiError {
    fn from(err: StructureError) -> Self {
        let status = match err {
            StructureError::Validation(_) => StatusCode::BAD_REQUEST,
            StructureError::RetriesExhausted { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        ApiError::new(status, err.to_string())
    }
}

pub type ApiResult<T, E = ApiError> = Result<T, E>;

#[macro_export]
macro_rules! bail_api {
    ($status:expr, $error_message:expr) => {
        return Err($crate::error::ApiError::new($status, $error_message))
    };
    ($status:expr, $fmt:expr $(, $arg:expr)+) => {
        return Err($crate::error::ApiError::new($status, format!($fmt $(, $arg)+)))
    };
}

#[cfg(test)]
mod tests {
    use crate::inference::backend::BackendError;
    use crate::inference::service::AttemptError;
    use crate::models::structure::ValidationError;

    use super::*;

    #[test]
    fn validation_failure_is_bad_request() {
        let err = ApiError::from(StructureError::Validation(ValidationError::MissingRawText));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, HttpErrorResponse::from("raw_text is required"));
    }

    #[test]
    fn exhausted_retries_are_unprocessable() {
        let err = ApiError::from(StructureError::RetriesExhausted {
            attempts: 3,
            last: AttemptError::Backend(BackendError::from("network timeout")),
        });
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.message.error, "all 3 attempts failed: network timeout");
    }

    #[test]
    fn renders_json_body_with_status() {
        let response = ApiError::new(StatusCode::BAD_REQUEST, "invalid request body").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
    }
}
