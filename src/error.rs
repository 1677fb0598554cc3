use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("not authorized")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Translate a failed backend response into the gateway's error set.
    ///
    /// 400, 409 and 422 keep the backend's message so forms can show it;
    /// anything unrecognised collapses into a 500.
    pub fn from_backend_status(status: u16, body: &Value) -> Self {
        match status {
            401 => AppError::Unauthenticated,
            403 => AppError::Forbidden,
            404 => AppError::NotFound,
            400 | 409 | 422 => AppError::BadRequest(
                backend_message(body).unwrap_or_else(|| "bad request".to_string()),
            ),
            other => AppError::Backend(format!(
                "status {other}: {}",
                backend_message(body).unwrap_or_default()
            )),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Backend(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn backend_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Backend(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Backend(detail) | AppError::Internal(detail) => {
                error!("Request failed: {detail}");
                "internal server error".to_string()
            }
            AppError::Unauthenticated | AppError::Forbidden => {
                warn!("Rejected request: {self}");
                self.to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_statuses_map_to_gateway_errors() {
        let empty = Value::Null;
        assert!(matches!(AppError::from_backend_status(403, &empty), AppError::Forbidden));
        assert!(matches!(AppError::from_backend_status(404, &empty), AppError::NotFound));
        assert!(matches!(AppError::from_backend_status(401, &empty), AppError::Unauthenticated));
        assert!(matches!(AppError::from_backend_status(502, &empty), AppError::Backend(_)));
        assert_eq!(
            AppError::from_backend_status(503, &empty).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_failures_keep_backend_message() {
        let body = json!({ "message": "price must be positive" });
        match AppError::from_backend_status(422, &body) {
            AppError::BadRequest(msg) => assert_eq!(msg, "price must be positive"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn messages_match_frontend_contract() {
        assert_eq!(AppError::Forbidden.to_string(), "not authorized");
        assert_eq!(AppError::NotFound.to_string(), "not found");
    }
}
