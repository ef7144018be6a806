use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use simple_broker_core::{BrokerError, ErrorClass};

/// Request-boundary translation of broker errors into HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub BrokerError);

impl From<BrokerError> for ApiError {
    fn from(err: BrokerError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.class() {
            ErrorClass::NotFound => StatusCode::NOT_FOUND,
            ErrorClass::Upstream => StatusCode::BAD_GATEWAY,
            ErrorClass::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.0.class() {
            ErrorClass::NotFound => tracing::debug!(error = %self.0, "not found"),
            ErrorClass::Upstream => tracing::warn!(
                error = %self.0,
                upstream_status = ?self.0.upstream_status(),
                "upstream request failed"
            ),
            ErrorClass::Configuration => tracing::error!(error = %self.0, "broker misconfigured"),
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
