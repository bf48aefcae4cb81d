use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use svngate_core::GatewayError;

/// Error returned by the route handlers.
///
/// Rendered as a plain-text body holding the message, so callers see the
/// same text that was logged.
#[derive(Debug)]
pub struct ApiErr {
    status: StatusCode,
    message: String,
}

impl ApiErr {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Every pipeline failure is a 500; the kind only shows up in the logs.
impl From<GatewayError> for ApiErr {
    fn from(err: GatewayError) -> Self {
        tracing::warn!(kind = err.kind(), "request failed: {err}");
        Self::internal(err.to_string())
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.message,
        )
            .into_response()
    }
}
