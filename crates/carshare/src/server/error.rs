use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::Error;

/// An [`Error`] rendered as a JSON response.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// The HTTP status for the wrapped error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self.0 {
            Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Authorization { .. } => StatusCode::FORBIDDEN,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidState { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.0.is_user_facing() {
            tracing::warn!(status = status.as_u16(), "{}", self.0);
            self.0.to_string()
        } else {
            tracing::error!("Request failed: {}", self.0);
            "internal server error".to_string()
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"carshare\""),
            );
        }
        response
    }
}
