use crate::core::UpstreamError;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{debug, error};

pub const MALFORMED_QUERY_MESSAGE: &str = "Malformed query string.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed query parameters.
    #[error("{0}")]
    Validation(&'static str),

    /// The upstream API failed. Only `message` reaches the client.
    #[error("{message}")]
    Upstream {
        route: &'static str,
        message: &'static str,
        #[source]
        source: UpstreamError,
    },
}

impl ApiError {
    pub fn upstream(route: &'static str, message: &'static str) -> impl FnOnce(UpstreamError) -> Self {
        move |source| ApiError::Upstream {
            route,
            message,
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        debug!(error = %rejection, "Rejected query string");
        ApiError::Validation(MALFORMED_QUERY_MESSAGE)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Upstream { route, source, .. } = &self {
            error!(route, error = %source, "Upstream request failed");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
