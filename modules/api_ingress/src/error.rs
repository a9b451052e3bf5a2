use axum::{
    extract::{rejection::BytesRejection, Request},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub const NOT_FOUND_MESSAGE: &str = "Resource not found.";
pub const INTERNAL_MESSAGE: &str = "Internal server error.";
pub const TOO_LARGE_MESSAGE: &str = "Request body is too large.";
pub const TIMEOUT_MESSAGE: &str = "Request timed out.";

/// HTTP boundary error. Every variant renders as `{ "message": ... }`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    /// Client or transport error raised outside the handlers (body limits, timeouts).
    #[error("{1}")]
    Status(StatusCode, String),
    /// Known server-side failure whose message is safe to return.
    #[error("{0}")]
    Server(String),
    /// Anything unexpected; the client only sees a generic message.
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Status(status, _) => *status,
            AppError::Server(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Internal(err) => {
                tracing::error!(error = ?err, status = status.as_u16(), "request failed");
                INTERNAL_MESSAGE.to_string()
            }
            AppError::Server(m) => {
                tracing::error!(error = %m, status = status.as_u16(), "request failed");
                m.clone()
            }
            AppError::BadRequest(m) | AppError::NotFound(m) | AppError::Status(_, m) => {
                tracing::warn!(error = %m, status = status.as_u16(), "request failed");
                m.clone()
            }
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e)
    }
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => {
                AppError::Status(StatusCode::PAYLOAD_TOO_LARGE, TOO_LARGE_MESSAGE.to_string())
            }
            StatusCode::BAD_REQUEST => AppError::BadRequest(rejection.body_text()),
            status => AppError::Status(status, rejection.body_text()),
        }
    }
}

fn message_for(status: StatusCode) -> String {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => TOO_LARGE_MESSAGE.to_string(),
        StatusCode::REQUEST_TIMEOUT => TIMEOUT_MESSAGE.to_string(),
        StatusCode::NOT_FOUND => NOT_FOUND_MESSAGE.to_string(),
        other => format!("{}.", other.canonical_reason().unwrap_or("Request failed")),
    }
}

fn is_json(resp: &Response) -> bool {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Re-render error responses produced by layers (body limit, timeout) as `{ "message": ... }`.
pub async fn json_error_body(req: Request, next: Next) -> Response {
    let resp = next.run(req).await;
    let status = resp.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(&resp) {
        return resp;
    }

    let (mut parts, _) = resp.into_parts();
    let rendered = AppError::Status(status, message_for(status)).into_response();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, rendered.into_body())
}

/// Router and method fallback: anything not routed is a 404.
pub async fn not_found() -> AppError {
    AppError::NotFound(NOT_FOUND_MESSAGE.to_string())
}
