//! JSON error responses

use crate::error::Error;
use crate::providers::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    ProviderUnavailable,
    BadRequest,
    UpstreamUnavailable,
    NotFound,
    Internal,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: ErrorCode,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: ErrorCode,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        match err {
            Error::Validation(_) => {
                Self::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, message)
            }
            Error::ProviderUnavailable(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::ProviderUnavailable,
                message,
            ),
            Error::NotFound(_) => Self::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, message),
            Error::Provider { provider, error } => match error {
                ProviderError::BadRequest(_) => {
                    Self::new(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, message)
                }
                ProviderError::Unavailable(_) => {
                    tracing::warn!("{} provider failed: {}", provider, error);
                    Self::new(
                        StatusCode::BAD_GATEWAY,
                        ErrorCode::UpstreamUnavailable,
                        message,
                    )
                }
                ProviderError::NotFound(_) => {
                    Self::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, message)
                }
            },
        }
    }
}
