//! Response envelope and error mapping.
//!
//! Success: `{"data": ...}`
//! Failure: `{"error": {"code": 403, "message": "invalid CSRF token"}}`

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::device::DeviceError;
use crate::models::ValidationErrors;

/// Successful response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Json<Self> {
        Json(Self { data })
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: u16,
    message: String,
}

/// Failure of an API request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body could not be extracted (bad JSON, wrong content type).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Rejected { status, .. } => *status,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Device(e) => match e {
                DeviceError::NotConnected(_) => StatusCode::SERVICE_UNAVAILABLE,
                DeviceError::Cancelled => StatusCode::CONFLICT,
                DeviceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                DeviceError::Failure(_) | DeviceError::Transport(_) | DeviceError::Protocol(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "API request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "API request rejected");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: status.as_u16(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
