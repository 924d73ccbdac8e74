//! HTTP error mapping
//!
//! Every failure answers with an [`ErrorBody`]: `{error, message}` plus the
//! authoritative state on a stale submission.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uttt_sync::{ErrorBody, Rejection, StoreError};

#[derive(Debug)]
pub enum ApiError {
    /// Move pipeline rejection (404 / 409 / 422 / 500)
    Rejected(Rejection),
    /// Lobby failure with an explicit status
    Lobby {
        status: StatusCode,
        error: &'static str,
        message: String,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Lobby {
            status: StatusCode::BAD_REQUEST,
            error: "bad_request",
            message: message.into(),
        }
    }

    pub fn invalid_password(status: StatusCode) -> Self {
        ApiError::Lobby {
            status,
            error: "invalid_password",
            message: "Invalid password".to_string(),
        }
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        ApiError::Rejected(rejection)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Rejected(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Rejected(rejection) => {
                let status = StatusCode::from_u16(rejection.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, rejection.to_body())
            }
            ApiError::Lobby {
                status,
                error,
                message,
            } => (
                status,
                ErrorBody {
                    error: error.to_string(),
                    message,
                    index: None,
                    current_state: None,
                    current_version: None,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}
