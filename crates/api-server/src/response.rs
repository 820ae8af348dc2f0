//! Response envelope and error mapping
//!
//! Every body has the shape `{ "message", "data", "status" }`. Errors carry
//! `{ "detail", "error_code" }` as their data.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct MessageResponse<T> {
    pub message: &'static str,
    pub data: T,
    pub status: u16,
}

/// Successful response wrapped in the envelope
pub fn success<T: Serialize>(status: StatusCode, data: T) -> Response {
    (
        status,
        Json(MessageResponse {
            message: "Success",
            data,
            status: status.as_u16(),
        }),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
    pub error_code: &'static str,
}

#[derive(Debug, Error)]
#[error("{error_code}: {detail}")]
pub struct ApiError {
    pub status: StatusCode,
    pub error_code: &'static str,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error_code: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status,
            error_code,
            detail: detail.into(),
        }
    }

    pub fn title_mismatch(path_title: &str, body_title: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "TITLE_MISMATCH",
            format!("Cannot rename task '{path_title}' to '{body_title}'"),
        )
    }

    fn unprocessable(detail: String) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", detail)
    }
}

impl From<todo_core::Error> for ApiError {
    fn from(err: todo_core::Error) -> Self {
        use todo_core::Error;

        let (status, error_code) = match &err {
            Error::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Error::DuplicateTitle(_) => (StatusCode::CONFLICT, "DUPLICATE_TASK"),
            Error::TaskNotFound(_) => (StatusCode::NOT_FOUND, "TASK_NOT_FOUND"),
            Error::InvalidCursor(_) => (StatusCode::BAD_REQUEST, "INVALID_CURSOR"),
        };
        Self::new(status, error_code, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::unprocessable(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::unprocessable(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(MessageResponse {
                message: "Error",
                data: ErrorDetail {
                    detail: self.detail,
                    error_code: self.error_code,
                },
                status: self.status.as_u16(),
            }),
        )
            .into_response()
    }
}
