//! API response types.
//!
//! Most endpoints answer with the bare resource. These wrappers cover the
//! envelopes some routes use.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// `{"data": ...}` envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a value.
    pub const fn ok(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `{"success": true}`, optionally with `data`.
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize = ()> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl Success {
    /// Plain acknowledgement.
    #[must_use]
    pub const fn ack() -> Self {
        Self {
            success: true,
            data: None,
        }
    }
}

impl<T: Serialize> Success<T> {
    /// Acknowledgement carrying a payload.
    pub const fn with(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
