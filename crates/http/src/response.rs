//! Success envelope shared by module handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const SUCCESS_STATUS: &str = "success";

/// `{"status":"success"}` with optional `message` and `data` members
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip)]
    code: StatusCode,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 carrying a data payload
    pub fn ok(data: T) -> Self {
        Self {
            code: StatusCode::OK,
            status: SUCCESS_STATUS,
            message: None,
            data: Some(data),
        }
    }

    /// 201 carrying a message and a data payload
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            code: StatusCode::CREATED,
            status: SUCCESS_STATUS,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.code
    }
}

impl ApiResponse<()> {
    /// 200 carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::OK,
            status: SUCCESS_STATUS,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.code, Json(self)).into_response()
    }
}
