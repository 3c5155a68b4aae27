use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Unavailable,
    Internal,
}

/// Error body returned by the directory service on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("directory responded {status} ({code:?}): {message}")]
pub struct DirectoryException {
    pub status: u16,
    pub code: ErrorCode,
    pub message: String,
}

impl DirectoryException {
    pub fn from_api_error(status: u16, error: ApiError) -> Self {
        Self {
            status,
            code: error.code,
            message: error.message,
        }
    }

    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let code = match status {
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            400 | 422 => ErrorCode::Validation,
            502..=504 => ErrorCode::Unavailable,
            _ => ErrorCode::Internal,
        };
        Self {
            status,
            code,
            message: body.into(),
        }
    }
}
