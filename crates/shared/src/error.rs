use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimited,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            400 | 409 | 422 => ErrorCode::Validation,
            429 => ErrorCode::RateLimited,
            _ => ErrorCode::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

/// FastAPI reports failures as `{"detail": ...}` where detail is either a
/// string or a list of validation records.
#[derive(Deserialize)]
struct DetailBody {
    detail: serde_json::Value,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Builds an error from a non-success response body, falling back to the
    /// raw text when the body is not one of the known JSON shapes.
    pub fn from_response(status: u16, body: &str) -> Self {
        if let Ok(api_error) = serde_json::from_str::<ApiError>(body) {
            return api_error;
        }

        let code = ErrorCode::from_status(status);
        if let Ok(detail) = serde_json::from_str::<DetailBody>(body) {
            let message = match detail.detail {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            };
            return Self::new(code, message);
        }

        let trimmed = body.trim();
        if trimmed.is_empty() {
            Self::new(code, format!("http status {status}"))
        } else {
            Self::new(code, trimmed)
        }
    }
}

#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct ApiException {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiException {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<ApiException> for ApiError {
    fn from(value: ApiException) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}
