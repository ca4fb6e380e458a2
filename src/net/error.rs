//! REST error taxonomy and the user-facing message table.
//!
//! The backend reports domain failures as `{errorCode, message, timestamp}`
//! with `S000x` codes. [`ErrorCode`] is the fixed vocabulary the client shows
//! to users; anything outside it reads as unknown.

use serde::Deserialize;

/// Message shown when no response was received at all.
pub const UNREACHABLE_MESSAGE: &str = "서버에 연결할 수 없습니다. 네트워크 상태를 확인해주세요.";

/// Domain error codes surfaced to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    BadRequest,
    Unauthenticated,
    Forbidden,
    ServerError,
    Unknown,
}

impl ErrorCode {
    /// Parse a backend `errorCode` value.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "S0001" => Self::BadRequest,
            "S0002" => Self::Unauthenticated,
            "S0003" => Self::Forbidden,
            "S0005" => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Fallback classification when the body carried no code.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthenticated,
            403 => Self::Forbidden,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn user_message(self) -> &'static str {
        match self {
            Self::BadRequest => "잘못된 요청입니다.",
            Self::Unauthenticated => "로그인이 필요합니다.",
            Self::Forbidden => "접근 권한이 없습니다.",
            Self::ServerError => "서버 오류가 발생했습니다.",
            Self::Unknown => "알 수 없는 오류가 발생했습니다.",
        }
    }
}

/// Errors produced by REST and provisioning calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response was received (DNS, connect, timeout, reset).
    #[error("request failed: {0}")]
    Transport(String),

    /// Non-success status without a structured error body.
    #[error("response error: status {status}")]
    Status { status: u16, body: String },

    /// Non-success status carrying a backend `{errorCode, message}` body.
    #[error("{code}: {message} (status {status})")]
    Domain { status: u16, code: String, message: String },

    /// The response body could not be deserialized.
    #[error("response parse failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// HTTP status, when a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Domain { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Vocabulary code, preferring the backend's code over the HTTP status.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Domain { code, status, .. } => match ErrorCode::from_code(code) {
                ErrorCode::Unknown => ErrorCode::from_status(*status),
                known => known,
            },
            Self::Status { status, .. } => ErrorCode::from_status(*status),
            _ => ErrorCode::Unknown,
        }
    }

    /// Text for generic error banners: transport failures get the
    /// unreachable message, server-reported errors keep the server's wording.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => UNREACHABLE_MESSAGE.to_owned(),
            Self::Domain { message, .. } if !message.trim().is_empty() => message.clone(),
            other => other.code().user_message().to_owned(),
        }
    }

    /// Text for password-protected room entry, always from the fixed table.
    #[must_use]
    pub fn password_check_message(&self) -> &'static str {
        match self {
            Self::Transport(_) => UNREACHABLE_MESSAGE,
            other => other.code().user_message(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

/// Backend error body: `{errorCode, message, timestamp}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorBody {
    pub error_code: String,
    #[serde(default)]
    pub message: String,
}

/// Classify a non-success response body.
pub(crate) fn error_from_response(status: u16, body: String) -> ApiError {
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => ApiError::Domain { status, code: parsed.error_code, message: parsed.message },
        Err(_) => ApiError::Status { status, body },
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
