//! Unified client error model and mapping helpers.
//! Every API call, session-store access and page mutation reports through `AppError`;
//! page controllers turn it into a transient user-visible message.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// No token, or the backend rejected it (401).
    Unauthorized { code: String, message: String, detail: Option<String> },
    /// Valid session whose role may not reach the resource (403 or a gate denial).
    Forbidden { code: String, message: String, detail: Option<String> },
    /// Rejected client-side before any request was issued.
    Validation { code: String, message: String },
    NotFound { code: String, message: String, detail: Option<String> },
    /// Network or server failure. `detail` is the backend's `detail` field when present.
    RequestFailed { status: Option<u16>, detail: Option<String>, message: String },
    Io { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Unauthorized { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::Validation { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Io { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
            AppError::RequestFailed { .. } => "request_failed",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Unauthorized { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::Validation { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::RequestFailed { message, .. }
            | AppError::Io { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn unauthorized<S: Into<String>>(code: S, msg: S) -> Self { AppError::Unauthorized { code: code.into(), message: msg.into(), detail: None } }
    pub fn forbidden<S: Into<String>>(code: S, msg: S) -> Self { AppError::Forbidden { code: code.into(), message: msg.into(), detail: None } }
    pub fn validation<S: Into<String>>(code: S, msg: S) -> Self { AppError::Validation { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into(), detail: None } }
    pub fn io<S: Into<String>>(code: S, msg: S) -> Self { AppError::Io { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    pub fn request_failed(status: Option<u16>, detail: Option<String>) -> Self {
        let message = match (&detail, status) {
            (Some(d), _) => d.clone(),
            (None, Some(s)) => format!("HTTP {}", s),
            (None, None) => "request failed".to_string(),
        };
        AppError::RequestFailed { status, detail, message }
    }

    /// Classify a non-success HTTP response by status code.
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        let msg = detail.clone().unwrap_or_else(|| format!("HTTP {}", status));
        match status {
            401 => AppError::Unauthorized { code: "unauthorized".into(), message: msg, detail },
            403 => AppError::Forbidden { code: "forbidden".into(), message: msg, detail },
            404 => AppError::NotFound { code: "not_found".into(), message: msg, detail },
            _ => AppError::request_failed(Some(status), detail),
        }
    }

    /// Map to HTTP status code. Client-side failures map to the status the
    /// backend would have used for the same condition.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            AppError::Unauthorized { .. } => Some(401),
            AppError::Forbidden { .. } => Some(403),
            AppError::Validation { .. } => Some(400),
            AppError::NotFound { .. } => Some(404),
            AppError::RequestFailed { status, .. } => *status,
            AppError::Io { .. } | AppError::Internal { .. } => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool { matches!(self, AppError::Unauthorized { .. }) }

    /// Text shown to the user: the backend's detail when it sent one, the
    /// validation message for local rejections, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AppError::RequestFailed { detail: Some(d), .. }
            | AppError::Unauthorized { detail: Some(d), .. }
            | AppError::Forbidden { detail: Some(d), .. }
            | AppError::NotFound { detail: Some(d), .. } => d.clone(),
            AppError::Validation { message, .. } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(s) => AppError::from_status(s.as_u16(), None),
            None if err.is_decode() => AppError::internal("decode_error".to_string(), err.to_string()),
            None => AppError::RequestFailed { status: None, detail: None, message: err.to_string() },
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io { code: "io_error".into(), message: err.to_string() }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal".into(), message: err.to_string() }
    }
}
