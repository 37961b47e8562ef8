use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::{AppError, AppResult};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
/// Lifetime of a persisted access token (one day).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Client settings resolved from the environment, then overridden by CLI flags.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub session_path: PathBuf,
    pub session_ttl: Duration,
}

impl ClientConfig {
    /// `CONTENT_SUITE_API_URL` (or `NEXT_PUBLIC_API_URL`), `CONTENT_SUITE_SESSION_FILE`,
    /// `CONTENT_SUITE_SESSION_TTL_SECS`.
    pub fn from_env() -> AppResult<Self> {
        let api = std::env::var("CONTENT_SUITE_API_URL")
            .or_else(|_| std::env::var("NEXT_PUBLIC_API_URL"))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let session_path = std::env::var("CONTENT_SUITE_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_session_path());
        let session_ttl = std::env::var("CONTENT_SUITE_SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SESSION_TTL);
        Ok(Self { api_url: parse_api_url(&api)?, session_path, session_ttl })
    }

    pub fn with_api_url(mut self, api: &str) -> AppResult<Self> {
        self.api_url = parse_api_url(api)?;
        Ok(self)
    }

    pub fn with_session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = path.into();
        self
    }
}

pub fn parse_api_url(raw: &str) -> AppResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| AppError::validation("invalid_api_url".to_string(), format!("invalid API URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::validation("invalid_api_url".to_string(), format!("unsupported scheme '{}'", other))),
    }
}

fn default_session_path() -> PathBuf {
    let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")).unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".content-suite").join("session.json")
}
