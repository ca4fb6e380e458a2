//! Client configuration parsed from environment variables.

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_SESSION_ID: &str = "mallang-session";
pub const DEFAULT_SPEECH_LOCALE: &str = "ko-KR";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors produced while building a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value was present but unusable.
    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// REST backend base URL, without a trailing slash.
    pub api_url: String,
    /// Media provisioning backend base URL, without a trailing slash.
    pub media_url: String,
    /// Fixed call session identifier used when joining.
    pub session_id: String,
    /// Locale for speech recognition and synthesis.
    pub speech_locale: String,
    pub timeouts: Timeouts,
}

impl Config {
    /// Build a config pointing both backends at `api_url`, with defaults elsewhere.
    #[must_use]
    pub fn new(api_url: &str) -> Self {
        let api_url = trim_url(api_url);
        Self {
            media_url: api_url.clone(),
            api_url,
            session_id: DEFAULT_SESSION_ID.to_owned(),
            speech_locale: DEFAULT_SPEECH_LOCALE.to_owned(),
            timeouts: Timeouts::default(),
        }
    }

    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `MALLANG_API_URL`: default `http://localhost:8080/api`
    /// - `MALLANG_MEDIA_URL`: defaults to the API URL
    /// - `MALLANG_SESSION_ID`: default `mallang-session`
    /// - `MALLANG_SPEECH_LOCALE`: default `ko-KR`
    /// - `MALLANG_REQUEST_TIMEOUT_SECS`: default 30
    /// - `MALLANG_CONNECT_TIMEOUT_SECS`: default 10
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = trim_url(&std::env::var("MALLANG_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned()));
        if api_url.is_empty() {
            return Err(ConfigError::Parse("MALLANG_API_URL is empty".into()));
        }
        let media_url = match std::env::var("MALLANG_MEDIA_URL") {
            Ok(raw) => trim_url(&raw),
            Err(_) => api_url.clone(),
        };
        if media_url.is_empty() {
            return Err(ConfigError::Parse("MALLANG_MEDIA_URL is empty".into()));
        }
        let session_id = std::env::var("MALLANG_SESSION_ID").unwrap_or_else(|_| DEFAULT_SESSION_ID.to_owned());
        if session_id.trim().is_empty() {
            return Err(ConfigError::Parse("MALLANG_SESSION_ID is empty".into()));
        }
        let speech_locale =
            std::env::var("MALLANG_SPEECH_LOCALE").unwrap_or_else(|_| DEFAULT_SPEECH_LOCALE.to_owned());
        let timeouts = Timeouts {
            request_secs: env_parse_u64("MALLANG_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("MALLANG_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api_url, media_url, session_id, speech_locale, timeouts })
    }
}

fn trim_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
