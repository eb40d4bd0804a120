//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::ConfigError;

/// Default API base URL (the development server's address).
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Default probability that the placeholder grader marks an answer correct.
pub const DEFAULT_CORRECT_RATE: f64 = 0.7;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote API.
    pub api_url: Url,
    /// File holding the persisted session (`token` + `user`).
    pub session_path: PathBuf,
    /// Directory for rolling log files.
    pub log_dir: PathBuf,
    /// Transport timeout for HTTP requests (`None` = wait forever).
    pub http_timeout: Option<Duration>,
    /// Google OAuth client id. Google login is refused without it.
    pub google_client_id: Option<String>,
    /// Probability the placeholder grader marks an answer correct.
    pub correct_rate: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let home = default_home();
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            session_path: home.join("session.json"),
            log_dir: home.join("logs"),
            http_timeout: Some(Duration::from_secs(60)),
            google_client_id: None,
            correct_rate: DEFAULT_CORRECT_RATE,
        }
    }
}

impl ClientConfig {
    /// Build configuration from `MATH_PRACTICE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(raw) = get("MATH_PRACTICE_API_URL") {
            config.api_url = parse_api_url(&raw)?;
        }

        if let Some(path) = get("MATH_PRACTICE_SESSION_PATH") {
            config.session_path = PathBuf::from(path);
        }

        if let Some(dir) = get("MATH_PRACTICE_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        if let Some(raw) = get("MATH_PRACTICE_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "MATH_PRACTICE_HTTP_TIMEOUT_SECS".to_string(),
                message: format!("expected a whole number of seconds, got {raw:?}"),
            })?;
            config.http_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        config.google_client_id = get("MATH_PRACTICE_GOOGLE_CLIENT_ID");

        if let Some(raw) = get("MATH_PRACTICE_CORRECT_RATE") {
            let rate: f64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "MATH_PRACTICE_CORRECT_RATE".to_string(),
                message: format!("expected a number between 0 and 1, got {raw:?}"),
            })?;
            if !rate.is_finite() {
                return Err(ConfigError::InvalidValue {
                    key: "MATH_PRACTICE_CORRECT_RATE".to_string(),
                    message: format!("expected a finite number, got {raw:?}"),
                });
            }
            config.correct_rate = rate.clamp(0.0, 1.0);
        }

        Ok(config)
    }
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        key: "MATH_PRACTICE_API_URL".to_string(),
        message: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            key: "MATH_PRACTICE_API_URL".to_string(),
            message: format!("unsupported scheme {:?}", url.scheme()),
        });
    }
    Ok(url)
}

fn default_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".math-practice")
}
