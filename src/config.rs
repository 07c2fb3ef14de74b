// ⚙️ Runtime API Configuration
// Read from env/environment.json when the deployment provides one,
// otherwise the client talks to a backend on localhost:7080.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Port the development backend listens on
pub const DEFAULT_API_PORT: u16 = 7080;

/// Base path used when no configuration is available
pub const DEFAULT_BASE_PATH: &str = "http://localhost:7080";

/// Where a deployment publishes its runtime configuration
pub const ENVIRONMENT_PATH: &str = "/env/environment.json";

/// A JSON document must carry at least one of these keys to count as config
const RECOGNIZED_KEYS: [&str; 7] = [
    "basePath",
    "apiKey",
    "username",
    "password",
    "accessToken",
    "baseOptions",
    "formDataCtor",
];

// ============================================================================
// BASE OPTIONS
// ============================================================================

/// Options applied to every request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseOptions {
    /// Extra headers sent with each request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Request timeout in milliseconds (absent or 0 = no timeout)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

// ============================================================================
// API CONFIG
// ============================================================================

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,

    /// Sent as `X-API-Key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Bearer token; wins over username/password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_options: Option<BaseOptions>,

    /// Accepted so browser-side configs parse; this client has no
    /// form-data constructor to override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_data_ctor: Option<serde_json::Value>,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ApiConfig")
            .field("base_path", &self.base_path)
            .field("api_key", &redact(&self.api_key))
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("access_token", &redact(&self.access_token))
            .field("base_options", &self.base_options)
            .finish()
    }
}

impl ApiConfig {
    pub fn with_base_path(base_path: impl Into<String>) -> Self {
        ApiConfig {
            base_path: Some(base_path.into()),
            ..ApiConfig::default()
        }
    }

    /// Parse a runtime configuration document.
    ///
    /// Returns `None` when the text is not a JSON object, carries none of the
    /// recognized keys, or has a recognized key with the wrong shape.
    pub fn from_json(text: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(text).ok()?;
        let object = value.as_object()?;

        if !RECOGNIZED_KEYS.iter().any(|key| object.contains_key(*key)) {
            tracing::debug!("environment document has no API settings");
            return None;
        }

        match serde_json::from_value(value) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed API settings");
                None
            }
        }
    }

    /// Read a runtime configuration file. Missing or unusable files yield `None`.
    pub fn load_file(path: &Path) -> Option<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let config = Self::from_json(&text);
                if config.is_none() {
                    tracing::warn!(path = %path.display(), "environment file not usable, using defaults");
                }
                config
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "no environment file");
                None
            }
        }
    }

    /// Fetch `/env/environment.json` from the given origin.
    ///
    /// A request that fails or answers with an error status is an `Err`. A
    /// document that arrives but is not usable config is `Ok(None)`.
    pub async fn fetch(origin: &Url) -> Result<Option<Self>, reqwest::Error> {
        let url = match origin.join(ENVIRONMENT_PATH) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(%origin, error = %e, "origin cannot hold the environment path");
                return Ok(None);
            }
        };

        let response = reqwest::get(url.clone()).await?.error_for_status()?;
        let text = response.text().await?;
        let config = Self::from_json(&text);
        if config.is_none() {
            tracing::warn!(%url, "environment document not usable, using defaults");
        }
        Ok(config)
    }

    /// Development default derived from the origin the app was served from
    pub fn fallback_for(origin: &Url) -> Self {
        let host = origin.host_str().unwrap_or("localhost");
        Self::with_base_path(format!("{}://{}:{}", origin.scheme(), host, DEFAULT_API_PORT))
    }

    /// Base URL without trailing slashes
    pub fn base_url(&self) -> &str {
        self.base_path
            .as_deref()
            .unwrap_or(DEFAULT_BASE_PATH)
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.base_options
            .as_ref()
            .and_then(|o| o.timeout)
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn headers(&self) -> impl Iterator<Item = (&String, &String)> {
        self.base_options.iter().flat_map(|o| o.headers.iter())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_json_recognizes_any_known_key() {
        let config = ApiConfig::from_json(r#"{"apiKey": "k-123"}"#).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("k-123"));
        assert_eq!(config.base_url(), DEFAULT_BASE_PATH);

        let config = ApiConfig::from_json(r#"{"basePath": "https://api.example.com/v1/"}"#).unwrap();
        assert_eq!(config.base_url(), "https://api.example.com/v1");
    }

    #[test]
    fn test_from_json_rejects_unrelated_documents() {
        assert!(ApiConfig::from_json(r#"{"theme": "dark"}"#).is_none());
        assert!(ApiConfig::from_json("[1, 2, 3]").is_none());
        assert!(ApiConfig::from_json("not json").is_none());
        assert!(ApiConfig::from_json(r#"{"basePath": 42}"#).is_none());
    }

    #[test]
    fn test_from_json_base_options() {
        let config = ApiConfig::from_json(
            r#"{"baseOptions": {"headers": {"X-Tenant": "home"}, "timeout": 2500}}"#,
        )
        .unwrap();

        assert_eq!(config.timeout(), Some(Duration::from_millis(2500)));
        let headers: Vec<_> = config.headers().collect();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].0, "X-Tenant");
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config = ApiConfig::from_json(r#"{"baseOptions": {"timeout": 0}}"#).unwrap();
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_form_data_ctor_is_accepted() {
        let config = ApiConfig::from_json(r#"{"formDataCtor": "FormData"}"#).unwrap();
        assert!(config.form_data_ctor.is_some());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"basePath": "http://bills.local:9000", "accessToken": "t"}}"#).unwrap();

        let config = ApiConfig::load_file(file.path()).unwrap();
        assert_eq!(config.base_url(), "http://bills.local:9000");
        assert_eq!(config.access_token.as_deref(), Some("t"));
    }

    #[test]
    fn test_load_file_missing_or_garbage() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ApiConfig::load_file(&dir.path().join("environment.json")).is_none());

        let path = dir.path().join("garbage.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(ApiConfig::load_file(&path).is_none());
    }

    #[test]
    fn test_fallback_for_origin() {
        let origin = Url::parse("https://bills.example.org:8443/app/").unwrap();
        let config = ApiConfig::fallback_for(&origin);
        assert_eq!(config.base_url(), "https://bills.example.org:7080");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ApiConfig {
            password: Some("hunter2".to_string()),
            access_token: Some("secret-token".to_string()),
            ..ApiConfig::with_base_path("http://x")
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("<redacted>"));
    }
}
