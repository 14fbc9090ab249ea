//! ClientConfig - API クライアントの設定
//!
//! JSON で書いて `from_json_str` で読み込む:
//! ```json
//! {
//!   "base_url": "https://api.github.com",
//!   "default_headers": { "Accept": "application/vnd.github+json" },
//!   "retry_on_failure": true
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("base_url must not be empty")]
    EmptyBaseUrl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,

    /// Headers applied to every task the controller creates.
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,

    /// Whether new tasks may run one recovery retry.
    #[serde(default = "default_retry_on_failure")]
    pub retry_on_failure: bool,
}

fn default_retry_on_failure() -> bool {
    true
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_headers: BTreeMap::new(),
            retry_on_failure: default_retry_on_failure(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        Ok(config)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn retry_on_failure(mut self, retry: bool) -> Self {
        self.retry_on_failure = retry;
        self
    }

    /// Absolute URLs pass through; anything else is joined to `base_url`
    /// with exactly one slash.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_full_config() {
        let config = ClientConfig::from_json_str(
            r#"{
                "base_url": "https://api.github.com",
                "default_headers": { "Accept": "application/vnd.github+json" },
                "retry_on_failure": false
            }"#,
        )
        .unwrap();

        assert_eq!(config.base_url, "https://api.github.com");
        assert_eq!(config.default_headers["Accept"], "application/vnd.github+json");
        assert!(!config.retry_on_failure);
    }

    #[test]
    fn optional_fields_default() {
        let config = ClientConfig::from_json_str(r#"{ "base_url": "https://api.github.com" }"#).unwrap();
        assert!(config.default_headers.is_empty());
        assert!(config.retry_on_failure);
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let err = ClientConfig::from_json_str(r#"{ "base_url": "  " }"#).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyBaseUrl));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = ClientConfig::from_json_str("{ base_url").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[rstest]
    #[case::plain("https://api.test", "users/octocat", "https://api.test/users/octocat")]
    #[case::both_slashes("https://api.test/", "/users/octocat", "https://api.test/users/octocat")]
    #[case::empty_path("https://api.test/", "", "https://api.test")]
    #[case::absolute("https://api.test", "https://other.test/x", "https://other.test/x")]
    fn url_joining(#[case] base: &str, #[case] path: &str, #[case] expected: &str) {
        assert_eq!(ClientConfig::new(base).url_for(path), expected);
    }
}
