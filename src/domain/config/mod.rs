//! Application configuration value object

use serde::{Deserialize, Serialize};

/// Default handover service URL
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the live transcription service
    pub api_key: Option<String>,
    /// Base URL of the handover summarization service
    pub backend_url: Option<String>,
    /// Language hint passed to the transcriber
    pub language: Option<String>,
    /// Copy the generated report markdown to the clipboard
    pub clipboard: Option<bool>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            api_key: None,
            backend_url: Some(DEFAULT_BACKEND_URL.to_string()),
            language: Some("en".to_string()),
            clipboard: Some(false),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            api_key: other.api_key.or(self.api_key),
            backend_url: other.backend_url.or(self.backend_url),
            language: other.language.or(self.language),
            clipboard: other.clipboard.or(self.clipboard),
        }
    }

    /// Get the backend URL, or the default if not set
    pub fn backend_url_or_default(&self) -> &str {
        self.backend_url.as_deref().unwrap_or(DEFAULT_BACKEND_URL)
    }

    /// Get the language hint, or "en" if not set
    pub fn language_or_default(&self) -> &str {
        self.language.as_deref().unwrap_or("en")
    }

    /// Get the clipboard setting, or false if not set
    pub fn clipboard_or_default(&self) -> bool {
        self.clipboard.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert!(config.api_key.is_none());
        assert_eq!(config.backend_url.as_deref(), Some(DEFAULT_BACKEND_URL));
        assert_eq!(config.language.as_deref(), Some("en"));
        assert_eq!(config.clipboard, Some(false));
    }

    #[test]
    fn merge_prefers_other() {
        let base = AppConfig {
            api_key: Some("base-key".to_string()),
            backend_url: Some("http://base:8000".to_string()),
            language: None,
            clipboard: Some(false),
        };
        let other = AppConfig {
            api_key: None,
            backend_url: Some("http://other:9000".to_string()),
            language: Some("de".to_string()),
            clipboard: None,
        };

        let merged = base.merge(other);
        assert_eq!(merged.api_key.as_deref(), Some("base-key"));
        assert_eq!(merged.backend_url.as_deref(), Some("http://other:9000"));
        assert_eq!(merged.language.as_deref(), Some("de"));
        assert_eq!(merged.clipboard, Some(false));
    }

    #[test]
    fn accessors_fall_back_to_defaults() {
        let config = AppConfig::empty();
        assert_eq!(config.backend_url_or_default(), DEFAULT_BACKEND_URL);
        assert_eq!(config.language_or_default(), "en");
        assert!(!config.clipboard_or_default());
    }

    #[test]
    fn toml_roundtrip() {
        let config = AppConfig::defaults();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.backend_url, config.backend_url);
        assert_eq!(parsed.language, config.language);
    }
}
