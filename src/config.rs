//! Widget settings, stored as JSON in the platform config directory.

use crate::error::ConfigError;
use crate::history::DEFAULT_HISTORY_KEY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_GREETING: &str = "Hello! I'm your accessibility assistant. I can help you with:\n\
- WCAG guidelines and compliance\n\
- Assistive technologies\n\
- Inclusive design practices\n\
- Accessibility testing\n\
- And much more!\n\
What would you like to know about accessibility?";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WidgetConfig {
    /// Explicit backend base URL; wins over host-based resolution.
    pub backend_url: Option<String>,
    /// Host name the widget is served from.
    pub host: String,
    pub history_key: String,
    pub greeting: String,
    pub status_phrases: Vec<String>,
    pub status_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub example_questions: Vec<String>,
    pub rich_bot_markup: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            host: "localhost".to_string(),
            history_key: DEFAULT_HISTORY_KEY.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            status_phrases: [
                "Thinking...",
                "Looking through accessibility guidelines...",
                "Gathering the relevant details...",
                "Putting an answer together...",
                "Almost there...",
            ]
            .map(String::from)
            .to_vec(),
            status_interval_secs: 5,
            request_timeout_secs: 30,
            example_questions: [
                "What are the main WCAG principles?",
                "How do I make a website keyboard accessible?",
                "What is alt text and why is it important?",
                "How do I test my website for accessibility?",
                "What assistive technologies are commonly used?",
            ]
            .map(String::from)
            .to_vec(),
            rich_bot_markup: false,
        }
    }
}

impl WidgetConfig {
    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// `<platform config dir>/ChatWidget/configuration/settings.json`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs_next::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(config_dir
        .join("ChatWidget")
        .join("configuration")
        .join("settings.json"))
}

/// Reads the config at `path`, writing defaults when the file is missing or unreadable.
pub fn load_or_initialize_config(path: &Path) -> Result<WidgetConfig, ConfigError> {
    if path.exists() {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match serde_json::from_str(&content) {
            Ok(config) => return Ok(config),
            Err(e) => warn!(path = %path.display(), error = %e, "Malformed config, rewriting defaults"),
        }
    }
    let default_config = WidgetConfig::default();
    write_config(path, &default_config)?;
    Ok(default_config)
}

pub fn write_config(path: &Path, config: &WidgetConfig) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(config)?).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_is_created_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("configuration").join("settings.json");

        let config = load_or_initialize_config(&path).unwrap();
        assert_eq!(config, WidgetConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, r#"{"backend_url":"https://chat.example.org","status_interval_secs":2}"#).unwrap();

        let config = load_or_initialize_config(&path).unwrap();
        assert_eq!(config.backend_url.as_deref(), Some("https://chat.example.org"));
        assert_eq!(config.status_interval(), Duration::from_secs(2));
        assert_eq!(config.history_key, DEFAULT_HISTORY_KEY);
    }

    #[test]
    fn malformed_config_falls_back_and_is_rewritten() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, "{ nope").unwrap();

        let config = load_or_initialize_config(&path).unwrap();
        assert_eq!(config, WidgetConfig::default());
        let rewritten: WidgetConfig =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(rewritten, WidgetConfig::default());
    }

    #[test]
    fn zero_durations_are_clamped() {
        let config = WidgetConfig {
            status_interval_secs: 0,
            request_timeout_secs: 0,
            ..WidgetConfig::default()
        };
        assert_eq!(config.status_interval(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }
}
