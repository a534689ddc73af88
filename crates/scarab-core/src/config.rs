//! Page configuration.
//!
//! Loaded from `~/.config/scarab/config.json` when present, then overridden
//! by environment variables. Both external URLs are optional: a missing
//! collector URL degrades logging to console simulation, while a missing
//! survey URL is a fatal error at redirect time.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::countdown::DEFAULT_COUNTDOWN_SECS;
use crate::error::{Result, ScarabError};
use crate::gallery::AUTO_ROTATE_INTERVAL;

/// Environment variable overriding the collector endpoint.
pub const COLLECTOR_URL_ENV: &str = "SCARAB_COLLECTOR_URL";
/// Environment variable overriding the post-survey base URL.
pub const SURVEY_URL_ENV: &str = "SCARAB_SURVEY_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Event collection endpoint; `None` means console-only simulation
    pub collector_url: Option<String>,
    /// Post-survey base URL; `None` makes the continue action fail loudly
    pub survey_base_url: Option<String>,
    /// Minimum viewing time before continue unlocks
    pub minimum_view_secs: u64,
    /// Starting value of the time-scarcity countdown
    pub countdown_secs: u32,
    /// Delay before the countdown starts ticking, so the render is noticed
    pub countdown_lead_in_ms: u64,
    /// Gallery auto-rotation period
    pub gallery_rotate_secs: u64,
    /// Debounce window for product-details focus events
    pub focus_debounce_secs: u64,
    /// Upper bound on the unload-time telemetry flush
    pub final_flush_timeout_ms: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            collector_url: None,
            survey_base_url: None,
            minimum_view_secs: 30,
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            countdown_lead_in_ms: 500,
            gallery_rotate_secs: AUTO_ROTATE_INTERVAL.as_secs(),
            focus_debounce_secs: 2,
            final_flush_timeout_ms: 2000,
        }
    }
}

impl PageConfig {
    /// `~/.config/scarab/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("scarab").join("config.json"))
    }

    /// Loads the default config file if it exists, applies environment
    /// overrides, and normalizes.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config.normalized())
    }

    /// Loads a specific config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| {
            ScarabError::config(format!(
                "Failed to read configuration file at {}: {}",
                path.display(),
                err
            ))
        })?;
        serde_json::from_str(&content).map_err(|err| {
            ScarabError::config(format!(
                "Failed to parse configuration file at {}: {}",
                path.display(),
                err
            ))
        })
    }

    /// Applies environment-variable overrides on top of file values.
    pub fn apply_env(&mut self) {
        if let Ok(value) = env::var(COLLECTOR_URL_ENV) {
            self.collector_url = Some(value);
        }
        if let Ok(value) = env::var(SURVEY_URL_ENV) {
            self.survey_base_url = Some(value);
        }
    }

    /// Treats empty URL strings as unconfigured.
    pub fn normalized(mut self) -> Self {
        if matches!(self.collector_url.as_deref(), Some("")) {
            self.collector_url = None;
        }
        if matches!(self.survey_base_url.as_deref(), Some("")) {
            self.survey_base_url = None;
        }
        self
    }

    pub fn minimum_view(&self) -> Duration {
        Duration::from_secs(self.minimum_view_secs)
    }

    pub fn countdown_lead_in(&self) -> Duration {
        Duration::from_millis(self.countdown_lead_in_ms)
    }

    pub fn gallery_rotate(&self) -> Duration {
        Duration::from_secs(self.gallery_rotate_secs)
    }

    pub fn focus_debounce(&self) -> Duration {
        Duration::from_secs(self.focus_debounce_secs)
    }

    pub fn final_flush_timeout(&self) -> Duration {
        Duration::from_millis(self.final_flush_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = PageConfig::default();
        assert!(config.collector_url.is_none());
        assert!(config.survey_base_url.is_none());
        assert_eq!(config.minimum_view(), Duration::from_secs(30));
        assert_eq!(config.countdown_secs, 30);
        assert_eq!(config.gallery_rotate(), Duration::from_secs(4));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "collector_url": "https://collect.example/exec", "minimum_view_secs": 10 }"#,
        )
        .unwrap();

        let config = PageConfig::load_from(&path).unwrap();
        assert_eq!(
            config.collector_url.as_deref(),
            Some("https://collect.example/exec")
        );
        assert_eq!(config.minimum_view_secs, 10);
        assert_eq!(config.countdown_secs, 30, "unset fields keep defaults");
    }

    #[test]
    fn test_unreadable_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = PageConfig::load_from(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ScarabError::Config(_)));
    }

    #[test]
    fn test_empty_urls_normalize_to_none() {
        let config = PageConfig {
            collector_url: Some(String::new()),
            survey_base_url: Some(String::new()),
            ..PageConfig::default()
        }
        .normalized();
        assert!(config.collector_url.is_none());
        assert!(config.survey_base_url.is_none());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = PageConfig {
            collector_url: Some("https://from-file.example".to_string()),
            ..PageConfig::default()
        };
        // set_var is unsafe in edition 2024; this test is the only writer
        // of these variables.
        unsafe {
            env::set_var(COLLECTOR_URL_ENV, "https://from-env.example");
            env::set_var(SURVEY_URL_ENV, "https://survey-env.example");
        }
        config.apply_env();
        unsafe {
            env::remove_var(COLLECTOR_URL_ENV);
            env::remove_var(SURVEY_URL_ENV);
        }
        assert_eq!(
            config.collector_url.as_deref(),
            Some("https://from-env.example")
        );
        assert_eq!(
            config.survey_base_url.as_deref(),
            Some("https://survey-env.example")
        );
    }
}
