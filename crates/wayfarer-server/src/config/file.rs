// crates/wayfarer-server/src/config/file.rs
// File-based configuration from ~/.wayfarer/config.toml

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Top-level config structure
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct WayfarerConfig {
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub context: ContextSettings,
    #[serde(default)]
    pub http: HttpSettings,
}

/// Browser automation defaults
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BrowserSettings {
    /// Launch without a visible window unless `launch` overrides it
    pub headless: bool,
    /// Chromium executable; auto-detected when unset
    pub executable: Option<PathBuf>,
    /// Default element-wait timeout in milliseconds
    pub default_timeout_ms: u64,
    pub width: u32,
    pub height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            default_timeout_ms: 30_000,
            width: 1280,
            height: 720,
        }
    }
}

impl BrowserSettings {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

/// Shared-context document location
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ContextSettings {
    /// Relative paths resolve against the working directory
    pub path: PathBuf,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("shared-context.json"),
        }
    }
}

/// Vendor API client settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: crate::http::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl WayfarerConfig {
    /// Load config from ~/.wayfarer/config.toml, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config from file");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Directory holding config.toml and .env
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".wayfarer")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[browser]
headless = false
default_timeout_ms = 5000

[context]
path = "/var/lib/wayfarer/context.json"

[http]
timeout_secs = 10
"#;
        let config: WayfarerConfig = toml::from_str(toml).unwrap();
        assert!(!config.browser.headless);
        assert_eq!(config.browser.default_timeout(), Duration::from_millis(5000));
        assert_eq!(config.browser.width, 1280);
        assert_eq!(config.context.path, PathBuf::from("/var/lib/wayfarer/context.json"));
        assert_eq!(config.http.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: WayfarerConfig = toml::from_str("").unwrap();
        assert_eq!(config, WayfarerConfig::default());
    }

    #[test]
    fn test_default_config() {
        let config = WayfarerConfig::default();
        assert!(config.browser.headless);
        assert_eq!(config.browser.default_timeout_ms, 30_000);
        assert_eq!(config.context.path, PathBuf::from("shared-context.json"));
        assert_eq!(config.http.timeout_secs, 30);
    }
}
