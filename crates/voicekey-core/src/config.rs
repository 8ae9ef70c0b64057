//! Configuration management for voicekey.
//!
//! Values only; the session core consumes a loaded `Config` and never touches
//! disk itself. Unknown or invalid hotkey/language values fall back to the
//! defaults on load so a hand-edited file cannot leave the app unbindable.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::APP_NAME;

/// Logical hotkey names the app knows how to resolve.
pub const HOTKEY_NAMES: &[&str] = &[
    "right alt",
    "right ctrl",
    "right shift",
    "f13",
    "f14",
    "f15",
    "pause",
    "scroll lock",
];

/// Language codes accepted by the transcription endpoint, plus "auto".
pub const LANGUAGE_CODES: &[&str] = &[
    "auto", "en", "nl", "de", "fr", "es", "it", "pt", "pl", "ja", "zh",
];

/// Application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// API key for the transcription endpoint
    #[serde(default)]
    pub api_key: String,

    /// Transcription endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with each request
    #[serde(default = "default_model")]
    pub model: String,

    /// Language code, or "auto" to let the model detect it
    #[serde(default = "default_language")]
    pub language: String,

    /// Logical hotkey held while talking
    #[serde(default = "default_hotkey")]
    pub hotkey: String,

    /// Deliver text via clipboard paste instead of simulated typing
    #[serde(default = "default_true")]
    pub paste_mode: bool,

    /// Microphone sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_endpoint() -> String {
    "https://api.mistral.ai/v1/audio/transcriptions".to_string()
}

fn default_model() -> String {
    "voxtral-mini-latest".to_string()
}

fn default_language() -> String {
    "auto".to_string()
}

fn default_hotkey() -> String {
    "right alt".to_string()
}

fn default_true() -> bool {
    true
}

fn default_sample_rate() -> u32 {
    16_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_endpoint(),
            model: default_model(),
            language: default_language(),
            hotkey: default_hotkey(),
            paste_mode: true,
            sample_rate: default_sample_rate(),
        }
    }
}

impl Config {
    /// The configured API key, or `None` when blank.
    pub fn api_key(&self) -> Option<&str> {
        let key = self.api_key.trim();
        (!key.is_empty()).then_some(key)
    }

    /// Language to send with requests; "auto" means omit the field.
    pub fn language_param(&self) -> Option<&str> {
        (self.language != "auto").then_some(self.language.as_str())
    }

    /// Replace invalid hotkey/language values with the defaults.
    pub fn sanitize(&mut self) {
        let hotkey = self.hotkey.trim().to_lowercase();
        self.hotkey = if HOTKEY_NAMES.contains(&hotkey.as_str()) {
            hotkey
        } else {
            default_hotkey()
        };

        let language = self.language.trim().to_lowercase();
        self.language = if LANGUAGE_CODES.contains(&language.as_str()) {
            language
        } else {
            default_language()
        };
    }
}

/// Manages loading and saving configuration files.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a new ConfigManager with the default configuration directory.
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Creates a new ConfigManager with a specified configuration directory.
    #[cfg(test)]
    pub fn with_config_dir<P: AsRef<std::path::Path>>(dir: P) -> Self {
        let config_path = dir.as_ref().join(format!("{}.toml", APP_NAME));
        Self { config_path }
    }

    /// Returns the default path to the configuration file.
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to retrieve configuration directory")?;
        Ok(config_dir.join(APP_NAME).join(format!("{}.toml", APP_NAME)))
    }

    /// Loads the configuration from the config file or returns default.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let config_content = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file at {:?}", self.config_path))?;

        let mut config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file at {:?}", self.config_path))?;
        config.sanitize();

        if config.api_key().is_none() {
            warn!(
                "API key is not set. Transcriptions will not work without it. \
                 Copy the config path via the tray icon to set the key."
            );
        }

        Ok(config)
    }

    /// Saves the configuration to the config file.
    pub fn save(&self, config: &Config) -> Result<()> {
        let config_dir = self
            .config_path
            .parent()
            .with_context(|| format!("Failed to get parent directory of {:?}", self.config_path))?;

        fs::create_dir_all(config_dir)
            .with_context(|| format!("Failed to create config directory at {:?}", config_dir))?;

        let serialized =
            toml::to_string_pretty(&config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, serialized)
            .with_context(|| format!("Failed to write config file at {:?}", self.config_path))?;

        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path(&self) -> &std::path::Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.api_key().is_none());
        assert_eq!(config.hotkey, "right alt");
        assert_eq!(config.sample_rate, 16_000);
        assert!(config.paste_mode);
        assert!(config.language_param().is_none());
    }

    #[test]
    fn test_sanitize_falls_back_to_defaults() {
        let mut config = Config {
            hotkey: "super+q".to_string(),
            language: "klingon".to_string(),
            ..Default::default()
        };
        config.sanitize();
        assert_eq!(config.hotkey, "right alt");
        assert_eq!(config.language, "auto");

        let mut config = Config {
            hotkey: " F13 ".to_string(),
            language: "NL".to_string(),
            ..Default::default()
        };
        config.sanitize();
        assert_eq!(config.hotkey, "f13");
        assert_eq!(config.language, "nl");
    }

    #[test]
    fn test_language_param_skips_auto() {
        let config = Config {
            language: "de".to_string(),
            ..Default::default()
        };
        assert_eq!(config.language_param(), Some("de"));
    }

    #[test]
    fn test_partial_file_gets_defaults() {
        let config: Config = toml::from_str("api_key = \"sk-test\"").unwrap();
        assert_eq!(config.api_key(), Some("sk-test"));
        assert_eq!(config.model, "voxtral-mini-latest");
        assert_eq!(config.endpoint, default_endpoint());
    }

    #[test]
    fn test_config_manager_save_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_config_dir(temp_dir.path());

        let config = Config {
            api_key: "test-key".to_string(),
            hotkey: "pause".to_string(),
            ..Default::default()
        };

        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(loaded.api_key, "test-key");
        assert_eq!(loaded.hotkey, "pause");
    }

    #[test]
    fn test_missing_file_loads_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_config_dir(temp_dir.path());
        let loaded = manager.load().unwrap();
        assert_eq!(loaded.endpoint, default_endpoint());
    }
}
