use std::path::{Path, PathBuf};
use std::sync::Arc;

use astrana_config::ClientConfig;
use tracing::debug;

use crate::error::ConfigError;
use crate::session::{FileTokenStore, Session};
use crate::wizard::SetupConfiguration;

pub const CONFIG_FILE: &str = "config.toml";
pub const API_URL_ENV: &str = "ASTRANA_API_URL";

/// Everything the binary needs before talking to the API.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub config: ClientConfig,
    pub config_dir: PathBuf,
}

impl ClientSettings {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("astrana")
    }

    pub fn config_path(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILE)
    }

    /// Load `config.toml` from `config_dir`; a missing file yields defaults.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::config_path(config_dir);
        let config = if path.exists() {
            ClientConfig::load(&path).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            ClientConfig::default()
        };
        let settings = Self {
            config,
            config_dir: config_dir.to_path_buf(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Write a default config file. An existing file is never overwritten.
    pub fn init(config_dir: &Path) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path(config_dir);
        if path.exists() {
            return Err(ConfigError::InvalidValue {
                field: "config file".into(),
                value: format!("{} already exists", path.display()),
            });
        }
        ClientConfig::default()
            .save(&path)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(path)
    }

    /// Apply the `ASTRANA_API_URL` environment variable and then the
    /// command-line URL, which wins.
    pub fn with_overrides(mut self, api_url: Option<String>) -> Result<Self, ConfigError> {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.config.api.base_url = url;
            }
        }
        if let Some(url) = api_url {
            self.config.api.base_url = url;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.config.api.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "api.base_url".into(),
            });
        }
        if self.config.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.timeout_secs".into(),
                value: "0".into(),
            });
        }
        Ok(())
    }

    /// Session backed by the configured token file.
    pub fn session(&self) -> Session {
        let path = self.config.token_path(&self.config_dir);
        Session::new(Arc::new(FileTokenStore::new(path)))
    }

    /// Fresh draft seeded with the detected locale.
    pub fn initial_draft(&self) -> SetupConfiguration {
        let language = detect_language().unwrap_or_else(|| self.config.locale.language.clone());
        let time_zone = detect_time_zone().unwrap_or_else(|| self.config.locale.time_zone.clone());
        SetupConfiguration::with_locale(language, time_zone)
    }
}

/// Two-letter language code from the process locale (`LC_ALL`, then `LANG`).
pub fn detect_language() -> Option<String> {
    ["LC_ALL", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|value| language_from_locale(&value))
}

/// `en_US.UTF-8` -> `en`. The `C` and `POSIX` locales carry no language.
pub fn language_from_locale(locale: &str) -> Option<String> {
    let lang = locale
        .split(['_', '.', '@', '-'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    match lang.as_str() {
        "" | "c" | "posix" => None,
        l if l.len() == 2 && l.chars().all(|c| c.is_ascii_alphabetic()) => Some(lang),
        _ => None,
    }
}

/// Time zone from `TZ`, then `/etc/timezone`.
pub fn detect_time_zone() -> Option<String> {
    let tz = std::env::var("TZ").ok();
    let etc = std::fs::read_to_string("/etc/timezone").ok();
    time_zone_from(tz.as_deref(), etc.as_deref())
}

fn time_zone_from(tz: Option<&str>, etc_timezone: Option<&str>) -> Option<String> {
    [tz, etc_timezone]
        .into_iter()
        .flatten()
        .map(|v| v.trim().trim_start_matches(':'))
        .find(|v| !v.is_empty())
        .map(str::to_string)
}
