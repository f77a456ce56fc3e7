use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration — mirrors config.toml structure exactly.
///
/// Every section is optional in the file; missing sections take their
/// defaults so a fresh install can run with an empty config.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub auth: Auth,
    #[serde(default)]
    pub session: Session,
    #[serde(default)]
    pub locale: Locale,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Api {
    /// Base address of the Astrana API. Paths such as `system/setup/status`
    /// are resolved against it, so it should end with a slash.
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:5001/api/".into(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Fixed fallback credential used by the gateway to re-authenticate once
/// after an auth rejection.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Auth {
    #[serde(default)]
    pub fallback_username: String,
    #[serde(default)]
    pub fallback_password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Session {
    /// Token file, relative to the config directory unless absolute.
    pub token_file: PathBuf,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            token_file: PathBuf::from("token"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Locale {
    pub language: String,
    pub time_zone: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            language: "en".into(),
            time_zone: "UTC".into(),
        }
    }
}

impl ClientConfig {
    /// Load config from a TOML file path.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config back to a TOML file path.
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Resolve the token file against `config_dir`.
    pub fn token_path(&self, config_dir: &Path) -> PathBuf {
        if self.session.token_file.is_absolute() {
            self.session.token_file.clone()
        } else {
            config_dir.join(&self.session.token_file)
        }
    }

    pub fn has_fallback_credential(&self) -> bool {
        !self.auth.fallback_username.is_empty() && !self.auth.fallback_password.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample_config() {
        let toml_str = r#"
[api]
base_url = "https://astrana.example/api/"
timeout_secs = 10

[auth]
fallback_username = "installer"
fallback_password = "installer-secret"

[session]
token_file = "/var/lib/astrana/token"

[locale]
language = "fr"
time_zone = "Europe/Paris"
"#;
        let config: ClientConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "https://astrana.example/api/");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.auth.fallback_username, "installer");
        assert_eq!(config.locale.language, "fr");
        assert!(config.has_fallback_credential());
        assert_eq!(
            config.token_path(Path::new("/etc/astrana")),
            PathBuf::from("/var/lib/astrana/token")
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.api.timeout_secs, 30);
        assert!(!config.has_fallback_credential());
        assert_eq!(
            config.token_path(Path::new("/home/u/.config/astrana")),
            PathBuf::from("/home/u/.config/astrana/token")
        );
    }

    #[test]
    fn test_partial_api_section() {
        let config: ClientConfig = toml::from_str(
            r#"
[api]
base_url = "http://127.0.0.1:8080/"
"#,
        )
        .unwrap();
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.locale.language, "en");
    }

    #[test]
    fn test_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/config.toml");
        let mut config = ClientConfig::default();
        config.locale.time_zone = "Asia/Seoul".into();
        config.save(&path).unwrap();
        let loaded = ClientConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
