use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path, path::PathBuf, time::Duration};

pub const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com/v1/forecast.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
const MAX_TIMEOUT_SECS: u64 = 300;

/// Upstream forecast provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// WeatherAPI.com key, sent as the `key` query parameter.
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self { api_key: None, base_url: default_base_url(), timeout_secs: default_timeout_secs() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

/// An API user allowed through HTTP Basic authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Argon2 PHC string.
    pub password_hash: String,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Example TOML:
    /// [users.alice]
    /// password_hash = "$argon2id$..."
    #[serde(default)]
    pub users: HashMap<String, UserConfig>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

impl Config {
    /// Load config from the platform default path, see [`Config::load_from`].
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    /// Load config from `path`, apply `WEATHER_*` environment overrides and validate.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut cfg = Self::read_from(path)?;
        cfg.apply_overrides(|name| std::env::var(name).ok())?;
        cfg.validate()?;

        Ok(cfg)
    }

    /// Read the file as stored, or return an empty default if it doesn't exist yet.
    ///
    /// No environment overrides are applied, so the result is safe to save back.
    pub fn read_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Apply overrides looked up by variable name.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(key) = lookup("WEATHER_API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = lookup("WEATHER_BASE_URL") {
            self.provider.base_url = url;
        }
        if let Some(secs) = lookup("WEATHER_TIMEOUT_SECS") {
            self.provider.timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("WEATHER_TIMEOUT_SECS is not a number: {secs}"))?;
        }
        if let Some(bind) = lookup("WEATHER_BIND") {
            self.server.bind = bind;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider.timeout_secs == 0 || self.provider.timeout_secs > MAX_TIMEOUT_SECS {
            bail!("Provider timeout must be between 1 and {MAX_TIMEOUT_SECS} seconds");
        }

        let url = &self.provider.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            bail!("Provider base URL must be an HTTP or HTTPS URL, got '{url}'");
        }

        Ok(())
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Default path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-forecast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Returns the provider API key or a hint on how to set one.
    pub fn api_key(&self) -> Result<&str> {
        self.provider.api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured for WeatherAPI.com.\n\
                 Hint: run `weather configure` or set WEATHER_API_KEY."
            )
        })
    }

    /// Set or replace a user's password hash.
    pub fn upsert_user(&mut self, username: &str, password_hash: String) {
        self.users.insert(username.to_string(), UserConfig { password_hash });
    }

    pub fn password_hash(&self, username: &str) -> Option<&str> {
        self.users.get(username).map(|u| u.password_hash.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.provider.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.server.bind, "127.0.0.1:8000");
        assert!(cfg.users.is_empty());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn api_key_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.api_key().unwrap_err();

        assert!(err.to_string().contains("No API key configured"));
        assert!(err.to_string().contains("Hint: run `weather configure`"));
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.provider.api_key = Some(String::new());
        assert!(cfg.api_key().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [provider]
            api_key = "KEY"

            [users.alice]
            password_hash = "$argon2id$stub"
            "#,
        )
        .expect("valid toml");

        assert_eq!(cfg.api_key().ok(), Some("KEY"));
        assert_eq!(cfg.provider.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cfg.server.bind, DEFAULT_BIND);
        assert_eq!(cfg.password_hash("alice"), Some("$argon2id$stub"));
        assert_eq!(cfg.password_hash("bob"), None);
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut cfg = Config::default();
        cfg.apply_overrides(|name| match name {
            "WEATHER_API_KEY" => Some("ENV_KEY".into()),
            "WEATHER_TIMEOUT_SECS" => Some("3".into()),
            "WEATHER_BIND" => Some("0.0.0.0:9000".into()),
            _ => None,
        })
        .expect("overrides apply");

        assert_eq!(cfg.api_key().ok(), Some("ENV_KEY"));
        assert_eq!(cfg.provider.timeout_secs, 3);
        assert_eq!(cfg.server.bind, "0.0.0.0:9000");
        assert_eq!(cfg.provider.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn non_numeric_timeout_override_is_rejected() {
        let mut cfg = Config::default();
        let err = cfg
            .apply_overrides(|name| (name == "WEATHER_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("WEATHER_TIMEOUT_SECS"));

        assert!(cfg.apply_overrides(no_env).is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.provider.timeout_secs = 0;
        assert!(cfg.validate().is_err());

        cfg.provider.timeout_secs = 301;
        assert!(cfg.validate().unwrap_err().to_string().contains("timeout"));

        let mut cfg = Config::default();
        cfg.provider.base_url = "ftp://example.com".into();
        assert!(cfg.validate().unwrap_err().to_string().contains("base URL"));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.provider.api_key = Some("KEY".into());
        cfg.provider.timeout_secs = 7;
        cfg.upsert_user("alice", "HASH".into());
        cfg.save_to(&path).expect("save");

        let loaded = Config::read_from(&path).expect("read back");

        assert_eq!(loaded.provider.api_key.as_deref(), Some("KEY"));
        assert_eq!(loaded.provider.timeout_secs, 7);
        assert_eq!(loaded.password_hash("alice"), Some("HASH"));
    }

    #[test]
    fn upsert_user_replaces_hash() {
        let mut cfg = Config::default();
        cfg.upsert_user("alice", "OLD".into());
        cfg.upsert_user("alice", "NEW".into());

        assert_eq!(cfg.users.len(), 1);
        assert_eq!(cfg.password_hash("alice"), Some("NEW"));
    }

    #[test]
    fn missing_file_reads_as_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::read_from(&dir.path().join("absent.toml")).expect("default");
        assert!(cfg.provider.api_key.is_none());
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "provider = 3").expect("write");

        let err = Config::read_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn load_reads_the_default_path() {
        let Ok(path) = Config::config_file_path() else {
            return;
        };

        match (Config::load(), Config::load_from(&path)) {
            (Ok(default), Ok(explicit)) => {
                assert_eq!(default.provider.base_url, explicit.provider.base_url);
                assert_eq!(default.provider.timeout_secs, explicit.provider.timeout_secs);
                assert_eq!(default.server.bind, explicit.server.bind);
                assert_eq!(default.users.len(), explicit.users.len());
            }
            (Err(default), Err(explicit)) => {
                assert_eq!(default.to_string(), explicit.to_string());
            }
            (default, explicit) => {
                panic!("load {:?} disagrees with load_from {:?}", default.err(), explicit.err())
            }
        }
    }

    #[test]
    fn config_path_points_to_toml() {
        if let Ok(path) = Config::config_file_path() {
            assert!(path.ends_with("config.toml"));
        }
    }
}
