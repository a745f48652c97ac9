use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Password, Text};
use tracing::info;
use weather_core::{Config, ForecastService, config::DEFAULT_BASE_URL, provider_from_config};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Aggregated weather forecast API")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API.
    Serve,

    /// Print the forecast summary for a location.
    Show {
        /// City or location name, as understood by WeatherAPI.com.
        location: String,

        /// Number of forecast days (1-14).
        #[arg(long, allow_hyphen_values = true)]
        days: Option<String>,
    },

    /// Configure the WeatherAPI.com credentials and connection settings.
    Configure,

    /// Add an API user, or reset their password.
    AddUser {
        username: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve => {
                let config = load_config(self.config.as_deref())?;
                weather_server::serve(&config).await?;
            }
            Command::Show { location, days } => {
                let config = load_config(self.config.as_deref())?;
                let service = ForecastService::new(Arc::from(provider_from_config(&config)?));

                match service.summarize(&location, days.as_deref()).await {
                    Ok(summary) => {
                        let json = serde_json::to_string_pretty(&summary)
                            .context("Failed to format forecast summary")?;
                        println!("{json}");
                    }
                    Err(e) => bail!("{e}"),
                }
            }
            Command::Configure => configure(&config_path(self.config)?)?,
            Command::AddUser { username } => add_user(&config_path(self.config)?, &username)?,
        }

        Ok(())
    }
}

/// Validated config with environment overrides, from `--config` or the default path.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// File that `configure` and `add-user` write to.
fn config_path(path: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => Config::config_file_path(),
    }
}

fn configure(path: &Path) -> anyhow::Result<()> {
    let mut config = Config::read_from(path)?;

    let api_key = Password::new("WeatherAPI.com API key:").without_confirmation().prompt()?;
    let base_url =
        Text::new("Forecast endpoint:").with_default(&config.provider.base_url).prompt()?;
    let timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(config.provider.timeout_secs)
        .prompt()?;

    config.provider.api_key = Some(api_key.trim().to_string());
    config.provider.base_url =
        if base_url.trim().is_empty() { DEFAULT_BASE_URL.to_string() } else { base_url };
    config.provider.timeout_secs = timeout_secs;
    config.validate()?;

    config.save_to(path)?;
    info!(path = %path.display(), "configuration saved");
    println!("Saved configuration to {}", path.display());

    Ok(())
}

fn add_user(path: &Path, username: &str) -> anyhow::Result<()> {
    if username.is_empty() || username.contains(':') {
        bail!("Username must be non-empty and must not contain ':'");
    }

    let mut config = Config::read_from(path)?;
    let password = Password::new(&format!("Password for {username}:")).prompt()?;
    let hash = weather_server::hash_password(&password)?;

    let replaced = config.password_hash(username).is_some();
    config.upsert_user(username, hash);
    config.save_to(path)?;

    if replaced {
        println!("Updated password for {username}");
    } else {
        println!("Added user {username}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_show_with_days() {
        let cli = Cli::parse_from(["weather", "show", "LONDON", "--days", "5"]);
        match cli.command {
            Command::Show { location, days } => {
                assert_eq!(location, "LONDON");
                assert_eq!(days.as_deref(), Some("5"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn show_days_stays_raw_text() {
        let cli = Cli::parse_from(["weather", "show", "LONDON", "--days", "xyz"]);
        assert!(matches!(cli.command, Command::Show { days: Some(d), .. } if d == "xyz"));
    }

    #[test]
    fn show_accepts_negative_days_for_validation() {
        let cli = Cli::parse_from(["weather", "show", "LONDON", "--days", "-1"]);
        assert!(matches!(cli.command, Command::Show { days: Some(d), .. } if d == "-1"));
    }

    #[test]
    fn explicit_config_path_is_loaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("weather.toml");
        std::fs::write(&path, "[provider]\ntimeout_secs = 42\n").expect("write");

        let config = load_config(Some(&path)).expect("load");
        assert_eq!(config.provider.timeout_secs, 42);
        assert_eq!(config_path(Some(path.clone())).expect("path"), path);
    }

    #[test]
    fn default_config_path_when_flag_absent() {
        if let Ok(default) = Config::config_file_path() {
            assert_eq!(config_path(None).expect("path"), default);
        }
    }

    #[test]
    fn global_config_flag() {
        let cli = Cli::parse_from(["weather", "serve", "--config", "/tmp/weather.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/weather.toml")));
        assert!(matches!(cli.command, Command::Serve));
    }
}
