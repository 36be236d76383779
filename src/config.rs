use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::rchain::provider::DEFAULT_BASE_URL;
use crate::weather::{DEFAULT_FORECAST_URL, DEFAULT_GEOCODING_URL};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.4;
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Tour Assistant, a collaborative travel planner. \
Lean on the available weather tool whenever the user shares a location, \
and respond with concise, engaging guidance tailored to their plans.";

pub const API_KEY_ENV: &str = "API_KEY";
pub const BASE_URL_ENV: &str = "BASE_URL";
pub const CONFIG_ENV: &str = "TOUR_CONFIG";
pub const GEOCODING_URL_ENV: &str = "TOUR_GEOCODING_URL";
pub const FORECAST_URL_ENV: &str = "TOUR_FORECAST_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing API_KEY. Set it in your environment or .env file.")]
    MissingApiKey,
    #[error("Cannot resolve config path: set TOUR_CONFIG or HOME/XDG_CONFIG_HOME.")]
    NoConfigPath,
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Config file '{}' does not contain a [profiles] section.", .0.display())]
    NoProfiles(PathBuf),
    #[error("Profile '{name}' not found in config file '{}'.", .path.display())]
    ProfileNotFound { name: String, path: PathBuf },
    #[error("Invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub model: Option<String>,
    pub system: Option<String>,
    pub temperature: Option<f64>,
    pub max_tool_rounds: Option<usize>,
    pub timeout: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    profiles: Option<HashMap<String, ProfileConfig>>,
}

/// Values given on the command line; they win over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub system: Option<String>,
    pub temperature: Option<f64>,
    pub max_tool_rounds: Option<usize>,
}

/// Everything a chat session needs, resolved once at startup.
#[derive(Clone)]
pub struct Settings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub system_prompt: String,
    pub max_tool_rounds: usize,
    pub request_timeout_secs: u64,
    pub geocoding_url: String,
    pub forecast_url: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("geocoding_url", &self.geocoding_url)
            .field("forecast_url", &self.forecast_url)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Reads the process environment and, when `profile` is given, the
    /// config file.
    pub fn load(overrides: &Overrides, profile: Option<&str>) -> Result<Self, ConfigError> {
        let profile = profile.map(load_profile).transpose()?.unwrap_or_default();
        Self::resolve(overrides, &profile, |key| env::var(key).ok())
    }

    /// Precedence: overrides, then environment, then profile, then defaults.
    pub fn resolve(
        overrides: &Overrides,
        profile: &ProfileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |key: &str| {
            env(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = lookup(API_KEY_ENV).ok_or(ConfigError::MissingApiKey)?;

        let temperature = overrides
            .temperature
            .or(profile.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                key: "temperature",
                reason: format!("{temperature} is outside 0.0..=2.0"),
            });
        }

        let max_tool_rounds = overrides
            .max_tool_rounds
            .or(profile.max_tool_rounds)
            .unwrap_or(DEFAULT_MAX_TOOL_ROUNDS);
        if max_tool_rounds == 0 {
            return Err(ConfigError::Invalid {
                key: "max_tool_rounds",
                reason: "must be at least 1".to_string(),
            });
        }

        let request_timeout_secs = profile.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "timeout",
                reason: "must be at least 1 second".to_string(),
            });
        }

        Ok(Self {
            api_key,
            base_url: lookup(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: overrides
                .model
                .clone()
                .or_else(|| profile.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature,
            system_prompt: overrides
                .system
                .clone()
                .or_else(|| profile.system.clone())
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            max_tool_rounds,
            request_timeout_secs,
            geocoding_url: lookup(GEOCODING_URL_ENV)
                .unwrap_or_else(|| DEFAULT_GEOCODING_URL.to_string()),
            forecast_url: lookup(FORECAST_URL_ENV)
                .unwrap_or_else(|| DEFAULT_FORECAST_URL.to_string()),
        })
    }
}

pub fn load_profile(name: &str) -> Result<ProfileConfig, ConfigError> {
    let path = config_path()?;
    let profiles = read_profiles(&path)?;
    profiles
        .get(name)
        .cloned()
        .ok_or_else(|| ConfigError::ProfileNotFound {
            name: name.to_string(),
            path,
        })
}

/// Parses the config file and, when given, checks that `profile` exists.
pub fn validate_config(profile: Option<&str>) -> Result<PathBuf, ConfigError> {
    let path = config_path()?;
    let profiles = read_profiles(&path)?;
    if let Some(name) = profile {
        if !profiles.contains_key(name) {
            return Err(ConfigError::ProfileNotFound {
                name: name.to_string(),
                path,
            });
        }
    }
    Ok(path)
}

fn read_profiles(path: &Path) -> Result<HashMap<String, ProfileConfig>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config: ConfigFile = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    config
        .profiles
        .ok_or_else(|| ConfigError::NoProfiles(path.to_path_buf()))
}

fn config_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }

    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed)
                .join("tour-assistant")
                .join("config.toml"));
        }
    }

    let home = env::var("HOME").map_err(|_| ConfigError::NoConfigPath)?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("tour-assistant")
        .join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let err = Settings::resolve(&Overrides::default(), &ProfileConfig::default(), env_with(&[]))
            .expect_err("no key");
        assert!(matches!(err, ConfigError::MissingApiKey));
        assert_eq!(
            err.to_string(),
            "Missing API_KEY. Set it in your environment or .env file."
        );
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let err = Settings::resolve(
            &Overrides::default(),
            &ProfileConfig::default(),
            env_with(&[("API_KEY", "   ")]),
        )
        .expect_err("blank key");
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn defaults_apply_without_profile_or_overrides() {
        let settings = Settings::resolve(
            &Overrides::default(),
            &ProfileConfig::default(),
            env_with(&[("API_KEY", "sk-1")]),
        )
        .expect("settings resolve");
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.temperature, 0.4);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.geocoding_url, DEFAULT_GEOCODING_URL);
        assert_eq!(settings.max_tool_rounds, DEFAULT_MAX_TOOL_ROUNDS);
        assert!(settings.system_prompt.starts_with("You are Tour Assistant"));
    }

    #[test]
    fn overrides_beat_profile_and_env_sets_endpoints() {
        let profile = ProfileConfig {
            model: Some("profile-model".to_string()),
            temperature: Some(0.9),
            max_tool_rounds: Some(3),
            ..ProfileConfig::default()
        };
        let overrides = Overrides {
            model: Some("cli-model".to_string()),
            ..Overrides::default()
        };
        let settings = Settings::resolve(
            &overrides,
            &profile,
            env_with(&[
                ("API_KEY", "sk-1"),
                ("BASE_URL", "http://localhost:8080/v1"),
                ("TOUR_FORECAST_URL", "http://localhost:9000/forecast"),
            ]),
        )
        .expect("settings resolve");
        assert_eq!(settings.model, "cli-model");
        assert_eq!(settings.temperature, 0.9);
        assert_eq!(settings.max_tool_rounds, 3);
        assert_eq!(settings.base_url, "http://localhost:8080/v1");
        assert_eq!(settings.forecast_url, "http://localhost:9000/forecast");
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let env = env_with(&[("API_KEY", "sk-1")]);
        let hot = Overrides {
            temperature: Some(3.5),
            ..Overrides::default()
        };
        assert!(matches!(
            Settings::resolve(&hot, &ProfileConfig::default(), &env),
            Err(ConfigError::Invalid { key: "temperature", .. })
        ));

        let no_rounds = Overrides {
            max_tool_rounds: Some(0),
            ..Overrides::default()
        };
        assert!(matches!(
            Settings::resolve(&no_rounds, &ProfileConfig::default(), &env),
            Err(ConfigError::Invalid { key: "max_tool_rounds", .. })
        ));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let settings = Settings::resolve(
            &Overrides::default(),
            &ProfileConfig::default(),
            env_with(&[("API_KEY", "sk-secret")]),
        )
        .expect("settings resolve");
        assert!(!format!("{settings:?}").contains("sk-secret"));
    }

    #[test]
    fn profiles_parse_from_toml() {
        let dir = std::env::temp_dir().join(format!("tour-config-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("config.toml");
        fs::write(
            &path,
            "[profiles.trip]\nmodel = \"gpt-4o\"\ntemperature = 0.2\nmax_tool_rounds = 4\n",
        )
        .expect("config should be writable");

        let profiles = read_profiles(&path).expect("profiles parse");
        let trip = &profiles["trip"];
        assert_eq!(trip.model.as_deref(), Some("gpt-4o"));
        assert_eq!(trip.temperature, Some(0.2));
        assert_eq!(trip.max_tool_rounds, Some(4));
    }

    #[test]
    fn file_without_profiles_is_rejected() {
        let dir = std::env::temp_dir().join(format!("tour-config-empty-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("config.toml");
        fs::write(&path, "title = \"x\"\n").expect("config should be writable");

        assert!(matches!(read_profiles(&path), Err(ConfigError::NoProfiles(_))));
    }
}
