// Configuration module for plex-where-to-watch
// Reads config.toml from the XDG config directory, with environment overrides

use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::report::TableMode;

const APP_NAME: &str = "plex-where-to-watch";
const CONFIG_FILENAME: &str = "config.toml";

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Plex server and library
    pub plex: PlexConfig,

    /// Streaming catalog region and monitored providers
    pub justwatch: JustWatchConfig,

    /// Report layout
    pub report: ReportConfig,

    /// Label writing behaviour
    pub labels: LabelsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlexConfig {
    /// Server URL, e.g. http://localhost:32400
    pub base_url: String,

    /// X-Plex-Token
    pub token: String,

    /// Library section id of the TV library
    pub library: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JustWatchConfig {
    /// Catalog country (default: US)
    pub country: String,

    /// Content language (default: en)
    pub language: String,

    /// Provider display names to monitor, in report column order.
    /// Names must match the catalog exactly, e.g. "Netflix", "Amazon Prime Video"
    pub providers: Vec<String>,
}

impl Default for JustWatchConfig {
    fn default() -> Self {
        Self {
            country: "US".to_string(),
            language: "en".to_string(),
            providers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// all | streamable | per_provider (default: all)
    #[serde(deserialize_with = "lenient_table_mode")]
    pub table_mode: TableMode,
}

/// An unknown mode falls back to the default instead of rejecting the whole file
fn lenient_table_mode<'de, D>(deserializer: D) -> Result<TableMode, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.parse().unwrap_or_else(|e| {
        tracing::warn!("Ignoring report.table_mode: {}", e);
        TableMode::default()
    }))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    /// Log label changes instead of writing them to Plex
    pub dry_run: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("no providers configured (set justwatch.providers or JUSTWATCH_PROVIDERS)")]
    NoProviders,
}

/// Application configuration - combines TOML file with environment overrides
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Where config.toml was looked up
    pub config_path: PathBuf,

    pub plex: PlexConfig,

    pub justwatch: JustWatchConfig,

    pub table_mode: TableMode,

    pub dry_run: bool,
}

impl AppConfig {
    /// Load configuration from TOML file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. TOML config file
    /// 3. Default values
    pub fn load() -> Self {
        let portable_mode = env_flag("PLEX_WTW_PORTABLE").unwrap_or(false);

        let config_dir = if portable_mode {
            tracing::info!("Running in portable mode (using current directory)");
            current_dir()
        } else {
            Self::find_config_dir()
        };

        let config_path = config_dir.join(CONFIG_FILENAME);
        let config_file = Self::load_config_file(&config_path);

        Self::build(config_path, config_file)
    }

    /// Find the config directory (for locating config.toml)
    fn find_config_dir() -> PathBuf {
        // Environment variable takes priority
        if let Ok(path) = std::env::var("PLEX_WTW_CONFIG_DIR") {
            return PathBuf::from(path);
        }

        // Then XDG config dir
        if let Some(dir) = dirs::config_dir() {
            return dir.join(APP_NAME);
        }

        // Fallback to current directory
        current_dir()
    }

    /// Load and parse the TOML config file
    fn load_config_file(config_path: &Path) -> ConfigFile {
        if !config_path.exists() {
            tracing::debug!(
                "No config file found at {}, using defaults",
                config_path.display()
            );
            return ConfigFile::default();
        }

        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse config file {}: {}. Ignoring the whole file, using defaults.",
                        config_path.display(),
                        e
                    );
                    ConfigFile::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                ConfigFile::default()
            }
        }
    }

    /// Build configuration from config file with environment overrides
    fn build(config_path: PathBuf, config_file: ConfigFile) -> Self {
        Self::build_with(config_path, config_file, |key| std::env::var(key).ok())
    }

    fn build_with<F>(config_path: PathBuf, config_file: ConfigFile, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let ConfigFile {
            mut plex,
            mut justwatch,
            report,
            labels,
        } = config_file;

        if let Some(url) = env("PLEX_BASE_URL") {
            plex.base_url = url;
        }
        if let Some(token) = env("PLEX_TOKEN") {
            plex.token = token;
        }
        if let Some(library) = env("PLEX_LIBRARY") {
            plex.library = library;
        }

        if let Some(country) = env("JUSTWATCH_COUNTRY") {
            justwatch.country = country;
        }
        if let Some(language) = env("JUSTWATCH_LANGUAGE") {
            justwatch.language = language;
        }
        if let Some(list) = env("JUSTWATCH_PROVIDERS") {
            justwatch.providers = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        let table_mode = match env("PLEX_WTW_TABLE_MODE") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring PLEX_WTW_TABLE_MODE: {}", e);
                report.table_mode
            }),
            None => report.table_mode,
        };

        let dry_run = env("PLEX_WTW_DRY_RUN")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(labels.dry_run);

        Self {
            config_path,
            plex,
            justwatch,
            table_mode,
            dry_run,
        }
    }

    /// Check that everything needed for a run is present
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.plex.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("plex.base_url"));
        }
        if self.plex.token.trim().is_empty() {
            return Err(ConfigError::Missing("plex.token"));
        }
        if self.plex.library.trim().is_empty() {
            return Err(ConfigError::Missing("plex.library"));
        }
        if self.justwatch.providers.is_empty() {
            return Err(ConfigError::NoProviders);
        }
        Ok(())
    }

    /// Log configuration status
    pub fn log_config(&self) {
        tracing::debug!("Config file: {}", self.config_path.display());
        tracing::info!(
            "Plex: {} (library {})",
            self.plex.base_url,
            self.plex.library
        );
        tracing::info!(
            "JustWatch: country={}, language={}, {} providers configured",
            self.justwatch.country,
            self.justwatch.language,
            self.justwatch.providers.len()
        );
        tracing::debug!("Table mode: {}", self.table_mode);

        if self.dry_run {
            tracing::info!("Dry run: labels will NOT be written to Plex");
        }
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn valid_file() -> ConfigFile {
        toml::from_str(
            r#"
[plex]
base_url = "http://localhost:32400/"
token = "abc"
library = "2"

[justwatch]
country = "DE"
providers = ["Netflix", "Amazon Prime Video"]

[report]
table_mode = "per_provider"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_default_config_file() {
        let config = ConfigFile::default();
        assert_eq!(config.justwatch.country, "US");
        assert_eq!(config.justwatch.language, "en");
        assert!(config.justwatch.providers.is_empty());
        assert_eq!(config.report.table_mode, TableMode::All);
        assert!(!config.labels.dry_run);
    }

    #[test]
    fn test_parse_config_toml() {
        let config = valid_file();
        assert_eq!(config.plex.base_url, "http://localhost:32400/");
        assert_eq!(config.plex.library, "2");
        assert_eq!(config.justwatch.country, "DE");
        assert_eq!(config.justwatch.language, "en"); // default
        assert_eq!(
            config.justwatch.providers,
            vec!["Netflix".to_string(), "Amazon Prime Video".to_string()]
        );
        assert_eq!(config.report.table_mode, TableMode::PerProvider);
    }

    #[test]
    fn test_table_mode_alias() {
        let config: ConfigFile = toml::from_str(
            r#"
[report]
table_mode = "per-provider"
"#,
        )
        .unwrap();
        assert_eq!(config.report.table_mode, TableMode::PerProvider);
    }

    #[test]
    fn test_unknown_table_mode_keeps_rest_of_file() {
        let config: ConfigFile = toml::from_str(
            r#"
[plex]
base_url = "http://localhost:32400"

[report]
table_mode = "sideways"
"#,
        )
        .unwrap();
        assert_eq!(config.report.table_mode, TableMode::All);
        assert_eq!(config.plex.base_url, "http://localhost:32400");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PLEX_TOKEN", "from-env"),
            ("JUSTWATCH_PROVIDERS", "Hulu, Max ,"),
            ("PLEX_WTW_TABLE_MODE", "streamable"),
            ("PLEX_WTW_DRY_RUN", "1"),
        ]);
        let config = AppConfig::build_with(PathBuf::from("config.toml"), valid_file(), |k| {
            env.get(k).map(|v| v.to_string())
        });

        assert_eq!(config.plex.token, "from-env");
        assert_eq!(config.plex.library, "2");
        assert_eq!(
            config.justwatch.providers,
            vec!["Hulu".to_string(), "Max".to_string()]
        );
        assert_eq!(config.table_mode, TableMode::Streamable);
        assert!(config.dry_run);
    }

    #[test]
    fn test_invalid_env_table_mode_keeps_file_value() {
        let config = AppConfig::build_with(PathBuf::new(), valid_file(), |k| {
            (k == "PLEX_WTW_TABLE_MODE").then(|| "sideways".to_string())
        });
        assert_eq!(config.table_mode, TableMode::PerProvider);
    }

    #[test]
    fn test_validate() {
        let config = AppConfig::build_with(PathBuf::new(), valid_file(), no_env);
        assert_eq!(config.validate(), Ok(()));

        let config = AppConfig::build_with(PathBuf::new(), ConfigFile::default(), no_env);
        assert_eq!(config.validate(), Err(ConfigError::Missing("plex.base_url")));

        let mut file = valid_file();
        file.justwatch.providers.clear();
        let config = AppConfig::build_with(PathBuf::new(), file, no_env);
        assert_eq!(config.validate(), Err(ConfigError::NoProviders));
    }

    #[test]
    fn test_load_config_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[plex]\nbase_url = \"http://plex:32400\"\ntoken = \"t\"\nlibrary = \"5\"\n",
        )
        .unwrap();

        let file = AppConfig::load_config_file(&path);
        assert_eq!(file.plex.library, "5");
    }

    #[test]
    fn test_load_config_file_fallbacks() {
        let dir = tempfile::tempdir().unwrap();

        let missing = AppConfig::load_config_file(&dir.path().join("nope.toml"));
        assert!(missing.plex.base_url.is_empty());

        let broken = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&broken, "[plex\nbase_url = ").unwrap();
        let file = AppConfig::load_config_file(&broken);
        assert_eq!(file.justwatch.country, "US");
    }
}
