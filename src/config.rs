use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{CleanerError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub geocoder: GeocoderConfig,
    pub stations: StationsConfig,
    pub filter: FilterConfig,
    pub output: OutputConfig,
    pub address: AddressConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_GEOCODER_URL.to_string(),
            timeout_seconds: 10,
            user_agent: constants::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StationsConfig {
    pub url: String,
    /// Local list, one name per line. Takes precedence over `url`.
    pub file: Option<PathBuf>,
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            url: constants::DEFAULT_STATIONS_URL.to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub min_lat: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_lat: constants::DEFAULT_MIN_LAT,
            max_lat: constants::DEFAULT_MAX_LAT,
            max_lon: constants::DEFAULT_MAX_LON,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub data_folder: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_folder: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddressConfig {
    /// Give capital rows without a street or metro match an arrondissement-level query
    pub arrondissement_fallback: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory of the daily-rotated JSON log
    pub directory: PathBuf,
    /// Level for this crate's events; `RUST_LOG` still applies on top
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load a TOML config file, falling back to defaults when the file does
    /// not exist, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                CleanerError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
            })?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("CLEANER_GEOCODER_URL") {
            self.geocoder.base_url = url;
        }
        if let Ok(folder) = std::env::var("CLEANER_DATA_FOLDER") {
            self.output.data_folder = PathBuf::from(folder);
        }
        if let Ok(file) = std::env::var("CLEANER_STATIONS_FILE") {
            self.stations.file = Some(PathBuf::from(file));
        }
        if let Ok(level) = std::env::var("CLEANER_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.filter.min_lat >= self.filter.max_lat {
            return Err(CleanerError::Config(format!(
                "filter.min_lat ({}) must be below filter.max_lat ({})",
                self.filter.min_lat, self.filter.max_lat
            )));
        }
        if self.geocoder.timeout_seconds == 0 {
            return Err(CleanerError::Config(
                "geocoder.timeout_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_region() {
        let config = Config::default();
        assert_eq!(config.filter.min_lat, 48.0);
        assert_eq!(config.filter.max_lat, 49.3);
        assert_eq!(config.filter.max_lon, 3.8);
        assert_eq!(config.output.data_folder, PathBuf::from("data"));
        assert!(!config.address.arrondissement_fallback);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [geocoder]
            timeout_seconds = 3

            [stations]
            file = "stations.txt"
            "#,
        )
        .unwrap();
        assert_eq!(config.geocoder.timeout_seconds, 3);
        assert_eq!(config.geocoder.base_url, constants::DEFAULT_GEOCODER_URL);
        assert_eq!(config.stations.file, Some(PathBuf::from("stations.txt")));
    }

    #[test]
    fn test_inverted_box_is_rejected() {
        let mut config = Config::default();
        config.filter.min_lat = 50.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.filter.max_lat, 49.3);
        assert_eq!(config.logging.directory, PathBuf::from("logs"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[logging]\ndirectory = \"var/log\"\n\n[address]\narrondissement_fallback = true\n",
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.logging.directory, PathBuf::from("var/log"));
        assert!(config.address.arrondissement_fallback);

        fs::write(&path, "[geocoder]\ntimeout_seconds = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(CleanerError::Config(_))));
    }
}
