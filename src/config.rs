use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::models::Nurse;
use crate::sync::reconciler::{SyncSettings, DEFAULT_LOOKBACK_DAYS, DEFAULT_RETENTION};

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Remote record store connection
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RemoteConfig {
    /// Project URL (e.g., "https://abc.supabase.co")
    pub base_url: Option<String>,
    /// Project API key, sent as `apikey` and bearer token
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl RemoteConfig {
    /// Returns true if the remote is configured (has both base_url and api_key)
    pub fn is_configured(&self) -> bool {
        self.base_url.as_deref().is_some_and(|u| !u.trim().is_empty())
            && self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Sync behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Reconcile before reads and after writes (default: false)
    pub auto_sync: bool,
    /// Days of remote history pulled on each reconcile
    pub lookback_days: u32,
    /// Records kept per collection after a merge
    pub retention: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: false,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            retention: DEFAULT_RETENTION,
        }
    }
}

impl SyncConfig {
    pub fn settings(&self) -> SyncSettings {
        SyncSettings {
            lookback_days: self.lookback_days,
            retention: self.retention,
        }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the collection files
    pub data_dir: ConfigValue<PathBuf>,
    /// Nurse used when a command does not name one
    pub nurse: ConfigValue<Option<Nurse>>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    nurse: Option<String>,
    remote: Option<RemoteConfig>,
    sync: Option<SyncConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut nurse = ConfigValue::new(None, ConfigSource::Default);
        let mut config_file = None;
        let mut remote = RemoteConfig::default();
        let mut sync = SyncConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(name) = file_config.nurse {
                nurse = ConfigValue::new(Some(parse_nurse("nurse", &name)?), ConfigSource::File);
            }
            if let Some(remote_config) = file_config.remote {
                remote = remote_config;
            }
            if let Some(sync_config) = file_config.sync {
                if sync_config.retention == 0 {
                    return Err(ConfigError::InvalidValue(
                        "sync.retention",
                        "must be at least 1".to_string(),
                    ));
                }
                sync = sync_config;
            }
        }

        if let Ok(dir) = std::env::var("CUIDA_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(name) = std::env::var("CUIDA_NURSE") {
            nurse = ConfigValue::new(
                Some(parse_nurse("CUIDA_NURSE", &name)?),
                ConfigSource::Environment,
            );
        }
        if let Ok(url) = std::env::var("CUIDA_REMOTE_URL") {
            remote.base_url = Some(url);
        }
        if let Ok(key) = std::env::var("CUIDA_REMOTE_API_KEY") {
            remote.api_key = Some(key);
        }
        if let Ok(flag) = std::env::var("CUIDA_AUTO_SYNC") {
            sync.auto_sync = matches!(flag.trim(), "1" | "true" | "yes" | "on");
        }

        Ok(Self {
            data_dir,
            nurse,
            config_file,
            remote,
            sync,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/cuidapadres/
    /// - macOS: ~/Library/Application Support/cuidapadres/
    /// - Windows: %APPDATA%/cuidapadres/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cuidapadres")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/cuidapadres/
    /// - macOS: ~/Library/Application Support/cuidapadres/
    /// - Windows: %APPDATA%/cuidapadres/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cuidapadres")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn parse_nurse(key: &'static str, value: &str) -> Result<Nurse, ConfigError> {
    Nurse::from_str(value).map_err(|message| ConfigError::InvalidValue(key, message))
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(key, message) => {
                write!(f, "Invalid config value for '{}': {}", key, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert!(config
            .data_dir
            .value
            .to_string_lossy()
            .contains("cuidapadres"));
        assert_eq!(config.data_dir.source, ConfigSource::Default);
        assert_eq!(config.nurse.value, None);
        assert!(config.config_file.is_none());
        assert!(!config.sync.auto_sync);
        assert_eq!(config.sync.lookback_days, 60);
        assert_eq!(config.sync.retention, 100);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "data_dir: /custom/data").unwrap();
        writeln!(file, "nurse: monica").unwrap();
        writeln!(file, "remote:").unwrap();
        writeln!(file, "  base_url: https://example.supabase.co").unwrap();
        writeln!(file, "  api_key: secret").unwrap();
        writeln!(file, "sync:").unwrap();
        writeln!(file, "  auto_sync: true").unwrap();
        writeln!(file, "  retention: 50").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(config.data_dir.value, PathBuf::from("/custom/data"));
        assert_eq!(config.data_dir.source, ConfigSource::File);
        assert_eq!(config.nurse.value, Some(Nurse::Monica));
        assert!(config.remote.is_configured());
        assert!(config.sync.auto_sync);
        assert_eq!(config.sync.retention, 50);
        assert_eq!(config.sync.lookback_days, 60);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_data_dir_resolves_against_config_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "data_dir: records").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.data_dir.value, temp_dir.path().join("records"));
    }

    #[test]
    fn test_invalid_nurse_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "nurse: nobody").unwrap();

        let err = Config::load(Some(config_path)).unwrap_err();
        assert!(err.to_string().contains("Invalid config value for 'nurse'"));
    }

    #[test]
    fn test_zero_retention_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "sync:").unwrap();
        writeln!(file, "  retention: 0").unwrap();

        let err = Config::load(Some(config_path)).unwrap_err();
        assert!(err.to_string().contains("'sync.retention'"));
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let remote = RemoteConfig {
            base_url: Some("https://example.supabase.co".to_string()),
            api_key: Some("secret".to_string()),
        };
        let json = serde_json::to_string(&remote).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("example.supabase.co"));
    }

    #[test]
    fn test_remote_blank_values_are_not_configured() {
        let remote = RemoteConfig {
            base_url: Some(String::new()),
            api_key: Some("secret".to_string()),
        };
        assert!(!remote.is_configured());
        assert!(!RemoteConfig::default().is_configured());
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "nurse: yesse").unwrap();

        std::env::set_var("CUIDA_NURSE", "Génesis");
        std::env::set_var("CUIDA_AUTO_SYNC", "1");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.nurse.value, Some(Nurse::Genesis));
        assert_eq!(config.nurse.source, ConfigSource::Environment);
        assert!(config.sync.auto_sync);

        std::env::remove_var("CUIDA_NURSE");
        std::env::remove_var("CUIDA_AUTO_SYNC");
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
