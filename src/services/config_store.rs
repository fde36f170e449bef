// Configuration Storage Service
// Handles config file read/write, version backup and environment overrides

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::providers::{ProviderSettings, DEFAULT_PROVIDER_MODEL, DEFAULT_PROVIDER_URL, DEFAULT_TIMEOUT_SECS};

const APP_DIR_NAME: &str = "textlens";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const MAX_BACKUPS: usize = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to create config dir: {0}")]
    CreateDir(std::io::Error),
    #[error("failed to read config: {0}")]
    Read(std::io::Error),
    #[error("failed to write config: {0}")]
    Write(std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(serde_json::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(serde_json::Error),
    #[error("failed to create backup: {0}")]
    Backup(std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    /// Bearer token -> owner id. Requests carrying a listed token are persisted.
    #[serde(default)]
    pub access_tokens: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: default_bind_addr() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default = "default_provider_url")]
    pub base_url: String,
    #[serde(default = "default_provider_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_url(),
            model: default_provider_model(),
            api_key: None,
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    pub fn settings(&self) -> ProviderSettings {
        ProviderSettings {
            url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            timeout_secs: self.request_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    /// JSON file the history store writes to. Falls back to the local data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Keep history in memory only (nothing survives a restart).
    #[serde(default)]
    pub in_memory: bool,
}

impl HistoryConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|p| p.join(APP_DIR_NAME))
                .unwrap_or_else(|| PathBuf::from("data"))
                .join("history.json")
        })
    }
}

fn default_bind_addr() -> String { DEFAULT_BIND_ADDR.to_string() }
fn default_provider_url() -> String { DEFAULT_PROVIDER_URL.to_string() }
fn default_provider_model() -> String { DEFAULT_PROVIDER_MODEL.to_string() }
fn default_timeout_secs() -> u64 { DEFAULT_TIMEOUT_SECS }

impl AppConfig {
    /// Apply environment overrides on top of the file values.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(*k))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        if let Some(key) = get(&["TEXTLENS_API_KEY", "SCORING_API_KEY"]) {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = get(&["SCORING_API_URL"]) {
            self.provider.base_url = url;
        }
        if let Some(model) = get(&["SCORING_MODEL"]) {
            self.provider.model = model;
        }
        if let Some(addr) = get(&["TEXTLENS_ADDR"]) {
            self.server.bind_addr = addr;
        }
        if let Some(path) = get(&["TEXTLENS_HISTORY_PATH"]) {
            self.history.path = Some(PathBuf::from(path));
        }
    }
}

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        if let Ok(dir) = env::var("TEXTLENS_CONFIG_DIR") {
            if !dir.trim().is_empty() {
                return Some(PathBuf::from(dir));
            }
        }
        dirs::config_dir().map(|p| p.join(APP_DIR_NAME))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.config_dir).map_err(ConfigError::CreateDir)
    }

    /// Load configuration from file
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file).map_err(ConfigError::Read)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load the file config and layer environment overrides on top.
    pub fn load_effective(&self) -> Result<AppConfig, ConfigError> {
        let mut config = self.load()?;
        config.apply_env();
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        self.ensure_dir()?;

        // Create backup if file exists
        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config).map_err(ConfigError::Serialize)?;
        fs::write(&self.config_file, content).map_err(ConfigError::Write)
    }

    fn create_backup(&self) -> Result<(), ConfigError> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir).map_err(ConfigError::Backup)?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file).map_err(ConfigError::Backup)?;

        self.cleanup_old_backups(&backup_dir, MAX_BACKUPS)
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), ConfigError> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(ConfigError::Backup)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Backup names embed the timestamp, so name order is age order.
        entries.sort_by_key(|e| e.file_name());

        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.provider.model, DEFAULT_PROVIDER_MODEL);
        assert!(config.provider.api_key.is_none());
        assert!(config.access_tokens.is_empty());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"provider": {"apiKey": "k"}, "accessTokens": {"t": "u"}}"#)
                .unwrap();
        assert_eq!(parsed.provider.api_key.as_deref(), Some("k"));
        assert_eq!(parsed.provider.base_url, DEFAULT_PROVIDER_URL);
        assert_eq!(parsed.provider.request_timeout_secs, 80);
        assert_eq!(parsed.access_tokens.get("t").map(String::as_str), Some("u"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            "TEXTLENS_API_KEY" => Some("  ".to_string()),
            "SCORING_API_KEY" => Some("secret".to_string()),
            "SCORING_MODEL" => Some("other/model".to_string()),
            "TEXTLENS_HISTORY_PATH" => Some("/tmp/h.json".to_string()),
            _ => None,
        });
        assert_eq!(config.provider.api_key.as_deref(), Some("secret"));
        assert_eq!(config.provider.model, "other/model");
        assert_eq!(config.history.path, Some(PathBuf::from("/tmp/h.json")));
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_save_and_reload_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());

        let mut config = AppConfig::default();
        config.version = "1".to_string();
        store.save(&config).unwrap();
        config.version = "2".to_string();
        store.save(&config).unwrap();

        assert_eq!(store.load().unwrap().version, "2");
        let backups = fs::read_dir(dir.path().join("backups")).unwrap().count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested"));
        assert_eq!(store.load().unwrap().server.bind_addr, DEFAULT_BIND_ADDR);
    }
}
