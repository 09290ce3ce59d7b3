use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{ReportError, Result};

const CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for the whole multipart body, both files included.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            file_prefix: "bip_falhas.log".to_string(),
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory when present, then apply
    /// environment overrides (`PORT`, `BIP_HOST`, `BIP_MAX_UPLOAD_BYTES`, `BIP_LOG_DIR`).
    pub fn load() -> Result<Self> {
        let config = Self::load_from(Path::new(CONFIG_PATH))?;
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Read a TOML file; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            ReportError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from a variable lookup. Taking the lookup as a closure
    /// keeps tests off the process environment.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| ReportError::Config(format!("Invalid PORT '{}': {}", port, e)))?;
        }
        if let Some(host) = lookup("BIP_HOST") {
            self.server.host = host;
        }
        if let Some(limit) = lookup("BIP_MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = limit.trim().parse().map_err(|e| {
                ReportError::Config(format!("Invalid BIP_MAX_UPLOAD_BYTES '{}': {}", limit, e))
            })?;
        }
        if let Some(dir) = lookup("BIP_LOG_DIR") {
            self.logging.dir = dir;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logging.dir, "logs");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.max_upload_bytes, 25 * 1024 * 1024);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [("PORT", "8080"), ("BIP_LOG_DIR", "/var/log/bip")].into();
        let config = Config::default()
            .with_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.dir, "/var/log/bip");
    }

    #[test]
    fn test_invalid_port_is_a_config_error() {
        let err = Config::default()
            .with_env_overrides(|key| (key == "PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logging]\ndir = \"out\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.logging.dir, "out");
    }
}
