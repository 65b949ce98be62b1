use std::path::PathBuf;
use std::time::Duration;

use dxf_generator::GeneratorConfig;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5000,http://127.0.0.1:5000";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_CONVERT_DELAY_MS: u64 = 1000;
const DEFAULT_SESSION_IDLE_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Generator(#[from] dxf_generator::ConfigError),
    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Server settings, separate from the model connection settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root for `uploads/` and `converted/`
    pub data_dir: PathBuf,
    pub bind_addr: String,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    /// Fixed pause before the model call so the progress page has something to show
    pub convert_delay: Duration,
    pub session_idle_timeout: Duration,
    pub admin_username: String,
    pub admin_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            allowed_origins: split_origins(DEFAULT_ALLOWED_ORIGINS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            convert_delay: Duration::from_millis(DEFAULT_CONVERT_DELAY_MS),
            session_idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            admin_username: "admin".to_string(),
            admin_password: "password123".to_string(),
        }
    }
}

impl AppConfig {
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn converted_dir(&self) -> PathBuf {
        self.data_dir.join("converted")
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => parse_number("MAX_UPLOAD_BYTES", raw)? as usize,
            None => defaults.max_upload_bytes,
        };

        let convert_delay = match lookup("CONVERT_DELAY_MS") {
            Some(raw) => Duration::from_millis(parse_number("CONVERT_DELAY_MS", raw)?),
            None => defaults.convert_delay,
        };

        let session_idle_timeout = match lookup("SESSION_IDLE_SECS") {
            Some(raw) => Duration::from_secs(parse_number("SESSION_IDLE_SECS", raw)?),
            None => defaults.session_idle_timeout,
        };

        Ok(Self {
            data_dir: lookup("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|raw| split_origins(&raw))
                .unwrap_or(defaults.allowed_origins),
            max_upload_bytes,
            convert_delay,
            session_idle_timeout,
            admin_username: lookup("ADMIN_USERNAME").unwrap_or(defaults.admin_username),
            admin_password: lookup("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
        })
    }
}

/// Load both server and generator settings from the process environment.
///
/// A `.env` file in the working directory is read first if it exists.
pub fn load_from_env() -> Result<(AppConfig, GeneratorConfig), ConfigError> {
    let _ = dotenvy::dotenv();
    let lookup = |key: &str| std::env::var(key).ok();
    let generator = GeneratorConfig::from_lookup(lookup)?;
    let app = AppConfig::from_lookup(lookup)?;
    Ok((app, generator))
}

fn parse_number(name: &'static str, raw: String) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber { name, value: raw })
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_env() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.uploads_dir(), PathBuf::from("data/uploads"));
        assert_eq!(config.converted_dir(), PathBuf::from("data/converted"));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.convert_delay, Duration::from_secs(1));
        assert_eq!(config.session_idle_timeout, Duration::from_secs(86400));
        assert_eq!(config.allowed_origins.len(), 2);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(|key| match key {
            "DATA_DIR" => Some("/tmp/cad".to_string()),
            "CONVERT_DELAY_MS" => Some("0".to_string()),
            "SESSION_IDLE_SECS" => Some("900".to_string()),
            "ALLOWED_ORIGINS" => Some("https://cad.example.com, ,http://localhost:3000".to_string()),
            "ADMIN_USERNAME" => Some("drafter".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/cad"));
        assert_eq!(config.convert_delay, Duration::ZERO);
        assert_eq!(config.session_idle_timeout, Duration::from_secs(900));
        assert_eq!(
            config.allowed_origins,
            vec!["https://cad.example.com".to_string(), "http://localhost:3000".to_string()]
        );
        assert_eq!(config.admin_username, "drafter");
    }

    #[test]
    fn test_invalid_number() {
        let err = AppConfig::from_lookup(|key| (key == "MAX_UPLOAD_BYTES").then(|| "ten".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { name: "MAX_UPLOAD_BYTES", .. }));
    }
}
