use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 16384;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0} environment variable. Set it in your environment or .env file.")]
    MissingApiKey(&'static str),
    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Connection settings for the completion endpoint
#[derive(Clone)]
pub struct GeneratorConfig {
    /// OpenAI-compatible API root, without the trailing `/chat/completions`
    pub base_url: String,
    pub api_key: String,
    /// Model used when a request does not name one
    pub default_model: String,
    pub max_tokens: u32,
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("default_model", &self.default_model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl GeneratorConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            default_model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Create from environment variables, loading `.env` first if present
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    ///
    /// Reads `OPENAI_BASE_URL`, `OPENROUTER_API_KEY`, `OPENROUTER_MODEL` and
    /// `DXF_MAX_TOKENS`. Only the API key is required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENROUTER_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey("OPENROUTER_API_KEY"))?;

        let base_url = lookup("OPENAI_BASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let default_model = lookup("OPENROUTER_MODEL")
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_tokens = match lookup("DXF_MAX_TOKENS") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| ConfigError::InvalidNumber {
                name: "DXF_MAX_TOKENS",
                value: raw,
            })?,
            None => DEFAULT_MAX_TOKENS,
        };

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            default_model,
            max_tokens,
        })
    }

    pub(crate) fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key() {
        let err = GeneratorConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey("OPENROUTER_API_KEY"));

        let err = GeneratorConfig::from_lookup(lookup_from(&[("OPENROUTER_API_KEY", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey("OPENROUTER_API_KEY"));
    }

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::from_lookup(lookup_from(&[("OPENROUTER_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.default_model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.completions_url(), "https://openrouter.ai/api/v1/chat/completions");
    }

    #[test]
    fn test_overrides() {
        let config = GeneratorConfig::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("OPENROUTER_MODEL", "anthropic/claude-3.5-sonnet"),
            ("DXF_MAX_TOKENS", "4096"),
        ]))
        .unwrap();
        assert_eq!(config.completions_url(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(config.default_model, "anthropic/claude-3.5-sonnet");
        assert_eq!(config.max_tokens, 4096);
    }

    #[test]
    fn test_invalid_max_tokens() {
        let err = GeneratorConfig::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("DXF_MAX_TOKENS", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { name: "DXF_MAX_TOKENS", .. }));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GeneratorConfig::new("sk-secret");
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }
}
