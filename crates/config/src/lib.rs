//! Configuration loading, validation, and management for Sift.
//!
//! Loads configuration from `~/.sift/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.sift/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log level used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Search results shown per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Completion backend settings
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Document source settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Feedback CMS (Directus) settings
    #[serde(default)]
    pub cms: CmsConfig,

    /// Mock OpenAI-compatible server settings
    #[serde(default)]
    pub mock_server: MockServerConfig,
}

fn default_log_level() -> String {
    "debug".into()
}
fn default_page_size() -> usize {
    5
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("page_size", &self.page_size)
            .field("completion", &self.completion)
            .field("search", &self.search)
            .field("cms", &self.cms)
            .field("mock_server", &self.mock_server)
            .finish()
    }
}

/// Which completion backend is active, and how to reach it.
#[derive(Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Backend variant: "openai", "rapid" (internal gateway) or "local"
    #[serde(default = "default_service")]
    pub service: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key; the literal "EMPTY" means no Authorization header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub temperature: f32,

    /// Tokens reserved for the generated answer
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP timeout for backend calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Accept self-signed certificates (internal deployments)
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_service() -> String {
    "local".into()
}
fn default_api_base() -> String {
    "http://localhost:8000/api/v1".into()
}
fn default_model() -> String {
    "llama-2-13b-chat-hf".into()
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            service: default_service(),
            api_base: default_api_base(),
            api_key: None,
            model: default_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            accept_invalid_certs: false,
        }
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("service", &self.service)
            .field("api_base", &self.api_base)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Simulated retrieval latency of the mock document source
    #[serde(default = "default_search_delay_ms")]
    pub mock_delay_ms: u64,

    #[serde(default = "default_mock_results")]
    pub mock_results: usize,
}

fn default_search_delay_ms() -> u64 {
    1000
}
fn default_mock_results() -> usize {
    20
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mock_delay_ms: default_search_delay_ms(),
            mock_results: default_mock_results(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CmsConfig {
    #[serde(default = "default_cms_host")]
    pub host: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_search_feedback_table")]
    pub search_feedback_table: String,

    #[serde(default = "default_rag_feedback_table")]
    pub rag_feedback_table: String,

    #[serde(default = "default_admin_email")]
    pub admin_email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,

    /// Static token assigned to the admin user during provisioning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_static_token: Option<String>,

    /// Login attempts before provisioning gives up (one per second)
    #[serde(default = "default_provision_attempts")]
    pub provision_max_attempts: u32,
}

fn default_cms_host() -> String {
    "http://localhost:8055".into()
}
fn default_search_feedback_table() -> String {
    "ai_search_feedback".into()
}
fn default_rag_feedback_table() -> String {
    "ai_rag_feedback".into()
}
fn default_admin_email() -> String {
    "admin@example.com".into()
}
fn default_provision_attempts() -> u32 {
    120
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            host: default_cms_host(),
            api_key: None,
            search_feedback_table: default_search_feedback_table(),
            rag_feedback_table: default_rag_feedback_table(),
            admin_email: default_admin_email(),
            admin_password: None,
            admin_static_token: None,
            provision_max_attempts: default_provision_attempts(),
        }
    }
}

impl std::fmt::Debug for CmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmsConfig")
            .field("host", &self.host)
            .field("api_key", &redact(&self.api_key))
            .field("search_feedback_table", &self.search_feedback_table)
            .field("rag_feedback_table", &self.rag_feedback_table)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &redact(&self.admin_password))
            .field("admin_static_token", &redact(&self.admin_static_token))
            .field("provision_max_attempts", &self.provision_max_attempts)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MockServerConfig {
    #[serde(default = "default_mock_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Accepted bearer tokens. Empty = accept every request.
    #[serde(default = "default_mock_api_keys")]
    pub api_keys: Vec<String>,

    /// Pause between streamed words
    #[serde(default = "default_stream_delay_ms")]
    pub stream_delay_ms: u64,
}

fn default_mock_port() -> u16 {
    8000
}
fn default_host() -> String {
    "localhost".into()
}
fn default_mock_api_keys() -> Vec<String> {
    vec!["test".into()]
}
fn default_stream_delay_ms() -> u64 {
    100
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            port: default_mock_port(),
            host: default_host(),
            api_keys: default_mock_api_keys(),
            stream_delay_ms: default_stream_delay_ms(),
        }
    }
}

impl std::fmt::Debug for MockServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockServerConfig")
            .field("port", &self.port)
            .field("host", &self.host)
            .field("api_keys", &format!("[{} configured]", self.api_keys.len()))
            .field("stream_delay_ms", &self.stream_delay_ms)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.sift/config.toml),
    /// then apply environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup (highest priority).
    ///
    /// Takes the lookup as a closure so tests don't touch the process env.
    pub fn apply_env<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = var("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = var("PAGE_SIZE") {
            self.page_size = parse_env("PAGE_SIZE", &v)?;
        }

        if let Some(v) = var("OPENAI_API_SERVICE") {
            self.completion.service = v;
        }
        if let Some(v) = var("OPENAI_API_BASE") {
            self.completion.api_base = v;
        }
        if let Some(v) = var("OPENAI_API_KEY") {
            self.completion.api_key = Some(v);
        }
        if let Some(v) = var("MODEL_ID") {
            self.completion.model = v;
        }

        if let Some(v) = var("DIRECTUS_HOST") {
            self.cms.host = v;
        }
        if let Some(v) = var("DIRECTUS_API_KEY") {
            self.cms.api_key = Some(v);
        }
        if let Some(v) = var("DIRECTUS_SEARCH_FEEDBACK_TABLE") {
            self.cms.search_feedback_table = v;
        }
        if let Some(v) = var("DIRECTUS_RAG_FEEDBACK_TABLE") {
            self.cms.rag_feedback_table = v;
        }
        if let Some(v) = var("ADMIN_EMAIL") {
            self.cms.admin_email = v;
        }
        if let Some(v) = var("ADMIN_PASSWORD") {
            self.cms.admin_password = Some(v);
        }

        if let Some(v) = var("MOCK_API_KEYS") {
            self.mock_server.api_keys = split_keys(&v);
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".sift")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(ConfigError::ValidationError(
                "completion.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "page_size must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            page_size: default_page_size(),
            completion: CompletionConfig::default(),
            search: SearchConfig::default(),
            cms: CmsConfig::default(),
            mock_server: MockServerConfig::default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{key}={value} is not a valid number")))
}

/// Split a comma separated key list, dropping blanks.
pub fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.completion.service, "local");
        assert_eq!(config.page_size, 5);
        assert_eq!(config.mock_server.api_keys, vec!["test".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.completion.service, config.completion.service);
        assert_eq!(parsed.mock_server.port, config.mock_server.port);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.completion.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_page_size_rejected() {
        let config = AppConfig {
            page_size: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.completion.model, "llama-2-13b-chat-hf");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
page_size = 10

[completion]
service = "openai"
api_base = "https://api.openai.com/v1"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.completion.service, "openai");
        assert_eq!(config.completion.max_tokens, 1024);
        assert_eq!(config.cms.rag_feedback_table, "ai_rag_feedback");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "page_size = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("OPENAI_API_SERVICE", "rapid"),
                ("OPENAI_API_BASE", "https://gateway.internal/v1"),
                ("MODEL_ID", "llama-2-70b-chat-hf"),
                ("PAGE_SIZE", "8"),
                ("DIRECTUS_API_KEY", "secret"),
                ("MOCK_API_KEYS", "a, b,,c"),
            ]))
            .unwrap();

        assert_eq!(config.completion.service, "rapid");
        assert_eq!(config.completion.api_base, "https://gateway.internal/v1");
        assert_eq!(config.completion.model, "llama-2-70b-chat-hf");
        assert_eq!(config.page_size, 8);
        assert_eq!(config.cms.api_key.as_deref(), Some("secret"));
        assert_eq!(config.mock_server.api_keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn non_numeric_page_size_rejected() {
        let mut config = AppConfig::default();
        let err = config.apply_env(env(&[("PAGE_SIZE", "many")])).unwrap_err();
        assert!(err.to_string().contains("PAGE_SIZE"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AppConfig::default();
        config.completion.api_key = Some("sk-live-123".into());
        config.cms.admin_password = Some("hunter2".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-live-123"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("llama-2-13b-chat-hf"));
        assert!(toml_str.contains("ai_search_feedback"));
    }
}
