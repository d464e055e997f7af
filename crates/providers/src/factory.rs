//! Backend factory: selects the completion client from configuration.
//!
//! The choice is made once at startup. An unknown or misconfigured backend
//! fails here, before any request is served.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sift_config::CompletionConfig;
use sift_core::completion::CompletionClient;
use sift_core::error::ConfigurationError;
use tracing::debug;

use crate::gateway::GatewayClient;
use crate::local::LocalServerClient;
use crate::openai::{self, OpenAiClient};
use crate::transport::HttpOptions;

/// The supported backend variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Direct OpenAI API
    OpenAi,
    /// Internal LLM gateway
    Rapid,
    /// Self-hosted OpenAI-compatible inference server
    Local,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Rapid => "rapid",
            Self::Local => "local",
        }
    }
}

impl FromStr for BackendKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "rapid" => Ok(Self::Rapid),
            "local" => Ok(Self::Local),
            _ => Err(ConfigurationError::UnsupportedBackend(s.to_string())),
        }
    }
}

/// Build the single active completion client.
pub fn build_client(
    config: &CompletionConfig,
) -> Result<Arc<dyn CompletionClient>, ConfigurationError> {
    let kind: BackendKind = config.service.parse()?;
    let options = HttpOptions {
        timeout: Duration::from_secs(config.timeout_secs),
        accept_invalid_certs: config.accept_invalid_certs,
    };

    debug!(backend = kind.as_str(), api_base = %config.api_base, "Initializing completion client");

    let client: Arc<dyn CompletionClient> = match kind {
        BackendKind::OpenAi => {
            let base_url = if config.api_base.trim().is_empty() {
                openai::DEFAULT_BASE_URL.to_string()
            } else {
                config.api_base.clone()
            };
            Arc::new(OpenAiClient::new(
                base_url,
                config.api_key.clone().unwrap_or_default(),
                &options,
            )?)
        }
        BackendKind::Rapid => Arc::new(GatewayClient::new(
            &config.api_base,
            config.api_key.clone(),
            &options,
        )?),
        BackendKind::Local => Arc::new(LocalServerClient::new(
            &config.api_base,
            config.api_key.clone(),
            &config.model,
            config.max_tokens,
            &options,
        )?),
    };

    Ok(client)
}
