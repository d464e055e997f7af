//! Internal LLM gateway backend (`rapid`).
//!
//! The gateway fronts self-hosted models behind an OpenAI-compatible surface
//! and authenticates at the network layer, so the API key is optional.
//! Token counting stays local; model metadata comes from `GET /model/{id}`.

use async_trait::async_trait;
use sift_core::completion::{
    CompletionClient, CompletionRequest, FragmentStream, ModelInfo, TokenCounter,
};
use sift_core::error::{BackendError, ConfigurationError};

use crate::tokenizer;
use crate::transport::{ChatTransport, HttpOptions};

pub struct GatewayClient {
    transport: ChatTransport,
}

impl GatewayClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        options: &HttpOptions,
    ) -> Result<Self, ConfigurationError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(ConfigurationError::Missing {
                backend: "rapid".into(),
                what: "a gateway base URL (OPENAI_API_BASE)".into(),
            });
        }
        Ok(Self {
            transport: ChatTransport::new("rapid", base_url, api_key, options)?,
        })
    }
}

#[async_trait]
impl TokenCounter for GatewayClient {
    async fn count_tokens(&self, text: &str) -> Result<usize, BackendError> {
        Ok(tokenizer::count_tokens(text))
    }
}

#[async_trait]
impl CompletionClient for GatewayClient {
    fn name(&self) -> &str {
        self.transport.name()
    }

    async fn generate(&self, request: CompletionRequest) -> Result<String, BackendError> {
        self.transport.complete(&request).await
    }

    async fn stream_generate(
        &self,
        request: CompletionRequest,
    ) -> Result<FragmentStream, BackendError> {
        self.transport.stream(&request).await
    }

    async fn model_info(&self, model: &str) -> Result<Option<ModelInfo>, BackendError> {
        self.transport.fetch_model_info(model).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_base_url_rejected() {
        let err = GatewayClient::new("  ", None, &HttpOptions::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("rapid"));
    }

    #[tokio::test]
    async fn counts_tokens_without_network() {
        // Unroutable base URL: counting must not touch it.
        let client = GatewayClient::new("http://127.0.0.1:9", None, &HttpOptions::default()).unwrap();
        assert!(client.count_tokens("Lorem ipsum dolor").await.unwrap() > 0);
        assert_eq!(client.name(), "rapid");
    }
}
