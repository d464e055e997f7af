//! Self-hosted inference server backend (`local`).
//!
//! Targets FastChat-style OpenAI-compatible servers, including the bundled
//! mock API. Token counts come from the server's `/token_check` route, one
//! round trip per call, because its tokenizer is the only exact one for the
//! hosted model.
//!
//! The API key literal `EMPTY` means "send no Authorization header".

use async_trait::async_trait;
use sift_core::completion::{
    CompletionClient, CompletionRequest, FragmentStream, ModelInfo, TokenCounter,
};
use sift_core::error::{BackendError, ConfigurationError};
use tracing::trace;

use crate::transport::{ChatTransport, HttpOptions};

/// Placeholder key used by self-hosted servers that don't authenticate.
pub const NO_API_KEY: &str = "EMPTY";

pub struct LocalServerClient {
    transport: ChatTransport,
    /// Model whose tokenizer `/token_check` should use.
    model: String,
    /// `max_tokens` sent with each token check.
    max_tokens: u32,
}

impl LocalServerClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        max_tokens: u32,
        options: &HttpOptions,
    ) -> Result<Self, ConfigurationError> {
        let api_key = api_key.filter(|k| k != NO_API_KEY);
        Ok(Self {
            transport: ChatTransport::new("local", base_url, api_key, options)?,
            model: model.into(),
            max_tokens,
        })
    }
}

#[async_trait]
impl TokenCounter for LocalServerClient {
    async fn count_tokens(&self, text: &str) -> Result<usize, BackendError> {
        let item = self
            .transport
            .token_check(&self.model, text, self.max_tokens)
            .await?;
        trace!(
            model = %self.model,
            tokens = item.token_count,
            fits = item.fits,
            context_length = item.context_length,
            "Remote token check"
        );
        Ok(item.token_count)
    }
}

#[async_trait]
impl CompletionClient for LocalServerClient {
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
