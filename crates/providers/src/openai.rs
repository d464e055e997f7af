//! Direct OpenAI backend.
//!
//! Talks to `api.openai.com` (or any endpoint configured as `openai`) with a
//! bearer API key. Token counting is local. OpenAI exposes no model-info
//! route, so metadata is the gpt-3.5-turbo default: a 4096-token context.

use async_trait::async_trait;
use sift_core::completion::{
    CompletionClient, CompletionRequest, FragmentStream, LoaderParams, ModelInfo, TokenCounter,
    TokenizerParams,
};
use sift_core::error::{BackendError, ConfigurationError};

use crate::tokenizer;
use crate::transport::{ChatTransport, HttpOptions};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_CONTEXT_LENGTH: u32 = 4096;

pub struct OpenAiClient {
    transport: ChatTransport,
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        options: &HttpOptions,
    ) -> Result<Self, ConfigurationError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ConfigurationError::Missing {
                backend: "openai".into(),
                what: "an API key (OPENAI_API_KEY)".into(),
            });
        }
        Ok(Self {
            transport: ChatTransport::new("openai", base_url, Some(api_key), options)?,
        })
    }

    fn default_model_info() -> ModelInfo {
        ModelInfo {
            model_id: DEFAULT_MODEL.into(),
            revision: None,
            loader_params: LoaderParams {
                max_context_length: DEFAULT_CONTEXT_LENGTH,
            },
            tokenizer_params: TokenizerParams {
                model_id: DEFAULT_MODEL.into(),
                revision: None,
            },
        }
    }
}

#[async_trait]
impl TokenCounter for OpenAiClient {
    async fn count_tokens(&self, text: &str) -> Result<usize, BackendError> {
        Ok(tokenizer::count_tokens(text))
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
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

    async fn model_info(&self, _model: &str) -> Result<Option<ModelInfo>, BackendError> {
        Ok(Some(Self::default_model_info()))
    }
}
