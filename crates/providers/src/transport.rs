//! OpenAI-compatible HTTP transport shared by every backend variant.
//!
//! Handles:
//! - Chat completions (non-streaming and streaming SSE)
//! - Model-info lookups (`GET /model/{id}`)
//! - Remote token checks (`POST /token_check`)
//!
//! Variants differ only in authentication, token counting and where model
//! metadata comes from; the wire format is the same.

use std::time::Duration;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use sift_core::completion::{CompletionRequest, Fragment, FragmentStream, ModelInfo};
use sift_core::error::{BackendError, ConfigurationError};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Connection settings for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            accept_invalid_certs: false,
        }
    }
}

/// An OpenAI-compatible endpoint plus the credentials to call it.
pub struct ChatTransport {
    name: String,
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ChatTransport {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        options: &HttpOptions,
    ) -> Result<Self, ConfigurationError> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .build()
            .map_err(|e| ConfigurationError::HttpClient(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            client,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn chat_body(request: &CompletionRequest, stream: bool) -> serde_json::Value {
        let messages = vec![ApiMessage {
            role: "user".into(),
            content: request.prompt.clone(),
        }];

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "temperature": request.temperature,
            "stream": stream,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    /// `POST /chat/completions` and return the first choice's content.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(backend = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .authorize(self.client.post(&url))
            .json(&Self::chat_body(request, false))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        let response = ensure_success(&self.name, response).await?;

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode("No choices in response".into()))?;

        Ok(choice.message.content.unwrap_or_default())
    }

    /// `POST /chat/completions` with `stream: true`.
    ///
    /// A reader task decodes SSE frames and forwards content deltas in arrival
    /// order. It ends the stream on `[DONE]` or when the upstream closes.
    pub async fn stream(&self, request: &CompletionRequest) -> Result<FragmentStream, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(backend = %self.name, model = %request.model, "Sending streaming request");

        let response = self
            .authorize(self.client.post(&url))
            .header("Accept", "text/event-stream")
            .json(&Self::chat_body(request, true))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        let response = ensure_success(&self.name, response).await?;

        let (tx, rx) = mpsc::channel(64);
        let backend = self.name.clone();

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut decoder = SseDecoder::default();

            while let Some(chunk) = byte_stream.next().await {
                let bytes = match chunk {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx.send(Err(BackendError::StreamInterrupted(e.to_string()))).await;
                        return;
                    }
                };

                for event in decoder.push(&bytes) {
                    let data = match event {
                        SseEvent::Done => {
                            let _ = tx.send(Ok(Fragment::End)).await;
                            return;
                        }
                        SseEvent::Data(data) => data,
                    };

                    match serde_json::from_str::<StreamResponse>(&data) {
                        Ok(chunk) => {
                            let Some(text) = chunk.into_text() else { continue };
                            if text.is_empty() {
                                continue;
                            }
                            if tx.send(Ok(Fragment::Text(text))).await.is_err() {
                                return; // consumer dropped the stream
                            }
                        }
                        Err(e) => {
                            trace!(backend = %backend, data = %data, error = %e, "Ignoring unparseable SSE chunk");
                        }
                    }
                }
            }

            let _ = tx.send(Ok(Fragment::End)).await;
        });

        Ok(FragmentStream::new(rx))
    }

    /// `GET /model/{id}`. Any non-200 status is absence, not an error.
    pub async fn fetch_model_info(&self, model: &str) -> Result<Option<ModelInfo>, BackendError> {
        let url = format!("{}/model/{}", self.base_url, model);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if response.status().as_u16() != 200 {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(backend = %self.name, model, status, body = %body, "Model info lookup failed");
            return Ok(None);
        }

        let info = response
            .json::<ModelInfo>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Some(info))
    }

    /// `POST /token_check` for a single prompt.
    pub async fn token_check(
        &self,
        model: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<TokenCheckItem, BackendError> {
        let url = format!("{}/token_check", self.base_url);
        let body = TokenCheckRequest {
            prompts: vec![TokenCheckPrompt {
                model: model.to_string(),
                prompt: prompt.to_string(),
                max_tokens,
            }],
        };

        let response = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        let response = ensure_success(&self.name, response).await?;

        let parsed: TokenCheckResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        parsed
            .prompts
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode("Empty token_check response".into()))
    }
}

/// Map any non-2xx response into `BackendError::Api` carrying status and body.
async fn ensure_success(
    backend: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(backend, status = status.as_u16(), body = %body, "Backend returned error");
    Err(BackendError::Api {
        status: status.as_u16(),
        body,
    })
}

// --- Server-sent events ---

/// One decoded SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Data(String),
    /// The literal `data: [DONE]` terminator.
    Done,
}

/// Incremental SSE line decoder.
///
/// Buffers raw bytes so multi-byte characters split across network chunks
/// are decoded intact.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            // Skip blank separators and SSE comments
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim();
                if data == "[DONE]" {
                    events.push(SseEvent::Done);
                } else {
                    events.push(SseEvent::Data(data.to_string()));
                }
            }
        }

        events
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// A single SSE `data: {...}` chunk. Chat chunks carry `delta.content`,
/// legacy completion chunks carry `text`.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

impl StreamResponse {
    fn into_text(self) -> Option<String> {
        let choice = self.choices.into_iter().next()?;
        choice.delta.and_then(|d| d.content).or(choice.text)
    }
}

// --- Token check types ---

#[derive(Debug, Serialize)]
struct TokenCheckRequest {
    prompts: Vec<TokenCheckPrompt>,
}

#[derive(Debug, Serialize)]
struct TokenCheckPrompt {
    model: String,
    prompt: String,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct TokenCheckResponse {
    prompts: Vec<TokenCheckItem>,
}

/// One entry of a `/token_check` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenCheckItem {
    pub fits: bool,
    #[serde(rename = "contextLength")]
    pub context_length: u32,
    #[serde(rename = "tokenCount")]
    pub token_count: usize,
}
