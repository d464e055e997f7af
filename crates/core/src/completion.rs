//! Completion client trait, the abstraction over language-model backends.
//!
//! A completion client takes a fully rendered prompt and returns the answer,
//! either as one string or as a stream of text fragments. It also exposes the
//! backend's token counting and model metadata, which the context budgeter
//! depends on.
//!
//! Implementations: direct OpenAI, internal gateway, self-hosted inference server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::BackendError;

/// Parameters for one completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "gpt-3.5-turbo", "llama-2-13b-chat-hf")
    pub model: String,

    /// The rendered prompt, sent as a single user message
    pub prompt: String,

    /// Sampling temperature in [0, 2]
    #[serde(default)]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Whether the answer is streamed
    #[serde(default)]
    pub stream: bool,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: 0.0,
            max_tokens: None,
            stream: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// One item of a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// An incremental piece of the answer, in emission order.
    Text(String),
    /// End of stream. Always the last item.
    End,
}

/// A finite stream of completion fragments.
///
/// Fed by a single producer task over a bounded channel. The stream always
/// yields `Fragment::End` exactly once before returning `None`, even when the
/// producer goes away without sending it.
pub struct FragmentStream {
    rx: mpsc::Receiver<Result<Fragment, BackendError>>,
    finished: bool,
}

impl FragmentStream {
    pub fn new(rx: mpsc::Receiver<Result<Fragment, BackendError>>) -> Self {
        Self {
            rx,
            finished: false,
        }
    }

    /// Build a stream from already known text pieces.
    pub fn from_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fragments: Vec<String> = fragments.into_iter().map(Into::into).collect();
        let (tx, rx) = mpsc::channel(fragments.len() + 1);
        for text in fragments {
            let _ = tx.try_send(Ok(Fragment::Text(text)));
        }
        let _ = tx.try_send(Ok(Fragment::End));
        Self::new(rx)
    }

    /// Next fragment, or `None` once `Fragment::End` has been yielded.
    pub async fn next(&mut self) -> Option<Result<Fragment, BackendError>> {
        if self.finished {
            return None;
        }
        match self.rx.recv().await {
            Some(Ok(Fragment::End)) | None => {
                self.finished = true;
                Some(Ok(Fragment::End))
            }
            Some(item) => Some(item),
        }
    }

    /// Concatenate every text fragment in emission order.
    pub async fn collect_text(mut self) -> Result<String, BackendError> {
        let mut text = String::new();
        while let Some(item) = self.next().await {
            match item? {
                Fragment::Text(piece) => text.push_str(&piece),
                Fragment::End => break,
            }
        }
        Ok(text)
    }
}

/// Loader parameters reported by a model-info lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderParams {
    pub max_context_length: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizerParams {
    pub model_id: String,
    #[serde(default)]
    pub revision: Option<String>,
}

/// Response body of `GET /model/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_id: String,
    #[serde(default)]
    pub revision: Option<String>,
    pub loader_params: LoaderParams,
    pub tokenizer_params: TokenizerParams,
}

impl ModelInfo {
    pub fn max_context_length(&self) -> u32 {
        self.loader_params.max_context_length
    }
}

/// Counts tokens the way the active backend's model does.
#[async_trait]
pub trait TokenCounter: Send + Sync {
    async fn count_tokens(&self, text: &str) -> Result<usize, BackendError>;
}

/// The core completion client trait.
///
/// Exactly one implementation is active per process, chosen at startup.
/// Calls are never retried here; retry policy belongs to the caller.
#[async_trait]
pub trait CompletionClient: TokenCounter {
    /// A human-readable name for this backend (e.g., "openai", "local").
    fn name(&self) -> &str;

    /// Send a prompt and get the complete answer.
    async fn generate(&self, request: CompletionRequest) -> Result<String, BackendError>;

    /// Send a prompt and get a stream of answer fragments.
    ///
    /// Default implementation calls `generate()` and yields the answer as one fragment.
    async fn stream_generate(
        &self,
        request: CompletionRequest,
    ) -> Result<FragmentStream, BackendError> {
        let answer = self.generate(request).await?;
        Ok(FragmentStream::from_fragments([answer]))
    }

    /// Look up model metadata. `Ok(None)` means the backend does not know the model.
    async fn model_info(&self, model: &str) -> Result<Option<ModelInfo>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let req = CompletionRequest::new("gpt-3.5-turbo", "hi");
        assert_eq!(req.temperature, 0.0);
        assert!(req.max_tokens.is_none());
        assert!(!req.stream);
    }

    #[test]
    fn temperature_is_clamped() {
        let req = CompletionRequest::new("m", "p").with_temperature(3.5);
        assert!((req.temperature - 2.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn stream_yields_end_once() {
        let mut stream = FragmentStream::from_fragments(["a", "b"]);
        assert_eq!(stream.next().await.unwrap().unwrap(), Fragment::Text("a".into()));
        assert_eq!(stream.next().await.unwrap().unwrap(), Fragment::Text("b".into()));
        assert_eq!(stream.next().await.unwrap().unwrap(), Fragment::End);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn dropped_producer_still_ends_explicitly() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(Fragment::Text("partial".into()))).await.unwrap();
        drop(tx);

        let mut stream = FragmentStream::new(rx);
        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            Fragment::Text("partial".into())
        );
        assert_eq!(stream.next().await.unwrap().unwrap(), Fragment::End);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn collect_text_concatenates_in_order() {
        let stream = FragmentStream::from_fragments(["Hello", ", ", "world"]);
        assert_eq!(stream.collect_text().await.unwrap(), "Hello, world");
    }

    #[tokio::test]
    async fn collect_text_surfaces_errors() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(Fragment::Text("x".into()))).await.unwrap();
        tx.send(Err(BackendError::StreamInterrupted("reset".into())))
            .await
            .unwrap();
        drop(tx);

        let err = FragmentStream::new(rx).collect_text().await.unwrap_err();
        assert!(matches!(err, BackendError::StreamInterrupted(_)));
    }

    #[test]
    fn model_info_parses_wire_format() {
        let json = r#"{
            "model_id": "meta-llama/Llama-2-13b-chat-hf",
            "revision": null,
            "loader_params": {"max_context_length": 4096},
            "tokenizer_params": {"model_id": "meta-llama/Llama-2-13b-chat-hf", "revision": "main"}
        }"#;
        let info: ModelInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.max_context_length(), 4096);
        assert_eq!(info.tokenizer_params.revision.as_deref(), Some("main"));
    }
}
