//! Shared test doubles for the RAG pipeline.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sift_core::completion::{
    CompletionClient, CompletionRequest, FragmentStream, LoaderParams, ModelInfo, TokenCounter,
    TokenizerParams,
};
use sift_core::error::BackendError;
use sift_core::passage::Passage;

/// A passage whose body is exactly `tokens` whitespace-separated words.
pub fn passage_with_tokens(title: &str, tokens: usize) -> Passage {
    Passage::new(title, vec!["w"; tokens].join(" "))
}

pub fn model_info(max_context_length: u32) -> ModelInfo {
    ModelInfo {
        model_id: "test-model".into(),
        revision: None,
        loader_params: LoaderParams { max_context_length },
        tokenizer_params: TokenizerParams {
            model_id: "test-model".into(),
            revision: None,
        },
    }
}

/// Counts whitespace-separated words and remembers how often it was asked.
#[derive(Default)]
pub struct WordCounter {
    calls: AtomicUsize,
    fail: bool,
}

impl WordCounter {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenCounter for WordCounter {
    async fn count_tokens(&self, text: &str) -> Result<usize, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BackendError::Api {
                status: 503,
                body: "token service unavailable".into(),
            });
        }
        Ok(text.split_whitespace().count())
    }
}

/// A completion client with a fixed answer, streamed one word at a time.
pub struct ScriptedClient {
    answer: String,
    info: Option<ModelInfo>,
    counter: WordCounter,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(answer: &str, info: Option<ModelInfo>) -> Self {
        Self {
            answer: answer.to_string(),
            info,
            counter: WordCounter::default(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn count_calls(&self) -> usize {
        self.counter.calls()
    }

    fn record(&self, request: &CompletionRequest) {
        self.prompts.lock().unwrap().push(request.prompt.clone());
    }
}

#[async_trait]
impl TokenCounter for ScriptedClient {
    async fn count_tokens(&self, text: &str) -> Result<usize, BackendError> {
        self.counter.count_tokens(text).await
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: CompletionRequest) -> Result<String, BackendError> {
        self.record(&request);
        Ok(self.answer.clone())
    }

    async fn stream_generate(
        &self,
        request: CompletionRequest,
    ) -> Result<FragmentStream, BackendError> {
        self.record(&request);
        let words: Vec<String> = self
            .answer
            .split_inclusive(' ')
            .map(str::to_string)
            .collect();
        Ok(FragmentStream::from_fragments(words))
    }

    async fn model_info(&self, _model: &str) -> Result<Option<ModelInfo>, BackendError> {
        Ok(self.info.clone())
    }
}
