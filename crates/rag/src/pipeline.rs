//! The retrieval-augmented answer pipeline.
//!
//! query -> document source -> model info -> budget -> prompt -> completion.
//! Every step is awaited in sequence; nothing is retried.

use std::sync::Arc;

use sift_core::completion::{CompletionClient, CompletionRequest, FragmentStream};
use sift_core::error::{LookupMiss, Result};
use sift_core::passage::Passage;
use tracing::{debug, info};

use crate::budget::{PromptBudget, select_within_budget};
use crate::prompt::{assemble, join_context};
use crate::source::DocumentSource;

/// A prompt ready to send, plus what went into it.
#[derive(Debug, Clone)]
pub struct PreparedPrompt {
    /// Everything the source returned, for citations.
    pub passages: Vec<Passage>,
    /// How many leading passages made it into the prompt.
    pub context_count: usize,
    pub budget: PromptBudget,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub passages: Vec<Passage>,
    pub context_count: usize,
    pub answer: String,
}

pub struct RagStream {
    pub passages: Vec<Passage>,
    pub context_count: usize,
    pub fragments: FragmentStream,
}

pub struct RagPipeline {
    client: Arc<dyn CompletionClient>,
    source: Arc<dyn DocumentSource>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl RagPipeline {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        source: Arc<dyn DocumentSource>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            source,
            model: model.into(),
            temperature: 0.0,
            max_tokens: 1024,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Retrieve, budget and render the prompt without calling the model.
    pub async fn prepare(&self, query: &str) -> Result<PreparedPrompt> {
        let passages = self.source.search(query).await?;

        let info = self
            .client
            .model_info(&self.model)
            .await?
            .ok_or_else(|| LookupMiss {
                model: self.model.clone(),
            })?;

        let budget = PromptBudget::new(
            i64::from(info.max_context_length()),
            i64::from(self.max_tokens),
        );
        let context = select_within_budget(budget.available(), &passages, self.client.as_ref())
            .await?;
        let prompt = assemble(query, &join_context(&context));

        debug!(
            source = self.source.name(),
            backend = self.client.name(),
            max_context_length = info.max_context_length(),
            available = budget.available(),
            retrieved = passages.len(),
            context = context.len(),
            "Prompt prepared"
        );

        Ok(PreparedPrompt {
            context_count: context.len(),
            passages,
            budget,
            prompt,
        })
    }

    fn request(&self, prompt: String, stream: bool) -> CompletionRequest {
        let mut request = CompletionRequest::new(&self.model, prompt)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        request.stream = stream;
        request
    }

    /// Answer `query` in one piece.
    pub async fn run(&self, query: &str) -> Result<RagAnswer> {
        let prepared = self.prepare(query).await?;
        info!(model = %self.model, context = prepared.context_count, "Generating answer");

        let answer = self
            .client
            .generate(self.request(prepared.prompt, false))
            .await?;

        Ok(RagAnswer {
            passages: prepared.passages,
            context_count: prepared.context_count,
            answer,
        })
    }

    /// Answer `query` as a fragment stream.
    pub async fn run_stream(&self, query: &str) -> Result<RagStream> {
        let prepared = self.prepare(query).await?;
        info!(model = %self.model, context = prepared.context_count, "Streaming answer");

        let fragments = self
            .client
            .stream_generate(self.request(prepared.prompt, true))
            .await?;

        Ok(RagStream {
            passages: prepared.passages,
            context_count: prepared.context_count,
            fragments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockDocumentSource;
    use crate::test_helpers::{ScriptedClient, model_info};
    use sift_core::completion::Fragment;
    use sift_core::error::Error;
    use std::time::Duration;

    fn pipeline(client: Arc<ScriptedClient>, results: usize) -> RagPipeline {
        RagPipeline::new(
            client,
            Arc::new(MockDocumentSource::new(Duration::ZERO, results)),
            "test-model",
        )
    }

    #[tokio::test]
    async fn budget_limits_context_passages() {
        // Each mock passage body is 150 words; 4096 - 1024 - 10 leaves room for 20.
        let client = Arc::new(ScriptedClient::new("ok", Some(model_info(4096))));
        let prepared = pipeline(client, 20).prepare("rust").await.unwrap();
        assert_eq!(prepared.passages.len(), 20);
        assert_eq!(prepared.context_count, 20);
        assert_eq!(prepared.budget.available(), 3062);

        let client = Arc::new(ScriptedClient::new("ok", Some(model_info(1500))));
        let prepared = pipeline(client, 20).prepare("rust").await.unwrap();
        // 1500 - 1024 - 10 = 466 -> three passages of 150 words
        assert_eq!(prepared.context_count, 3);
        assert!(prepared.prompt.contains("Question: rust\nHelpful Answer:"));
    }

    #[tokio::test]
    async fn missing_model_info_is_lookup_miss() {
        let client = Arc::new(ScriptedClient::new("ok", None));
        let err = pipeline(client.clone(), 5).run("q").await.unwrap_err();
        assert!(matches!(err, Error::Lookup(LookupMiss { ref model }) if model == "test-model"));
        assert!(client.prompts().is_empty());
    }

    #[tokio::test]
    async fn tiny_context_window_sends_empty_context() {
        let client = Arc::new(ScriptedClient::new("ok", Some(model_info(512))));
        let answer = pipeline(client.clone(), 5).run("q").await.unwrap();
        assert_eq!(answer.context_count, 0);
        assert_eq!(answer.passages.len(), 5);
        assert_eq!(client.count_calls(), 0);
        assert!(client.prompts()[0].contains("answer.\n\n\n\nQuestion: q"));
    }

    #[tokio::test]
    async fn streaming_concatenation_matches_full_answer() {
        let text = "Rust is a systems programming language.";
        let client = Arc::new(ScriptedClient::new(text, Some(model_info(4096))));
        let pipeline = pipeline(client.clone(), 3);

        let full = pipeline.run("what is rust").await.unwrap();
        let mut stream = pipeline.run_stream("what is rust").await.unwrap();

        let mut streamed = String::new();
        let mut saw_end = false;
        while let Some(item) = stream.fragments.next().await {
            match item.unwrap() {
                Fragment::Text(piece) => streamed.push_str(&piece),
                Fragment::End => saw_end = true,
            }
        }

        assert!(saw_end);
        assert_eq!(streamed, full.answer);
        assert_eq!(stream.context_count, full.context_count);
        let prompts = client.prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0], prompts[1]);
    }
}
