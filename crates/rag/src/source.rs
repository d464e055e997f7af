//! Document sources.
//!
//! A source returns candidate passages for a query, most relevant first.
//! Only a mock source exists today; a search backend would slot in behind
//! the same trait.

use std::time::Duration;

use async_trait::async_trait;
use sift_core::error::BackendError;
use sift_core::passage::Passage;
use tracing::debug;

#[async_trait]
pub trait DocumentSource: Send + Sync {
    fn name(&self) -> &str;

    /// Passages for `query`, in relevance order.
    async fn search(&self, query: &str) -> Result<Vec<Passage>, BackendError>;
}

/// Canned results after a fixed delay, standing in for real retrieval.
pub struct MockDocumentSource {
    delay: Duration,
    results: usize,
}

impl MockDocumentSource {
    pub fn new(delay: Duration, results: usize) -> Self {
        Self { delay, results }
    }
}

impl Default for MockDocumentSource {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 20)
    }
}

#[async_trait]
impl DocumentSource for MockDocumentSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str) -> Result<Vec<Passage>, BackendError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let body = "Lorem Ipsum fdskfls ".repeat(50);
        let passages = (0..self.results)
            .map(|i| {
                Passage::new(format!("Article #{} {}", i + 1, query), body.clone())
                    .with_link("https://google.com")
                    .with_extra("rank", serde_json::json!(i + 1))
            })
            .collect::<Vec<_>>();

        debug!(query, results = passages.len(), "Mock search complete");
        Ok(passages)
    }
}
