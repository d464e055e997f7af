//! User feedback submission.
//!
//! Feedback is best effort: a rejected or failed write is logged and never
//! surfaces as an error to the caller.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sift_config::CmsConfig;
use sift_core::passage::Passage;
use tracing::{debug, error};

use crate::{CmsError, http_client};

/// The five-face rating scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackScore {
    VeryUnhappy,
    Unhappy,
    Neutral,
    Happy,
    VeryHappy,
}

impl FeedbackScore {
    pub const ALL: [FeedbackScore; 5] = [
        Self::VeryUnhappy,
        Self::Unhappy,
        Self::Neutral,
        Self::Happy,
        Self::VeryHappy,
    ];

    pub fn face(self) -> &'static str {
        match self {
            Self::VeryUnhappy => "😞",
            Self::Unhappy => "🙁",
            Self::Neutral => "😐",
            Self::Happy => "🙂",
            Self::VeryHappy => "😀",
        }
    }

    /// Stored score in `[0, 1]`.
    pub fn value(self) -> f32 {
        match self {
            Self::VeryUnhappy => 0.0,
            Self::Unhappy => 0.25,
            Self::Neutral => 0.5,
            Self::Happy => 0.75,
            Self::VeryHappy => 1.0,
        }
    }
}

impl fmt::Display for FeedbackScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.face())
    }
}

impl FromStr for FeedbackScore {
    type Err = String;

    /// Accepts a face or a rating from 1 (worst) to 5 (best).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(score) = Self::ALL.into_iter().find(|score| score.face() == s) {
            return Ok(score);
        }
        match s.parse::<usize>() {
            Ok(n @ 1..=5) => Ok(Self::ALL[n - 1]),
            _ => Err(format!(
                "invalid feedback score '{s}' (expected 1-5 or one of 😞 🙁 😐 🙂 😀)"
            )),
        }
    }
}

/// Feedback on one search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFeedback {
    pub query: String,
    pub page_content: String,
    pub title: String,
    pub link: Option<String>,
    pub score: f32,
    pub comments: Option<String>,
}

impl SearchFeedback {
    pub fn new(
        query: impl Into<String>,
        passage: &Passage,
        score: FeedbackScore,
        comments: Option<String>,
    ) -> Self {
        Self {
            query: query.into(),
            page_content: passage.body.clone(),
            title: passage.title().to_string(),
            link: passage.link().map(str::to_string),
            score: score.value(),
            comments,
        }
    }
}

/// Feedback on a generated answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerFeedback {
    pub query: String,
    pub rag_response: String,
    pub score: f32,
    pub comments: Option<String>,
}

impl AnswerFeedback {
    pub fn new(
        query: impl Into<String>,
        rag_response: impl Into<String>,
        score: FeedbackScore,
        comments: Option<String>,
    ) -> Self {
        Self {
            query: query.into(),
            rag_response: rag_response.into(),
            score: score.value(),
            comments,
        }
    }
}

/// Writes feedback items to the CMS.
pub struct FeedbackClient {
    host: String,
    api_key: Option<String>,
    search_table: String,
    answer_table: String,
    client: reqwest::Client,
}

impl FeedbackClient {
    pub fn new(config: &CmsConfig) -> Result<Self, CmsError> {
        Ok(Self {
            host: config.host.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            search_table: config.search_feedback_table.clone(),
            answer_table: config.rag_feedback_table.clone(),
            client: http_client()?,
        })
    }

    /// Returns whether the CMS accepted the item.
    pub async fn submit_search_feedback(&self, feedback: &SearchFeedback) -> bool {
        self.submit(&self.search_table, feedback).await
    }

    /// Returns whether the CMS accepted the item.
    pub async fn submit_answer_feedback(&self, feedback: &AnswerFeedback) -> bool {
        self.submit(&self.answer_table, feedback).await
    }

    async fn submit<T: Serialize + fmt::Debug>(&self, collection: &str, item: &T) -> bool {
        let url = format!("{}/items/{}", self.host, collection);
        debug!(collection, ?item, "Submitting feedback");

        let mut request = self.client.post(&url).json(item);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                error!(collection, status, body = %body, "CMS rejected feedback");
                false
            }
            Err(e) => {
                error!(collection, error = %e, "Failed to submit feedback");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serve;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::{Json, Router, routing::post};
    use std::sync::{Arc, Mutex};

    type Received = Arc<Mutex<Vec<(String, Option<String>, serde_json::Value)>>>;

    fn recorder(received: Received, status: StatusCode) -> Router {
        Router::new()
            .route(
                "/items/{collection}",
                post(
                    move |State(received): State<Received>,
                          Path(collection): Path<String>,
                          headers: HeaderMap,
                          Json(body): Json<serde_json::Value>| async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        received.lock().unwrap().push((collection, auth, body));
                        (status, Json(serde_json::json!({"data": {}})))
                    },
                ),
            )
            .with_state(received)
    }

    fn config(host: &str) -> CmsConfig {
        let mut config = CmsConfig::default();
        config.host = host.to_string();
        config.api_key = Some("cms-token".into());
        config
    }

    #[test]
    fn faces_map_to_quarter_steps() {
        let values: Vec<f32> = FeedbackScore::ALL.iter().map(|s| s.value()).collect();
        assert_eq!(values, [0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn score_parses_faces_and_ratings() {
        assert_eq!("🙂".parse::<FeedbackScore>(), Ok(FeedbackScore::Happy));
        assert_eq!("1".parse::<FeedbackScore>(), Ok(FeedbackScore::VeryUnhappy));
        assert_eq!(" 5 ".parse::<FeedbackScore>(), Ok(FeedbackScore::VeryHappy));
        assert!("0".parse::<FeedbackScore>().is_err());
        assert!("great".parse::<FeedbackScore>().is_err());
    }

    #[test]
    fn search_feedback_copies_passage_citation() {
        let passage = Passage::new("Article #1 rust", "body text").with_link("https://google.com");
        let feedback = SearchFeedback::new("rust", &passage, FeedbackScore::Neutral, None);
        assert_eq!(feedback.title, "Article #1 rust");
        assert_eq!(feedback.page_content, "body text");
        assert_eq!(feedback.link.as_deref(), Some("https://google.com"));
        assert_eq!(feedback.score, 0.5);
    }

    #[tokio::test]
    async fn posts_items_to_configured_collections() {
        let received: Received = Arc::default();
        let host = serve(recorder(received.clone(), StatusCode::OK)).await;
        let client = FeedbackClient::new(&config(&host)).unwrap();

        let answer = AnswerFeedback::new("q", "an answer", FeedbackScore::VeryHappy, Some("nice".into()));
        assert!(client.submit_answer_feedback(&answer).await);

        let passage = Passage::new("t", "b");
        let search = SearchFeedback::new("q", &passage, FeedbackScore::Unhappy, None);
        assert!(client.submit_search_feedback(&search).await);

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].0, "ai_rag_feedback");
        assert_eq!(received[0].1.as_deref(), Some("Bearer cms-token"));
        assert_eq!(received[0].2["rag_response"], "an answer");
        assert_eq!(received[0].2["score"], 1.0);
        assert_eq!(received[0].2["comments"], "nice");
        assert_eq!(received[1].0, "ai_search_feedback");
        assert_eq!(received[1].2["score"], 0.25);
    }

    #[tokio::test]
    async fn server_error_is_logged_not_returned() {
        let received: Received = Arc::default();
        let host = serve(recorder(received.clone(), StatusCode::INTERNAL_SERVER_ERROR)).await;
        let client = FeedbackClient::new(&config(&host)).unwrap();

        let feedback = AnswerFeedback::new("q", "a", FeedbackScore::Neutral, None);
        assert!(!client.submit_answer_feedback(&feedback).await);
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_cms_is_not_an_error() {
        let client = FeedbackClient::new(&config("http://127.0.0.1:9")).unwrap();
        let feedback = AnswerFeedback::new("q", "a", FeedbackScore::Neutral, None);
        assert!(!client.submit_answer_feedback(&feedback).await);
    }
}
