//! Headless CMS (Directus) integration for Sift.
//!
//! Feedback on search results and generated answers is stored as CMS items.
//! Provisioning waits for a fresh CMS instance to come up and gives the admin
//! user the static token the app authenticates with.

pub mod feedback;
pub mod provision;

pub use feedback::{AnswerFeedback, FeedbackClient, FeedbackScore, SearchFeedback};
pub use provision::{ProvisionSettings, provision_admin_token};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("CMS setting '{0}' is not configured")]
    Missing(&'static str),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("CMS did not accept the admin login after {attempts} attempts")]
    LoginTimeout { attempts: u32 },

    #[error("CMS request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode CMS response: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(String),
}

pub(crate) fn http_client() -> Result<reqwest::Client, CmsError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| CmsError::HttpClient(e.to_string()))
}

#[cfg(test)]
pub(crate) async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
