//! OpenAI-compatible mock API server.
//!
//! Stands in for a self-hosted inference server during development: the
//! routes, auth and streaming format are real, the answers are canned and
//! embeddings are random. `GET /health` is the only unauthenticated route.

pub mod api;
pub mod catalog;
pub mod protocol;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use sift_config::MockServerConfig;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::protocol::{ErrorDetail, ErrorResponse};

/// Immutable state shared by every request.
#[derive(Debug, Clone)]
pub struct MockState {
    /// Accepted bearer tokens. Empty accepts every request.
    pub api_keys: Vec<String>,
    /// Pause before each streamed word.
    pub stream_delay: Duration,
}

impl MockState {
    pub fn from_config(config: &MockServerConfig) -> Self {
        Self {
            api_keys: config.api_keys.clone(),
            stream_delay: Duration::from_millis(config.stream_delay_ms),
        }
    }
}

/// An OpenAI-style error body with its status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn invalid_api_key() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: ErrorResponse {
                error: ErrorDetail {
                    message: String::new(),
                    kind: "invalid_request_error".into(),
                    param: None,
                    code: "invalid_api_key".into(),
                },
            },
        }
    }

    pub fn invalid_n(n: usize) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                error: ErrorDetail {
                    message: format!(
                        "{n} is not a valid value for 'n': expected 1 to {}",
                        api::MAX_CHOICES
                    ),
                    kind: "invalid_request_error".into(),
                    param: Some("n".into()),
                    code: "invalid_value".into(),
                },
            },
        }
    }

    pub fn model_not_found(model: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorResponse {
                error: ErrorDetail {
                    message: format!("The model '{model}' does not exist"),
                    kind: "invalid_request_error".into(),
                    param: Some("model".into()),
                    code: "model_not_found".into(),
                },
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Build the full router: `/health` plus the authenticated `/api/v1` API.
pub fn build_router(state: MockState) -> Router {
    let state = Arc::new(state);
    let v1 = api::api_router(state.clone())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1", v1)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Serve on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, state: MockState) -> std::io::Result<()> {
    axum::serve(listener, build_router(state)).await
}

/// Start the mock server on the configured address.
pub async fn start(config: &MockServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    let state = MockState::from_config(config);

    if state.api_keys.is_empty() {
        warn!("No API keys configured, mock API accepts every request");
    }
    info!(
        addr = %listener.local_addr()?,
        keys = state.api_keys.len(),
        stream_delay_ms = config.stream_delay_ms,
        "Mock OpenAI-compatible API listening"
    );

    serve(listener, state).await?;
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn auth_middleware(
    State(state): State<Arc<MockState>>,
    req: axum::extract::Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.api_keys.is_empty() {
        return Ok(next.run(req).await);
    }

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) if state.api_keys.iter().any(|k| k == token) => Ok(next.run(req).await),
        _ => {
            warn!(path = %req.uri().path(), "Rejected request with missing or invalid API key");
            Err(ApiError::invalid_api_key())
        }
    }
}
