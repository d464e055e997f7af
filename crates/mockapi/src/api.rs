//! Mock API handlers: canned answers and random embeddings.
//!
//! Endpoints (all under `/api/v1`, bearer authenticated):
//!
//! - `GET  /models`                      Every catalogue model
//! - `GET  /language-models`             Chat/completion models
//! - `GET  /embeddings-models`           Embedding models
//! - `GET  /model/{id}`                  Model metadata
//! - `POST /chat/completions`            Canned chat answer, optionally streamed
//! - `POST /completions`                 Canned text completion, optionally streamed
//! - `POST /embeddings`                  Random vectors
//! - `POST /engines/{model}/embeddings`  Random vectors, model from the path
//! - `POST /token_check`                 Word-count based context check

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event as SseEvent, Sse},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use rand::Rng;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::catalog;
use crate::protocol::*;
use crate::{ApiError, MockState};

pub const CHAT_ANSWER: &str = "This is a dummy response from the API";
pub const COMPLETION_ANSWER: &str = "this is a dummy response from the non-existent model API";

/// Streamed word by word.
pub const LOREM_IPSUM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat. Duis aute irure dolor in reprehenderit in voluptate velit esse cillum dolore eu fugiat nulla pariatur. Excepteur sint occaecat cupidatat non proident, sunt in culpa qui officia deserunt mollit anim id est laborum.";

/// Context length reported by `/token_check`.
pub const TOKEN_CHECK_CONTEXT: u32 = 4096;

/// Upper bound on `n`, matching OpenAI.
pub const MAX_CHOICES: usize = 128;

type SharedState = Arc<MockState>;

pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/models", get(list_models))
        .route("/language-models", get(list_language_models))
        .route("/embeddings-models", get(list_embedding_models))
        .route("/model/{id}", get(get_model))
        .route("/chat/completions", post(chat_completions))
        .route("/completions", post(completions))
        .route("/embeddings", post(embeddings))
        .route("/engines/{model}/embeddings", post(engine_embeddings))
        .route("/token_check", post(token_check))
        .with_state(state)
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn check_n(n: usize) -> Result<usize, ApiError> {
    if (1..=MAX_CHOICES).contains(&n) {
        Ok(n)
    } else {
        Err(ApiError::invalid_n(n))
    }
}

fn sse_json<T: serde::Serialize>(value: &T) -> SseEvent {
    SseEvent::default().data(serde_json::to_string(value).unwrap_or_default())
}

// ── Models ────────────────────────────────────────────────────────────────

async fn list_models() -> Json<ModelList> {
    Json(ModelList::new(catalog::MODELS.iter()))
}

async fn list_language_models() -> Json<ModelList> {
    Json(ModelList::new(catalog::language_models()))
}

async fn list_embedding_models() -> Json<ModelList> {
    Json(ModelList::new(catalog::embedding_models()))
}

async fn get_model(Path(id): Path<String>) -> Result<Json<ModelInfo>, ApiError> {
    let spec = catalog::find(&id).ok_or_else(|| ApiError::model_not_found(&id))?;
    Ok(Json(ModelInfo::from(spec)))
}

// ── Chat completions ──────────────────────────────────────────────────────

async fn chat_completions(
    State(state): State<SharedState>,
    Json(request): Json<ChatCompletionRequest>,
) -> Response {
    debug!(model = %request.model, n = request.n, stream = request.stream, messages = request.messages.len(), "chat/completions");

    let n = match check_n(request.n) {
        Ok(n) => n,
        Err(e) => return e.into_response(),
    };

    if request.stream {
        return Sse::new(chat_stream(state, request.model, n)).into_response();
    }

    let choices = (0..n)
        .map(|index| ChatChoice {
            index,
            message: ChatMessage {
                role: "assistant".into(),
                content: CHAT_ANSWER.into(),
            },
            finish_reason: "stop".into(),
        })
        .collect();

    Json(ChatCompletionResponse {
        id: format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()),
        object: "chat.completion".into(),
        created: now(),
        model: request.model,
        choices,
        usage: UsageInfo::default(),
    })
    .into_response()
}

/// Per choice: a role chunk, one chunk per word, a `stop` chunk. Then `[DONE]`.
fn chat_stream(
    state: SharedState,
    model: String,
    n: usize,
) -> impl futures::Stream<Item = Result<SseEvent, Infallible>> {
    let (tx, rx) = mpsc::channel::<SseEvent>(32);
    let id = format!("chatcmpl-{}", uuid::Uuid::new_v4().simple());
    let created = now();

    tokio::spawn(async move {
        let chunk = |index: usize, delta: DeltaMessage, finish: Option<&str>| {
            sse_json(&ChatCompletionChunk {
                id: id.clone(),
                object: "chat.completion.chunk".into(),
                created,
                model: model.clone(),
                choices: vec![ChatStreamChoice {
                    index,
                    delta,
                    finish_reason: finish.map(str::to_string),
                }],
            })
        };

        for index in 0..n {
            let role = DeltaMessage {
                role: Some("assistant".into()),
                content: None,
            };
            if tx.send(chunk(index, role, None)).await.is_err() {
                return;
            }

            for word in LOREM_IPSUM.split(' ') {
                if !state.stream_delay.is_zero() {
                    tokio::time::sleep(state.stream_delay).await;
                }
                let delta = DeltaMessage {
                    role: None,
                    content: Some(format!("{word} ")),
                };
                if tx.send(chunk(index, delta, None)).await.is_err() {
                    return;
                }
            }

            if tx
                .send(chunk(index, DeltaMessage::default(), Some("stop")))
                .await
                .is_err()
            {
                return;
            }
        }

        let _ = tx.send(SseEvent::default().data("[DONE]")).await;
    });

    ReceiverStream::new(rx).map(Ok)
}

// ── Text completions ──────────────────────────────────────────────────────

async fn completions(
    State(state): State<SharedState>,
    Json(request): Json<CompletionRequest>,
) -> Response {
    let prompts = request.prompt.into_vec();
    debug!(model = %request.model, n = request.n, prompts = prompts.len(), stream = request.stream, "completions");

    let n = match check_n(request.n) {
        Ok(n) => n,
        Err(e) => return e.into_response(),
    };
    let Some(total) = n.checked_mul(prompts.len()) else {
        return ApiError::invalid_n(n).into_response();
    };

    if request.stream {
        return Sse::new(completion_stream(state, request.model, prompts.len(), n))
            .into_response();
    }

    let choices = (0..total)
        .map(|index| CompletionChoice {
            index,
            text: COMPLETION_ANSWER.into(),
            logprobs: None,
            finish_reason: Some("stop".into()),
        })
        .collect();

    Json(CompletionResponse {
        id: format!("cmpl-{}", uuid::Uuid::new_v4().simple()),
        object: "text_completion".into(),
        created: now(),
        model: request.model,
        choices,
        usage: Some(UsageInfo::default()),
    })
    .into_response()
}

/// Per prompt and choice: one chunk per word and a `stop` chunk. Then `[DONE]`.
fn completion_stream(
    state: SharedState,
    model: String,
    prompts: usize,
    n: usize,
) -> impl futures::Stream<Item = Result<SseEvent, Infallible>> {
    let (tx, rx) = mpsc::channel::<SseEvent>(32);
    let id = format!("cmpl-{}", uuid::Uuid::new_v4().simple());
    let created = now();

    tokio::spawn(async move {
        let chunk = |index: usize, text: String, finish: Option<&str>| {
            sse_json(&CompletionResponse {
                id: id.clone(),
                object: "text_completion".into(),
                created,
                model: model.clone(),
                choices: vec![CompletionChoice {
                    index,
                    text,
                    logprobs: None,
                    finish_reason: finish.map(str::to_string),
                }],
                usage: None,
            })
        };

        for _ in 0..prompts {
            for index in 0..n {
                for word in LOREM_IPSUM.split(' ') {
                    if !state.stream_delay.is_zero() {
                        tokio::time::sleep(state.stream_delay).await;
                    }
                    if tx.send(chunk(index, format!("{word} "), None)).await.is_err() {
                        return;
                    }
                }
                if tx.send(chunk(index, String::new(), Some("stop"))).await.is_err() {
                    return;
                }
            }
        }

        let _ = tx.send(SseEvent::default().data("[DONE]")).await;
    });

    ReceiverStream::new(rx).map(Ok)
}

// ── Embeddings ────────────────────────────────────────────────────────────

async fn embeddings(Json(request): Json<EmbeddingsRequest>) -> Result<Json<EmbeddingsResponse>, ApiError> {
    let model = request
        .model
        .clone()
        .ok_or_else(|| ApiError::model_not_found(""))?;
    random_embeddings(model, request)
}

async fn engine_embeddings(
    Path(model): Path<String>,
    Json(request): Json<EmbeddingsRequest>,
) -> Result<Json<EmbeddingsResponse>, ApiError> {
    let model = request.model.clone().unwrap_or(model);
    random_embeddings(model, request)
}

fn random_embeddings(
    model: String,
    request: EmbeddingsRequest,
) -> Result<Json<EmbeddingsResponse>, ApiError> {
    let dimensions =
        catalog::embedding_dimensions(&model).ok_or_else(|| ApiError::model_not_found(&model))?;

    let mut rng = rand::rng();
    let data = request
        .input
        .into_vec()
        .iter()
        .enumerate()
        .map(|(index, _)| Embedding {
            object: "embedding".into(),
            embedding: (0..dimensions).map(|_| rng.random::<f32>()).collect(),
            index,
        })
        .collect();

    Ok(Json(EmbeddingsResponse {
        object: "list".into(),
        data,
        model,
        usage: UsageInfo::default(),
    }))
}

// ── Token check ───────────────────────────────────────────────────────────

async fn token_check(Json(request): Json<TokenCheckRequest>) -> Json<TokenCheckResponse> {
    let prompts = request
        .prompts
        .iter()
        .map(|item| {
            let token_count = item.prompt.split(' ').count();
            TokenCheckItem {
                fits: token_count as u64 + u64::from(item.max_tokens)
                    <= u64::from(TOKEN_CHECK_CONTEXT),
                context_length: TOKEN_CHECK_CONTEXT,
                token_count,
            }
        })
        .collect();

    Json(TokenCheckResponse { prompts })
}
