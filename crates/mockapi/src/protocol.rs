//! Request and response bodies of the OpenAI-compatible API.
//!
//! Requests ignore fields the mock has no use for, so real client payloads
//! (tools, stop sequences, penalties) are accepted unchanged.

use serde::{Deserialize, Serialize};

use crate::catalog::ModelSpec;

fn default_n() -> usize {
    1
}

/// A single string or a list of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }
}

// ── Requests ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
    #[serde(default = "default_n")]
    pub n: usize,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: OneOrMany,
    #[serde(default = "default_n")]
    pub n: usize,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingsRequest {
    #[serde(default)]
    pub model: Option<String>,
    pub input: OneOrMany,
}

#[derive(Debug, Deserialize)]
pub struct TokenCheckRequest {
    pub prompts: Vec<TokenCheckPrompt>,
}

#[derive(Debug, Deserialize)]
pub struct TokenCheckPrompt {
    #[serde(default)]
    pub model: Option<String>,
    pub prompt: String,
    #[serde(default)]
    pub max_tokens: u32,
}

// ── Responses ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageInfo {
    pub prompt_tokens: u32,
    pub total_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelPermission {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub allow_sampling: bool,
    pub allow_view: bool,
    pub organization: String,
    pub is_blocking: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelCard {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
    pub root: String,
    pub permission: Vec<ModelPermission>,
}

impl ModelCard {
    pub fn new(spec: &ModelSpec, created: i64) -> Self {
        Self {
            id: spec.name.to_string(),
            object: "model".into(),
            created,
            owned_by: "sift".into(),
            root: spec.name.to_string(),
            permission: vec![ModelPermission {
                id: format!("modelperm-{}", uuid::Uuid::new_v4().simple()),
                object: "model_permission".into(),
                created,
                allow_sampling: true,
                allow_view: true,
                organization: "*".into(),
                is_blocking: false,
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelCard>,
}

impl ModelList {
    pub fn new<'a>(specs: impl Iterator<Item = &'a ModelSpec>) -> Self {
        let created = chrono::Utc::now().timestamp();
        Self {
            object: "list".into(),
            data: specs.map(|spec| ModelCard::new(spec, created)).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: usize,
    pub message: ChatMessage,
    pub finish_reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: UsageInfo,
}

/// Delta of a streamed chat chunk. Both fields absent on the final chunk.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DeltaMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatStreamChoice {
    pub index: usize,
    pub delta: DeltaMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatStreamChoice>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub index: usize,
    pub text: String,
    pub logprobs: Option<serde_json::Value>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<CompletionChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Embedding {
    pub object: String,
    pub embedding: Vec<f32>,
    pub index: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbeddingsResponse {
    pub object: String,
    pub data: Vec<Embedding>,
    pub model: String,
    pub usage: UsageInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenizerParams {
    pub model_id: String,
    pub revision: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoaderParams {
    pub max_context_length: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_id: String,
    pub revision: String,
    pub loader_params: LoaderParams,
    pub tokenizer_params: TokenizerParams,
}

impl From<&ModelSpec> for ModelInfo {
    fn from(spec: &ModelSpec) -> Self {
        Self {
            model_id: spec.model_id.to_string(),
            revision: spec.revision.to_string(),
            loader_params: LoaderParams {
                max_context_length: spec.max_context_length,
            },
            tokenizer_params: TokenizerParams {
                model_id: spec.model_id.to_string(),
                revision: spec.revision.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenCheckItem {
    pub fits: bool,
    #[serde(rename = "contextLength")]
    pub context_length: u32,
    #[serde(rename = "tokenCount")]
    pub token_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenCheckResponse {
    pub prompts: Vec<TokenCheckItem>,
}

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub param: Option<String>,
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}
