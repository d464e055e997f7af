//! Static model catalogue served by the mock API.

/// What a catalogue entry is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Language,
    Embedding { dimensions: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    /// Name clients put in the `model` field.
    pub name: &'static str,
    /// Upstream weights the name maps to.
    pub model_id: &'static str,
    pub revision: &'static str,
    pub max_context_length: u32,
    pub kind: ModelKind,
}

const fn language(name: &'static str, model_id: &'static str, ctx: u32) -> ModelSpec {
    ModelSpec {
        name,
        model_id,
        revision: "main",
        max_context_length: ctx,
        kind: ModelKind::Language,
    }
}

const fn embedding(
    name: &'static str,
    model_id: &'static str,
    ctx: u32,
    dimensions: usize,
) -> ModelSpec {
    ModelSpec {
        name,
        model_id,
        revision: "main",
        max_context_length: ctx,
        kind: ModelKind::Embedding { dimensions },
    }
}

pub const MODELS: &[ModelSpec] = &[
    language("vicuna-13b-v1.5-hf-16k", "lmsys/vicuna-13b-v1.5-16k", 16384),
    language("llama-2-13b-chat-hf", "meta-llama/Llama-2-13b-chat-hf", 4096),
    language("llama-2-70b-chat-hf", "meta-llama/Llama-2-70b-chat-hf", 4096),
    language("llama-2-70b-chat-hf-8k", "meta-llama/Llama-2-70b-chat-hf", 8192),
    language("airoboros-l2-70b-3.1.2-hf", "jondurbin/airoboros-l2-70b-3.1.2", 4096),
    language("airoboros-l2-c70b-3.1.2-hf", "jondurbin/airoboros-l2-c70b-3.1.2", 4096),
    language("codellama-13b-instruct-hf", "codellama/CodeLlama-13b-Instruct-hf", 16384),
    language("codellama-34b-instruct-hf", "codellama/CodeLlama-34b-Instruct-hf", 16384),
    language("sealion-7b-instruct-nc", "aisingapore/sealion7b-instruct-nc", 2048),
    embedding("e5-small-v2", "intfloat/e5-small-v2", 512, 384),
    embedding("all-MiniLM-L6-v2", "sentence-transformers/all-MiniLM-L6-v2", 256, 384),
    embedding("bge-large-en-v1.5", "BAAI/bge-large-en-v1.5", 512, 1024),
    embedding("multilingual-e5-large", "intfloat/multilingual-e5-large", 512, 1024),
    embedding("jina-v2-base-en", "jinaai/jina-embeddings-v2-base-en", 8192, 768),
];

pub fn find(name: &str) -> Option<&'static ModelSpec> {
    MODELS.iter().find(|m| m.name == name)
}

pub fn language_models() -> impl Iterator<Item = &'static ModelSpec> {
    MODELS.iter().filter(|m| m.kind == ModelKind::Language)
}

pub fn embedding_models() -> impl Iterator<Item = &'static ModelSpec> {
    MODELS
        .iter()
        .filter(|m| matches!(m.kind, ModelKind::Embedding { .. }))
}

/// Vector length for an embedding model, `None` for anything else.
pub fn embedding_dimensions(name: &str) -> Option<usize> {
    match find(name)?.kind {
        ModelKind::Embedding { dimensions } => Some(dimensions),
        ModelKind::Language => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_dimensions_match_models() {
        assert_eq!(embedding_dimensions("e5-small-v2"), Some(384));
        assert_eq!(embedding_dimensions("all-MiniLM-L6-v2"), Some(384));
        assert_eq!(embedding_dimensions("bge-large-en-v1.5"), Some(1024));
        assert_eq!(embedding_dimensions("multilingual-e5-large"), Some(1024));
        assert_eq!(embedding_dimensions("jina-v2-base-en"), Some(768));
        assert_eq!(embedding_dimensions("llama-2-13b-chat-hf"), None);
        assert_eq!(embedding_dimensions("nope"), None);
    }

    #[test]
    fn catalogue_splits_by_kind() {
        assert_eq!(language_models().count(), 9);
        assert_eq!(embedding_models().count(), 5);
        assert_eq!(find("llama-2-70b-chat-hf-8k").unwrap().max_context_length, 8192);
    }

    #[test]
    fn names_are_unique() {
        for (i, a) in MODELS.iter().enumerate() {
            assert!(MODELS[i + 1..].iter().all(|b| b.name != a.name), "{}", a.name);
        }
    }
}
