//! Local token counting for API-native backends.
//!
//! Uses tiktoken's `cl100k_base` encoding, which matches the gpt-3.5/gpt-4
//! family exactly and is a close approximation for gateway-hosted models.
//! If the encoder cannot be loaded, counts fall back to ~4 characters per token.

use std::sync::OnceLock;
use tiktoken_rs::{CoreBPE, cl100k_base};

static ENCODER: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn encoder() -> Option<&'static CoreBPE> {
    ENCODER
        .get_or_init(|| match cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load cl100k_base encoder, using character estimate");
                None
            }
        })
        .as_ref()
}

/// Count tokens in `text` without a network round trip.
pub fn count_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    match encoder() {
        Some(bpe) => bpe.encode_ordinary(text).len(),
        None => estimate_tokens(text),
    }
}

/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}
