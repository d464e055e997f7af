//! Retrieval-augmented answering for Sift.
//!
//! Passages come from a `DocumentSource`, are trimmed to the model's context
//! budget, rendered into the Q&A prompt and handed to the active
//! `CompletionClient`.

pub mod budget;
pub mod pipeline;
pub mod prompt;
pub mod session;
pub mod source;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use budget::{PromptBudget, SAFETY_MARGIN, longest_fitting_prefix, select_within_budget};
pub use pipeline::{PreparedPrompt, RagAnswer, RagPipeline, RagStream};
pub use prompt::{QA_TEMPLATE, assemble, join_context};
pub use session::{PageButton, SessionContext, pagination_window};
pub use source::{DocumentSource, MockDocumentSource};
