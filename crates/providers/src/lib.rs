//! Completion backend implementations for Sift.
//!
//! All backends implement the `sift_core::CompletionClient` trait.
//! The factory selects exactly one from configuration.

pub mod factory;
pub mod gateway;
pub mod local;
pub mod openai;
pub mod tokenizer;
pub mod transport;

pub use factory::{BackendKind, build_client};
pub use gateway::GatewayClient;
pub use local::LocalServerClient;
pub use openai::OpenAiClient;
pub use transport::{ChatTransport, HttpOptions};
