//! # Sift Core
//!
//! Domain types, traits, and error definitions for Sift, an AI-powered
//! search demo that answers queries from retrieved passages.
//! This crate has **no HTTP dependencies**; it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The completion backend is defined as a trait here. Implementations live in
//! `sift-providers` and exactly one is chosen from configuration at startup.

pub mod completion;
pub mod error;
pub mod passage;

// Re-export key types at crate root for ergonomics
pub use completion::{
    CompletionClient, CompletionRequest, Fragment, FragmentStream, LoaderParams, ModelInfo,
    TokenCounter, TokenizerParams,
};
pub use error::{BackendError, ConfigurationError, Error, LookupMiss, Result};
pub use passage::{Passage, PassageMetadata};
