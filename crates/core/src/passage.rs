//! Passage domain type.
//!
//! A passage is one retrieved text unit plus the metadata needed to cite it.
//! Passages arrive from a document source in relevance order, and that order
//! is preserved through budgeting, prompt assembly, and citation display.

use serde::{Deserialize, Serialize};

/// Citation metadata attached to a passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageMetadata {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// Source-specific key/value pairs (data source, date, score, ...)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A retrieved passage. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// The text handed to the model as context.
    pub body: String,
    pub metadata: PassageMetadata,
}

impl Passage {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            metadata: PassageMetadata {
                title: title.into(),
                link: None,
                extra: serde_json::Map::new(),
            },
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.metadata.link = Some(link.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.extra.insert(key.into(), value);
        self
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    pub fn link(&self) -> Option<&str> {
        self.metadata.link.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_metadata() {
        let p = Passage::new("Article #1", "body text")
            .with_link("https://google.com")
            .with_extra("data_source", serde_json::json!("confluence"));
        assert_eq!(p.title(), "Article #1");
        assert_eq!(p.link(), Some("https://google.com"));
        assert_eq!(p.metadata.extra["data_source"], "confluence");
    }

    #[test]
    fn empty_extra_is_not_serialized() {
        let p = Passage::new("t", "b");
        let json = serde_json::to_string(&p).unwrap();
        assert!(!json.contains("extra"));
        assert!(!json.contains("link"));
    }
}
