#![deny(missing_docs)]

//! # Document Registry
//!
//! Stores externally supplied OpenAPI / JSON Schema documents for multi-document
//! reference resolution. No network access is performed.

use crate::error::{AppError, AppResult};
use crate::node::Node;
use crate::pointer::normalize_document_uri;
use indexmap::IndexMap;
use std::sync::Arc;

/// Registry for externally supplied documents, keyed by normalized URI.
#[derive(Debug, Clone, Default)]
pub struct DocumentRegistry {
    docs: IndexMap<String, Arc<Node>>,
}

impl DocumentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document from YAML (or JSON) text.
    pub fn register_yaml(&mut self, retrieval_uri: &str, yaml: &str) -> AppResult<()> {
        let node = Node::from_yaml_str(yaml).map_err(|e| {
            AppError::Parse(format!("Failed to parse document '{}': {}", retrieval_uri, e))
        })?;
        self.register_node(retrieval_uri, node)
    }

    /// Registers an already parsed document.
    pub fn register_node(&mut self, retrieval_uri: &str, node: Node) -> AppResult<()> {
        let key = normalize_document_uri(retrieval_uri).ok_or_else(|| {
            AppError::Registry(format!("Invalid document URI '{}'", retrieval_uri))
        })?;
        if key.is_empty() {
            return Err(AppError::Registry(
                "Document URI must not be empty".into(),
            ));
        }
        if self.docs.contains_key(&key) {
            return Err(AppError::Registry(format!(
                "Document registry URI collision for '{}'",
                key
            )));
        }
        tracing::debug!(uri = %key, "registered document");
        self.docs.insert(key, Arc::new(node));
        Ok(())
    }

    /// Returns a registered document by URI.
    pub fn get(&self, uri: &str) -> Option<&Arc<Node>> {
        if let Some(doc) = self.docs.get(uri) {
            return Some(doc);
        }
        let key = normalize_document_uri(uri)?;
        self.docs.get(&key)
    }

    /// True if a document is registered under `uri`.
    pub fn contains(&self, uri: &str) -> bool {
        self.get(uri).is_some()
    }

    /// Registered URIs in registration order.
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.docs.keys().map(String::as_str)
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
