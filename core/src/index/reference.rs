#![deny(missing_docs)]

//! # References
//!
//! One `$ref` occurrence, together with the target it was located at.

use crate::node::{Location, Node};
use crate::pointer::friendly_path;
use std::fmt;
use std::sync::Arc;

/// A `$ref` occurrence and (when located) its target.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// Qualified definition, the index key (`#/components/schemas/Pet`, `common.yaml#/Error`).
    pub definition: String,
    /// The `$ref` value exactly as written.
    pub raw: String,
    /// Short display name (last pointer segment).
    pub name: String,
    /// Key of the document containing the `$ref`.
    pub document: String,
    /// JSON pointer of the mapping containing the `$ref`.
    pub path: String,
    /// Position of the `$ref` key.
    pub location: Option<Location>,
    /// Frozen target node, shared read-only with the index.
    pub target: Option<Arc<Node>>,
    /// Key of the document the target lives in.
    pub target_document: String,
    /// JSON pointer of the target within its document.
    pub target_pointer: String,
}

impl Reference {
    /// True once the target has been located.
    pub fn is_mapped(&self) -> bool {
        self.target.is_some()
    }

    /// Position of the target node, if known.
    pub fn target_location(&self) -> Option<Location> {
        self.target.as_ref().and_then(|t| t.location)
    }

    /// A copy of this reference describing another occurrence of the same definition.
    pub fn at_site(
        &self,
        raw: &str,
        document: &str,
        path: String,
        location: Option<Location>,
    ) -> Reference {
        Reference {
            definition: self.definition.clone(),
            raw: raw.to_string(),
            name: self.name.clone(),
            document: document.to_string(),
            path,
            location,
            target: self.target.clone(),
            target_document: self.target_document.clone(),
            target_pointer: self.target_pointer.clone(),
        }
    }

    /// JSONPath-like rendering of the definition.
    pub fn friendly_path(&self) -> String {
        friendly_path(&self.definition)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.definition)?;
        if let Some(loc) = self.location {
            write!(f, " (at {})", loc)?;
        }
        Ok(())
    }
}
