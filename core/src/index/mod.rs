#![deny(missing_docs)]

//! # Reference Index
//!
//! Scans a root document (and every registered document it reaches) for `$ref`
//! occurrences and locates their targets.
//!
//! The resolver only talks to the index through [`ReferenceIndex`]; [`SpecIndex`]
//! is the in-memory implementation. An index is immutable once built.

pub mod reference;
pub mod registry;

use crate::config::IndexConfig;
use crate::error::AppResult;
use crate::node::{Node, NodeKind, REF_KEY};
use crate::pointer::{
    normalize_document_uri, qualify_reference, reference_name, resolve_pointer, PointerPath,
};
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

pub use reference::Reference;
pub use registry::DocumentRegistry;

/// What the resolver needs from an index.
pub trait ReferenceIndex {
    /// The root document, or `None` for an empty index.
    fn root(&self) -> Option<&Node>;

    /// Key of the root document.
    fn root_document(&self) -> &str;

    /// Looks up a qualified definition.
    fn lookup(&self, definition: &str) -> Option<&Reference>;

    /// Every `$ref` occurrence, in discovery order.
    fn all_references(&self) -> &[Reference];

    /// Every located reference, keyed by qualified definition, in discovery order.
    fn all_mapped_references(&self) -> &IndexMap<String, Reference>;

    /// True if the document with this key is available to the index.
    fn has_document(&self, uri: &str) -> bool;
}

/// In-memory index over a root document and a [`DocumentRegistry`].
#[derive(Debug, Clone, Default)]
pub struct SpecIndex {
    root: Option<Arc<Node>>,
    root_document: String,
    registry: DocumentRegistry,
    references: Vec<Reference>,
    mapped: IndexMap<String, Reference>,
}

struct Site {
    raw: String,
    document: String,
    path: String,
    location: Option<crate::node::Location>,
}

impl SpecIndex {
    /// An index with no root document.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses YAML text and indexes it as a standalone document.
    pub fn from_yaml_str(text: &str) -> AppResult<Self> {
        let root = Node::from_yaml_str(text)?;
        Ok(Self::new(root, IndexConfig::default(), DocumentRegistry::new()))
    }

    /// Builds an index over `root`, pulling in registered documents as they are referenced.
    pub fn new(root: Node, config: IndexConfig, registry: DocumentRegistry) -> Self {
        let root_document = config
            .base_uri
            .as_deref()
            .and_then(normalize_document_uri)
            .unwrap_or_default();

        let mut index = SpecIndex {
            root: Some(Arc::new(root)),
            root_document,
            registry,
            references: Vec::new(),
            mapped: IndexMap::new(),
        };
        index.scan();
        tracing::debug!(
            references = index.references.len(),
            mapped = index.mapped.len(),
            documents = index.registry.len() + 1,
            "index built"
        );
        index
    }

    /// Looks up a document by key: the root or a registered document.
    pub fn document(&self, uri: &str) -> Option<&Node> {
        if uri == self.root_document {
            return self.root.as_deref();
        }
        self.registry.get(uri).map(|doc| doc.as_ref())
    }

    /// The registry backing external references.
    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    /// Occurrences whose target could not be located.
    pub fn unresolved_references(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter().filter(|r| !r.is_mapped())
    }

    fn scan(&mut self) {
        let mut pending = VecDeque::from([self.root_document.clone()]);
        let mut scanned = HashSet::new();

        while let Some(document) = pending.pop_front() {
            if !scanned.insert(document.clone()) {
                continue;
            }
            let mut sites = Vec::new();
            if let Some(node) = self.document(&document) {
                collect_sites(node, &document, &mut PointerPath::new(), &mut sites);
            }

            for site in sites {
                let reference = self.map_site(site);
                if reference.is_mapped() && !scanned.contains(&reference.target_document) {
                    pending.push_back(reference.target_document.clone());
                }
                self.references.push(reference);
            }
        }
    }

    fn map_site(&mut self, site: Site) -> Reference {
        let qualified = match qualify_reference(&site.raw, &site.document, &self.root_document) {
            Ok(q) => q,
            Err(err) => {
                tracing::debug!(reference = %site.raw, error = %err, "malformed reference");
                return Reference {
                    definition: site.raw.clone(),
                    name: reference_name(&site.raw),
                    raw: site.raw,
                    document: site.document,
                    path: site.path,
                    location: site.location,
                    target: None,
                    target_document: String::new(),
                    target_pointer: String::new(),
                };
            }
        };

        if let Some(existing) = self.mapped.get(&qualified.definition) {
            return existing.at_site(&site.raw, &site.document, site.path, site.location);
        }

        let target = self
            .document(&qualified.document)
            .and_then(|doc| resolve_pointer(doc, &qualified.pointer))
            .map(|node| Arc::new(node.clone()));

        let reference = Reference {
            name: reference_name(&qualified.definition),
            definition: qualified.definition,
            raw: site.raw,
            document: site.document,
            path: site.path,
            location: site.location,
            target,
            target_document: qualified.document,
            target_pointer: qualified.pointer,
        };
        if reference.is_mapped() {
            self.mapped
                .insert(reference.definition.clone(), reference.clone());
        }
        reference
    }
}

impl ReferenceIndex for SpecIndex {
    fn root(&self) -> Option<&Node> {
        self.root.as_deref()
    }

    fn root_document(&self) -> &str {
        &self.root_document
    }

    fn lookup(&self, definition: &str) -> Option<&Reference> {
        self.mapped.get(definition)
    }

    fn all_references(&self) -> &[Reference] {
        &self.references
    }

    fn all_mapped_references(&self) -> &IndexMap<String, Reference> {
        &self.mapped
    }

    fn has_document(&self, uri: &str) -> bool {
        self.document(uri).is_some()
    }
}

fn collect_sites(node: &Node, document: &str, path: &mut PointerPath, out: &mut Vec<Site>) {
    match &node.kind {
        NodeKind::Mapping(entries) => {
            if let Some(raw) = node.reference_value() {
                out.push(Site {
                    raw: raw.to_string(),
                    document: document.to_string(),
                    path: path.to_pointer(),
                    location: node.entry(REF_KEY).and_then(|e| e.key_location),
                });
                return;
            }
            for entry in entries {
                path.push(entry.key.as_str());
                collect_sites(&entry.value, document, path, out);
                path.pop();
            }
        }
        NodeKind::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                path.push(i.to_string());
                collect_sites(item, document, path, out);
                path.pop();
            }
        }
        NodeKind::Scalar(_) => {}
    }
}
