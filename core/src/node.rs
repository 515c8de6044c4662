#![deny(missing_docs)]

//! # Document Nodes
//!
//! An ordered, position-carrying tree for YAML / JSON documents.
//!
//! Values are typed by `serde_yaml`; line and column information is taken from a
//! `marked-yaml` parse of the same text and zipped onto the typed tree. When the
//! positional parse is not possible (aliases, unusual tags) the tree is still
//! built, just without locations.

use crate::error::AppResult;
use serde_json::{Map, Number, Value as JsonValue};
use serde_yaml::Value as YamlValue;
use std::fmt;

/// The mapping key that marks a reference node.
pub const REF_KEY: &str = "$ref";

/// A 1-based line / column position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    /// Line number (1-based).
    pub line: usize,
    /// Column number (1-based).
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// `null` / `~` / empty value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer or float.
    Number(Number),
    /// Any string.
    String(String),
}

/// One key/value pair of a mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    /// The key, rendered as a string.
    pub key: String,
    /// Position of the key.
    pub key_location: Option<Location>,
    /// The value.
    pub value: Node,
}

/// The shape of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A leaf value.
    Scalar(Scalar),
    /// An ordered mapping.
    Mapping(Vec<MapEntry>),
    /// A sequence.
    Sequence(Vec<Node>),
}

/// A document node.
///
/// `Clone` is a deep copy, so two clones never share mutable state.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Shape and content.
    pub kind: NodeKind,
    /// Position of the value, if known.
    pub location: Option<Location>,
}

impl Node {
    /// Creates a node without position information.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }

    /// Creates a `{ $ref: <pointer> }` mapping.
    pub fn reference(pointer: &str) -> Self {
        Node::new(NodeKind::Mapping(vec![MapEntry {
            key: REF_KEY.to_string(),
            key_location: None,
            value: Node::new(NodeKind::Scalar(Scalar::String(pointer.to_string()))),
        }]))
    }

    /// Parses YAML (or JSON) text into a node tree with positions.
    pub fn from_yaml_str(text: &str) -> AppResult<Node> {
        let typed: YamlValue = serde_yaml::from_str(text)?;
        let marked = match marked_yaml::parse_yaml(0, text) {
            Ok(node) => Some(node),
            Err(err) => {
                tracing::warn!(error = %err, "positional parse failed, locations unavailable");
                None
            }
        };
        Ok(from_yaml_value(&typed, marked.as_ref()))
    }

    /// Builds a node tree from a JSON value. No positions are attached.
    pub fn from_json_value(value: &JsonValue) -> Node {
        let kind = match value {
            JsonValue::Null => NodeKind::Scalar(Scalar::Null),
            JsonValue::Bool(b) => NodeKind::Scalar(Scalar::Bool(*b)),
            JsonValue::Number(n) => NodeKind::Scalar(Scalar::Number(n.clone())),
            JsonValue::String(s) => NodeKind::Scalar(Scalar::String(s.clone())),
            JsonValue::Array(items) => {
                NodeKind::Sequence(items.iter().map(Node::from_json_value).collect())
            }
            JsonValue::Object(map) => NodeKind::Mapping(
                map.iter()
                    .map(|(k, v)| MapEntry {
                        key: k.clone(),
                        key_location: None,
                        value: Node::from_json_value(v),
                    })
                    .collect(),
            ),
        };
        Node::new(kind)
    }

    /// Returns the mapping entries, if this is a mapping.
    pub fn entries(&self) -> Option<&[MapEntry]> {
        match &self.kind {
            NodeKind::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Returns the sequence items, if this is a sequence.
    pub fn items(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the string content of a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Looks up a mapping entry by key.
    pub fn entry(&self, key: &str) -> Option<&MapEntry> {
        self.entries()?.iter().find(|e| e.key == key)
    }

    /// Looks up a mapping value by key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entry(key).map(|e| &e.value)
    }

    /// Looks up a mapping value by key, mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        match &mut self.kind {
            NodeKind::Mapping(entries) => entries
                .iter_mut()
                .find(|e| e.key == key)
                .map(|e| &mut e.value),
            _ => None,
        }
    }

    /// Returns the `$ref` pointer if this node is a reference node.
    ///
    /// A `$ref` key whose value is not a string is ordinary content.
    pub fn reference_value(&self) -> Option<&str> {
        self.get(REF_KEY)?.as_str()
    }

    /// True if this is a reference node.
    pub fn is_reference(&self) -> bool {
        self.reference_value().is_some()
    }

    /// Counts reference nodes anywhere in this tree.
    pub fn count_references(&self) -> usize {
        let own = usize::from(self.is_reference());
        let children: usize = match &self.kind {
            NodeKind::Mapping(entries) => entries.iter().map(|e| e.value.count_references()).sum(),
            NodeKind::Sequence(items) => items.iter().map(Node::count_references).sum(),
            NodeKind::Scalar(_) => 0,
        };
        own + children
    }

    /// Converts to a JSON value, preserving key order.
    pub fn to_json_value(&self) -> JsonValue {
        match &self.kind {
            NodeKind::Scalar(Scalar::Null) => JsonValue::Null,
            NodeKind::Scalar(Scalar::Bool(b)) => JsonValue::Bool(*b),
            NodeKind::Scalar(Scalar::Number(n)) => JsonValue::Number(n.clone()),
            NodeKind::Scalar(Scalar::String(s)) => JsonValue::String(s.clone()),
            NodeKind::Sequence(items) => {
                JsonValue::Array(items.iter().map(Node::to_json_value).collect())
            }
            NodeKind::Mapping(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for entry in entries {
                    map.insert(entry.key.clone(), entry.value.to_json_value());
                }
                JsonValue::Object(map)
            }
        }
    }

    /// Renders the tree as pretty-printed JSON.
    pub fn to_json_string(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_json_value())?)
    }

    /// Renders the tree as YAML.
    pub fn to_yaml_string(&self) -> AppResult<String> {
        Ok(serde_yaml::to_string(&self.to_json_value())?)
    }
}

fn from_yaml_value(value: &YamlValue, marked: Option<&marked_yaml::Node>) -> Node {
    let location = marked.and_then(|m| span_start(m.span()));
    let kind = match value {
        YamlValue::Null => NodeKind::Scalar(Scalar::Null),
        YamlValue::Bool(b) => NodeKind::Scalar(Scalar::Bool(*b)),
        YamlValue::Number(n) => NodeKind::Scalar(convert_number(n)),
        YamlValue::String(s) => NodeKind::Scalar(Scalar::String(s.clone())),
        YamlValue::Tagged(tagged) => return from_yaml_value(&tagged.value, marked),
        YamlValue::Sequence(items) => {
            let marked_items = marked.and_then(|m| m.as_sequence());
            NodeKind::Sequence(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| from_yaml_value(item, marked_items.and_then(|s| s.get(i))))
                    .collect(),
            )
        }
        YamlValue::Mapping(map) => {
            let marked_map = marked.and_then(|m| m.as_mapping());
            let mut marked_iter = marked_map.map(|m| m.iter());
            let mut entries = Vec::with_capacity(map.len());
            for (k, v) in map {
                let key = key_to_string(k);
                // Keys come out of both parsers in source order; fall back to a scan on mismatch.
                let pair = match marked_iter.as_mut().and_then(|it| it.next()) {
                    Some((mk, mv)) if mk.as_str() == key => Some((mk, mv)),
                    _ => marked_map.and_then(|m| m.iter().find(|(mk, _)| mk.as_str() == key)),
                };
                entries.push(MapEntry {
                    key_location: pair.and_then(|(mk, _)| span_start(mk.span())),
                    value: from_yaml_value(v, pair.map(|(_, mv)| mv)),
                    key,
                });
            }
            NodeKind::Mapping(entries)
        }
    };
    Node { kind, location }
}

fn span_start(span: &marked_yaml::Span) -> Option<Location> {
    span.start().map(|m| Location {
        line: m.line(),
        column: m.column(),
    })
}

fn convert_number(n: &serde_yaml::Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        return Scalar::Number(i.into());
    }
    if let Some(u) = n.as_u64() {
        return Scalar::Number(u.into());
    }
    n.as_f64()
        .and_then(Number::from_f64)
        .map(Scalar::Number)
        .unwrap_or_else(|| Scalar::String(n.to_string()))
}

fn key_to_string(key: &YamlValue) -> String {
    match key {
        YamlValue::String(s) => s.clone(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Null => "null".to_string(),
        YamlValue::Tagged(tagged) => key_to_string(&tagged.value),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
