#![deny(missing_docs)]

//! # Reference Pointers
//!
//! Parsing and qualification of `$ref` strings.
//!
//! A `$ref` is split into a document part and a fragment. The document part is
//! resolved against the URI of the document the reference was written in, so
//! every reference ends up with one *qualified definition*:
//!
//! - references into the root document keep the local form `#/components/schemas/Pet`;
//! - references into other documents become `common.yaml#/Pet` or
//!   `https://example.com/api.yaml#/Pet`.
//!
//! Relative URIs are resolved against a dummy authority and stripped again
//! afterwards, which gives `..` / `.` normalization without touching the
//! filesystem. No document is ever fetched here.

use crate::node::Node;
use percent_encoding::percent_decode_str;
use std::fmt;
use url::Url;

const DUMMY_BASE: &str = "http://example.invalid/";

/// Why a `$ref` string could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    /// The reference string is empty.
    Empty,
    /// The fragment is present but is not a JSON pointer (`#foo` rather than `#/foo`).
    NotAPointer(String),
    /// The document part could not be resolved to a URI.
    BadDocument(String),
}

impl fmt::Display for PointerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerError::Empty => write!(f, "reference is empty"),
            PointerError::NotAPointer(frag) => {
                write!(f, "fragment `#{}` is not a JSON pointer", frag)
            }
            PointerError::BadDocument(doc) => write!(f, "cannot resolve document `{}`", doc),
        }
    }
}

/// A `$ref` split at the first `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedReference<'a> {
    /// Everything before `#` (empty for local references).
    pub document: &'a str,
    /// Everything after `#`, if a `#` was present.
    pub fragment: Option<&'a str>,
}

/// Splits a reference into its document and fragment parts.
pub fn parse_reference(raw: &str) -> ParsedReference<'_> {
    match raw.split_once('#') {
        Some((document, fragment)) => ParsedReference {
            document,
            fragment: Some(fragment),
        },
        None => ParsedReference {
            document: raw,
            fragment: None,
        },
    }
}

/// A fully qualified reference: the document it lives in plus its JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedReference {
    /// Document key (the root document's key for local references).
    pub document: String,
    /// JSON pointer within that document (empty string for the whole document).
    pub pointer: String,
    /// The qualified definition string used as the index key.
    pub definition: String,
}

/// Resolves a raw `$ref` written in `current_document` into a qualified reference.
///
/// `root_document` is the key of the root document; references that end up
/// pointing at it are expressed in local `#/...` form.
pub fn qualify_reference(
    raw: &str,
    current_document: &str,
    root_document: &str,
) -> Result<QualifiedReference, PointerError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(PointerError::Empty);
    }
    let parsed = parse_reference(raw);
    let fragment = parsed.fragment.unwrap_or("");
    if !fragment.is_empty() && !fragment.starts_with('/') {
        return Err(PointerError::NotAPointer(fragment.to_string()));
    }

    let document = if parsed.document.is_empty() {
        current_document.to_string()
    } else {
        resolve_document_uri(parsed.document, current_document)
            .ok_or_else(|| PointerError::BadDocument(parsed.document.to_string()))?
    };

    let definition = if document == root_document {
        format!("#{}", fragment)
    } else {
        format!("{}#{}", document, fragment)
    };

    Ok(QualifiedReference {
        document,
        pointer: fragment.to_string(),
        definition,
    })
}

/// Resolves a document URI against the document it was referenced from.
///
/// Absolute URIs are kept as-is (minus any fragment). Relative ones are joined
/// with `base`; when `base` itself is relative the result stays relative.
pub fn resolve_document_uri(doc: &str, base: &str) -> Option<String> {
    if let Ok(mut url) = Url::parse(doc) {
        url.set_fragment(None);
        return Some(url.to_string());
    }
    let base_url = parse_base_url(base)?;
    let mut joined = base_url.join(doc).ok()?;
    joined.set_fragment(None);
    Some(strip_dummy(joined.as_str()))
}

/// Normalizes a document URI without a referencing document (used for registration).
pub fn normalize_document_uri(uri: &str) -> Option<String> {
    resolve_document_uri(uri, "")
}

fn parse_base_url(base: &str) -> Option<Url> {
    if let Ok(url) = Url::parse(base) {
        return Some(url);
    }
    let dummy = Url::parse(DUMMY_BASE).ok()?;
    dummy.join(base).ok()
}

fn strip_dummy(uri: &str) -> String {
    let relative = uri.strip_prefix(DUMMY_BASE).unwrap_or(uri);
    percent_decode_str(relative).decode_utf8_lossy().into_owned()
}

/// Decodes a JSON Pointer segment (handles `~1`, `~0` and percent-encoding).
pub fn decode_pointer_segment(segment: &str) -> String {
    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    decoded.replace("~1", "/").replace("~0", "~")
}

/// Encodes a key as a JSON Pointer segment.
pub fn encode_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Splits a JSON pointer (`/a/b~1c`) into decoded segments.
pub fn pointer_segments(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(decode_pointer_segment)
        .collect()
}

/// Walks a JSON pointer through a node tree.
pub fn resolve_pointer<'a>(root: &'a Node, pointer: &str) -> Option<&'a Node> {
    let mut current = root;
    for segment in pointer_segments(pointer) {
        current = if let Some(items) = current.items() {
            items.get(segment.parse::<usize>().ok()?)?
        } else {
            current.get(&segment)?
        };
    }
    Some(current)
}

/// The last meaningful segment of a definition, used as a short display name.
pub fn reference_name(definition: &str) -> String {
    let parsed = parse_reference(definition);
    let fragment = parsed.fragment.unwrap_or("");
    match pointer_segments(fragment).pop() {
        Some(last) => last,
        None if !parsed.document.is_empty() => parsed
            .document
            .rsplit('/')
            .next()
            .unwrap_or(parsed.document)
            .to_string(),
        None => "#".to_string(),
    }
}

/// Renders a definition as a JSONPath-like string (`$.components.schemas['Pet Food']`).
pub fn friendly_path(definition: &str) -> String {
    let parsed = parse_reference(definition);
    let mut out = String::from("$");
    for segment in pointer_segments(parsed.fragment.unwrap_or("")) {
        let plain = !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if plain && !segment.chars().all(|c| c.is_ascii_digit()) {
            out.push('.');
            out.push_str(&segment);
        } else if plain {
            out.push('[');
            out.push_str(&segment);
            out.push(']');
        } else {
            out.push_str("['");
            out.push_str(&segment.replace('\'', "\\'"));
            out.push_str("']");
        }
    }
    if parsed.document.is_empty() {
        out
    } else {
        format!("{} {}", parsed.document, out)
    }
}

/// A JSON pointer under construction, pushed and popped during traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointerPath {
    segments: Vec<String>,
}

impl PointerPath {
    /// An empty path (the document root).
    pub fn new() -> Self {
        Self::default()
    }

    /// A path starting at an existing pointer.
    pub fn from_pointer(pointer: &str) -> Self {
        Self {
            segments: pointer_segments(pointer),
        }
    }

    /// Appends a segment.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Removes the last segment.
    pub fn pop(&mut self) {
        self.segments.pop();
    }

    /// Renders the path as an encoded JSON pointer.
    pub fn to_pointer(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            out.push_str(&encode_pointer_segment(segment));
        }
        out
    }
}
