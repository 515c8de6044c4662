#![deny(missing_docs)]

//! # Resolver Results
//!
//! Cycles and errors recorded during a pass.

use crate::index::Reference;
use crate::node::Location;
use crate::pointer::friendly_path;
use crate::resolver::classify::EdgeContext;
use derive_more::Display;
use std::fmt;

/// Whether a cycle is a tolerable recursive shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Classification {
    /// Closes through a composition keyword; a legitimate recursive schema.
    #[display("polymorphic")]
    Polymorphic,
    /// Closes through a direct reference chain; can never be materialized.
    #[display("non-polymorphic")]
    NonPolymorphic,
}

/// One detected cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularReferenceResult {
    /// The loop: repeated step first, closing step last (`A -> B -> A`).
    pub journey: Vec<Reference>,
    /// The step the loop returns to.
    pub start: Reference,
    /// Index of `start` within the full journey at detection time.
    pub loop_index: usize,
    /// The reference occurrence that closed the loop.
    pub loop_point: Reference,
    /// Polymorphic or not.
    pub classification: Classification,
    /// Context of the closing edge.
    pub context: EdgeContext,
}

impl CircularReferenceResult {
    /// True for tolerable cycles.
    pub fn is_polymorphic(&self) -> bool {
        self.classification == Classification::Polymorphic
    }

    /// Human-readable reference chain, e.g. `Node -> Children -> Node`.
    pub fn journey_path(&self) -> String {
        self.journey
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Position of the reference that closed the loop.
    pub fn location(&self) -> Option<Location> {
        self.loop_point.location
    }
}

/// Kinds of resolving errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ResolvingErrorKind {
    /// The pointer does not lead to a node.
    #[display("missing reference")]
    MissingReference,
    /// The referenced document is not available to the index.
    #[display("unknown document")]
    UnknownDocument,
    /// The `$ref` value is not a usable pointer.
    #[display("malformed reference")]
    MalformedReference,
    /// A non-polymorphic cycle.
    #[display("circular reference")]
    CircularReference,
    /// The branch exceeded a traversal bound.
    #[display("depth exceeded")]
    DepthExceeded,
}

/// A reference that could not be satisfied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvingError {
    /// What went wrong.
    pub kind: ResolvingErrorKind,
    /// Qualified definition (or the raw value when it could not be qualified).
    pub definition: String,
    /// Document the offending node lives in.
    pub document: String,
    /// JSON pointer of the offending node.
    pub path: String,
    /// Position of the offending `$ref` key, if known.
    pub location: Option<Location>,
    /// Contextual message.
    pub message: String,
    /// The cycle, for `CircularReference` errors.
    pub circular: Option<CircularReferenceResult>,
}

impl ResolvingError {
    /// JSONPath-like rendering of the offending node's position in its document.
    pub fn friendly_path(&self) -> String {
        friendly_path(&format!("{}#{}", self.document, self.path))
    }

    /// True for promoted cycles.
    pub fn is_circular(&self) -> bool {
        self.kind == ResolvingErrorKind::CircularReference
    }
}

impl fmt::Display for ResolvingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.message, self.friendly_path())?;
        if let Some(loc) = self.location {
            write!(f, " at {}", loc)?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolvingError {}
