#![deny(missing_docs)]

//! # OASRef Core
//!
//! Reference resolution and circular-reference detection for OpenAPI / Swagger
//! documents.
//!
//! ```no_run
//! use oasref_core::{Resolver, SpecIndex};
//!
//! let index = SpecIndex::from_yaml_str("openapi: 3.0.0\n").unwrap();
//! let mut resolver = Resolver::new(&index);
//! let cycles = resolver.resolve();
//! assert!(cycles.is_empty());
//! ```

/// Shared error types.
pub mod error;

/// Resolver and index settings.
pub mod config;

/// Position-carrying document tree.
pub mod node;

/// `$ref` parsing, qualification and JSON pointers.
pub mod pointer;

/// Reference index and document registry.
pub mod index;

/// Resolution, journey tracking and cycle classification.
pub mod resolver;

pub use config::{IndexConfig, ResolverConfig};
pub use error::{AppError, AppResult};
pub use index::{DocumentRegistry, Reference, ReferenceIndex, SpecIndex};
pub use node::{Location, MapEntry, Node, NodeKind, Scalar};
pub use resolver::{
    CircularReferenceResult, Classification, EdgeContext, ResolvingError, ResolvingErrorKind,
    Resolver,
};
