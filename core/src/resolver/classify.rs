#![deny(missing_docs)]

//! # Circular Reference Classification
//!
//! Every reference node is reached through some structural context: the
//! innermost schema keyword between the enclosing schema and the `$ref`.
//! When a reference closes a cycle, that context decides whether the cycle is a
//! legitimate recursive shape or an unconditional self-reference.

use crate::config::ResolverConfig;
use crate::resolver::results::Classification;
use derive_more::Display;

/// Composition keywords that allow self-referential variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum CompositionKeyword {
    /// `allOf`
    #[display("allOf")]
    AllOf,
    /// `oneOf`
    #[display("oneOf")]
    OneOf,
    /// `anyOf`
    #[display("anyOf")]
    AnyOf,
}

impl CompositionKeyword {
    /// Maps a mapping key to a composition keyword.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "allOf" => Some(Self::AllOf),
            "oneOf" => Some(Self::OneOf),
            "anyOf" => Some(Self::AnyOf),
            _ => None,
        }
    }
}

/// The structural context a reference node is reached through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display)]
pub enum EdgeContext {
    /// No qualifying keyword: properties, parameters, responses, or the
    /// reference sits directly where a schema is expected.
    #[default]
    #[display("direct")]
    Direct,
    /// Inside `allOf` / `oneOf` / `anyOf`, including `items` directly beneath one.
    #[display("{_0}")]
    Composition(CompositionKeyword),
    /// Inside a plain array `items` schema.
    #[display("items")]
    ArrayItems,
}

impl EdgeContext {
    /// The context for the value stored under `key` in a mapping reached with `self`.
    ///
    /// Sequence elements keep their parent's context, so `allOf: [ {$ref} ]` stays
    /// a composition edge.
    pub fn descend(self, key: &str) -> EdgeContext {
        if let Some(keyword) = CompositionKeyword::from_key(key) {
            return EdgeContext::Composition(keyword);
        }
        match (self, key) {
            (EdgeContext::Composition(keyword), "items") => EdgeContext::Composition(keyword),
            (_, "items") => EdgeContext::ArrayItems,
            _ => EdgeContext::Direct,
        }
    }
}

/// Classifies a cycle by the context of its closing edge.
pub fn classify(context: EdgeContext, config: &ResolverConfig) -> Classification {
    match context {
        EdgeContext::Composition(_) => Classification::Polymorphic,
        EdgeContext::ArrayItems if config.array_items_polymorphic => Classification::Polymorphic,
        EdgeContext::ArrayItems | EdgeContext::Direct => Classification::NonPolymorphic,
    }
}
