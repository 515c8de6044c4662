#![deny(missing_docs)]

//! # Resolver
//!
//! Walks a document from the index root, substitutes every `$ref` with a deep
//! copy of its target and records cycles and broken references.
//!
//! Cycle detection is path-scoped: a cycle is only reported when a reference
//! leads back to a definition on the active [`Journey`]. The same target reached
//! from sibling branches is never a cycle. Within one pass the first completed
//! expansion of each definition is remembered and copied into later sites, which
//! keeps large documents linear without affecting which references are cycles.
//! A remembered expansion carries its height and the reference chain it
//! absorbed, so reusing it is held to the same depth bounds as walking it.
//!
//! Substitution policy:
//! - located, non-circular reference: replaced by a copy of the resolved target;
//! - circular reference: left as a `$ref` marker; non-polymorphic cycles are also
//!   reported through [`Resolver::resolving_errors`];
//! - broken reference: left in place, reported as an error.
//!
//! Markers copied out of a registered document carry the qualified definition
//! (`common.yaml#/Error`) so they still name the same node inside the root tree.

pub mod classify;
pub mod journey;
pub mod results;

use crate::config::ResolverConfig;
use crate::index::{Reference, ReferenceIndex};
use crate::node::{Location, MapEntry, Node, NodeKind, Scalar, REF_KEY};
use crate::pointer::{qualify_reference, PointerPath};
use std::collections::{HashMap, HashSet};

pub use classify::{classify, CompositionKeyword, EdgeContext};
pub use journey::Journey;
pub use results::{Classification, CircularReferenceResult, ResolvingError, ResolvingErrorKind};

/// Reference resolver over a [`ReferenceIndex`].
///
/// A resolver without an index is a no-op: every pass returns empty results.
#[derive(Default)]
pub struct Resolver<'a> {
    index: Option<&'a dyn ReferenceIndex>,
    config: ResolverConfig,
    resolved_root: Option<Node>,
    circular_references: Vec<CircularReferenceResult>,
    resolving_errors: Vec<ResolvingError>,
}

impl<'a> Resolver<'a> {
    /// A resolver with default settings.
    pub fn new(index: &'a dyn ReferenceIndex) -> Self {
        Self::with_config(index, ResolverConfig::default())
    }

    /// A resolver with explicit settings.
    pub fn with_config(index: &'a dyn ReferenceIndex, config: ResolverConfig) -> Self {
        Self {
            index: Some(index),
            config,
            ..Self::default()
        }
    }

    /// A resolver over an optional index; `None` gives the no-op resolver.
    pub fn from_optional(index: Option<&'a dyn ReferenceIndex>) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Active settings.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Full pass: resolves every reference and builds the resolved tree.
    pub fn resolve(&mut self) -> &[CircularReferenceResult] {
        self.resolved_root = self.run(Mode::Substitute);
        &self.circular_references
    }

    /// Detection-only pass: same traversal and findings, no tree is built.
    pub fn check_for_circular_references(&mut self) -> &[CircularReferenceResult] {
        self.run(Mode::Inspect);
        &self.circular_references
    }

    /// The tree produced by the last [`Resolver::resolve`].
    pub fn resolved_root(&self) -> Option<&Node> {
        self.resolved_root.as_ref()
    }

    /// Consumes the resolver, returning the resolved tree.
    pub fn into_resolved_root(self) -> Option<Node> {
        self.resolved_root
    }

    /// Every cycle of the last pass, in discovery order.
    pub fn circular_references(&self) -> &[CircularReferenceResult] {
        &self.circular_references
    }

    /// Every error of the last pass: broken references and depth aborts in
    /// discovery order, followed by the non-polymorphic cycles.
    pub fn resolving_errors(&self) -> &[ResolvingError] {
        &self.resolving_errors
    }

    /// The non-polymorphic cycles, as errors.
    pub fn circular_errors(&self) -> Vec<&ResolvingError> {
        self.resolving_errors
            .iter()
            .filter(|e| e.is_circular())
            .collect()
    }

    /// Cycles classified as polymorphic.
    pub fn polymorphic_circular_errors(&self) -> Vec<&CircularReferenceResult> {
        self.circular_references
            .iter()
            .filter(|c| c.is_polymorphic())
            .collect()
    }

    /// Cycles classified as non-polymorphic.
    pub fn non_polymorphic_circular_errors(&self) -> Vec<&CircularReferenceResult> {
        self.circular_references
            .iter()
            .filter(|c| !c.is_polymorphic())
            .collect()
    }

    fn run(&mut self, mode: Mode) -> Option<Node> {
        self.circular_references.clear();
        self.resolving_errors.clear();

        let index = self.index?;
        let root = index.root()?;

        tracing::debug!(
            ?mode,
            references = index.all_references().len(),
            "starting reference pass"
        );

        let mut pass = Pass::new(index, self.config.clone(), mode);
        let resolved = pass.walk(root, EdgeContext::Direct);
        let (cycles, errors) = pass.finish();

        tracing::debug!(
            cycles = cycles.len(),
            polymorphic = cycles.iter().filter(|c| c.is_polymorphic()).count(),
            errors = errors.len(),
            "reference pass complete"
        );

        self.circular_references = cycles;
        self.resolving_errors = errors;
        resolved
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Substitute,
    Inspect,
}

/// A completed expansion and the depth it needs.
struct Expansion {
    node: Option<Node>,
    /// Container levels below the reference site.
    height: usize,
    /// Longest run of references followed, the expanded one included.
    chain: usize,
}

/// State of one traversal. Dropped at the end of the pass.
struct Pass<'i> {
    index: &'i dyn ReferenceIndex,
    config: ResolverConfig,
    mode: Mode,
    journey: Journey,
    document: String,
    path: PointerPath,
    nesting: usize,
    deepest: usize,
    longest: usize,
    memo: HashMap<String, Expansion>,
    seen_cycles: HashSet<String>,
    seen_errors: HashSet<(ResolvingErrorKind, String, String)>,
    cycles: Vec<CircularReferenceResult>,
    errors: Vec<ResolvingError>,
}

impl<'i> Pass<'i> {
    fn new(index: &'i dyn ReferenceIndex, config: ResolverConfig, mode: Mode) -> Self {
        Self {
            document: index.root_document().to_string(),
            index,
            config,
            mode,
            journey: Journey::new(),
            path: PointerPath::new(),
            nesting: 0,
            deepest: 0,
            longest: 0,
            memo: HashMap::new(),
            seen_cycles: HashSet::new(),
            seen_errors: HashSet::new(),
            cycles: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn keep(&self, node: &Node) -> Option<Node> {
        match self.mode {
            Mode::Substitute => Some(node.clone()),
            Mode::Inspect => None,
        }
    }

    /// Keeps a reference node that is not substituted. Inside a registered
    /// document the `$ref` is rewritten to its qualified definition.
    fn marker(&self, node: &Node, definition: &str) -> Option<Node> {
        let mut marker = self.keep(node)?;
        if self.document != self.index.root_document() {
            if let Some(value) = marker.get_mut(REF_KEY) {
                value.kind = NodeKind::Scalar(Scalar::String(definition.to_string()));
            }
        }
        Some(marker)
    }

    fn walk(&mut self, node: &Node, context: EdgeContext) -> Option<Node> {
        if let Some(raw) = node.reference_value() {
            return self.visit_reference(node, raw, context);
        }

        let kind = match &node.kind {
            NodeKind::Scalar(_) => return self.keep(node),
            NodeKind::Mapping(_) | NodeKind::Sequence(_)
                if self.nesting >= self.config.max_nesting_depth =>
            {
                let message = format!(
                    "node nesting deeper than {} levels, branch abandoned",
                    self.config.max_nesting_depth
                );
                let definition = self.path.to_pointer();
                self.report(ResolvingErrorKind::DepthExceeded, definition, None, message);
                return self.keep(node);
            }
            NodeKind::Mapping(entries) => {
                self.nesting += 1;
                self.deepest = self.deepest.max(self.nesting);
                let mut resolved = Vec::with_capacity(entries.len());
                for entry in entries {
                    self.path.push(entry.key.as_str());
                    let value = self.walk(&entry.value, context.descend(&entry.key));
                    self.path.pop();
                    if let Some(value) = value {
                        resolved.push(MapEntry {
                            key: entry.key.clone(),
                            key_location: entry.key_location,
                            value,
                        });
                    }
                }
                self.nesting -= 1;
                NodeKind::Mapping(resolved)
            }
            NodeKind::Sequence(items) => {
                self.nesting += 1;
                self.deepest = self.deepest.max(self.nesting);
                let mut resolved = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    self.path.push(i.to_string());
                    let value = self.walk(item, context);
                    self.path.pop();
                    resolved.extend(value);
                }
                self.nesting -= 1;
                NodeKind::Sequence(resolved)
            }
        };

        match self.mode {
            Mode::Substitute => Some(Node {
                kind,
                location: node.location,
            }),
            Mode::Inspect => None,
        }
    }

    fn visit_reference(&mut self, node: &Node, raw: &str, context: EdgeContext) -> Option<Node> {
        let index = self.index;
        let location = node.entry(REF_KEY).and_then(|e| e.key_location);

        let qualified = match qualify_reference(raw, &self.document, index.root_document()) {
            Ok(q) => q,
            Err(err) => {
                let message = format!("cannot resolve reference `{}`: {}", raw, err);
                self.report(
                    ResolvingErrorKind::MalformedReference,
                    raw.to_string(),
                    location,
                    message,
                );
                return self.keep(node);
            }
        };

        let Some(mapped) = index.lookup(&qualified.definition) else {
            let (kind, message) = if index.has_document(&qualified.document) {
                (
                    ResolvingErrorKind::MissingReference,
                    format!("cannot resolve reference `{}`, it's missing", raw),
                )
            } else {
                (
                    ResolvingErrorKind::UnknownDocument,
                    format!(
                        "cannot resolve reference `{}`, document `{}` is not available",
                        raw, qualified.document
                    ),
                )
            };
            let marker = self.marker(node, &qualified.definition);
            self.report(kind, qualified.definition, location, message);
            return marker;
        };

        let site = mapped.at_site(raw, &self.document, self.path.to_pointer(), location);

        if let Some(loop_index) = self.journey.position(&site.definition) {
            let marker = self.marker(node, &site.definition);
            self.close_loop(loop_index, site, context);
            return marker;
        }

        if let Some((height, chain)) = self
            .memo
            .get(&site.definition)
            .map(|e| (e.height, e.chain))
        {
            let nesting_end = self.nesting + height;
            let chain_end = self.journey.len() + chain;
            if chain_end > self.config.max_journey_depth
                || nesting_end > self.config.max_nesting_depth
            {
                let message = format!(
                    "expanding `{}` here needs {} chained references and {} levels, \
                     beyond the limits of {} and {}; branch abandoned",
                    raw,
                    chain_end,
                    nesting_end,
                    self.config.max_journey_depth,
                    self.config.max_nesting_depth
                );
                let marker = self.marker(node, &site.definition);
                self.report(
                    ResolvingErrorKind::DepthExceeded,
                    site.definition,
                    location,
                    message,
                );
                return marker;
            }
            self.deepest = self.deepest.max(nesting_end);
            self.longest = self.longest.max(chain_end);
            return self.memo.get(&site.definition).and_then(|e| e.node.clone());
        }

        if self.journey.len() >= self.config.max_journey_depth {
            tracing::warn!(
                definition = %site.definition,
                depth = self.journey.len(),
                "reference chain too deep, branch abandoned"
            );
            let message = format!(
                "reference chain deeper than {} steps at `{}`, branch abandoned",
                self.config.max_journey_depth, raw
            );
            let marker = self.marker(node, &site.definition);
            self.report(
                ResolvingErrorKind::DepthExceeded,
                site.definition,
                location,
                message,
            );
            return marker;
        }

        let Some(target) = site.target.clone() else {
            return self.keep(node);
        };

        tracing::trace!(
            definition = %site.definition,
            depth = self.journey.len(),
            "descending into reference"
        );

        let definition = site.definition.clone();
        let entry_nesting = self.nesting;
        let entry_journey = self.journey.len();
        let outer_deepest = std::mem::replace(&mut self.deepest, entry_nesting);
        let outer_longest = std::mem::replace(&mut self.longest, entry_journey);
        let saved_document = std::mem::replace(&mut self.document, site.target_document.clone());
        let saved_path = std::mem::replace(
            &mut self.path,
            PointerPath::from_pointer(&site.target_pointer),
        );
        self.journey.push(site);
        self.longest = self.longest.max(self.journey.len());

        let resolved = self.walk(&target, EdgeContext::Direct);

        self.journey.pop();
        self.path = saved_path;
        self.document = saved_document;

        let height = self.deepest - entry_nesting;
        let chain = self.longest - entry_journey;
        self.deepest = self.deepest.max(outer_deepest);
        self.longest = self.longest.max(outer_longest);

        self.memo.insert(
            definition,
            Expansion {
                node: resolved.clone(),
                height,
                chain,
            },
        );
        resolved
    }

    fn close_loop(&mut self, loop_index: usize, closing: Reference, context: EdgeContext) {
        let key = journey::cycle_key(&self.journey.steps()[loop_index..]);
        if !self.seen_cycles.insert(key) {
            return;
        }

        let result = CircularReferenceResult {
            journey: self.journey.loop_from(loop_index, closing.clone()),
            start: self.journey.steps()[loop_index].clone(),
            loop_index,
            loop_point: closing,
            classification: classify(context, &self.config),
            context,
        };

        tracing::debug!(
            journey = %result.journey_path(),
            classification = %result.classification,
            context = %context,
            "circular reference detected"
        );
        self.cycles.push(result);
    }

    fn report(
        &mut self,
        kind: ResolvingErrorKind,
        definition: String,
        location: Option<Location>,
        message: String,
    ) {
        let path = self.path.to_pointer();
        if !self
            .seen_errors
            .insert((kind, self.document.clone(), path.clone()))
        {
            return;
        }
        tracing::debug!(%kind, %definition, %path, "resolving error");
        self.errors.push(ResolvingError {
            kind,
            definition,
            document: self.document.clone(),
            path,
            location,
            message,
            circular: None,
        });
    }

    fn finish(self) -> (Vec<CircularReferenceResult>, Vec<ResolvingError>) {
        let mut errors = self.errors;
        for cycle in self.cycles.iter().filter(|c| !c.is_polymorphic()) {
            errors.push(ResolvingError {
                kind: ResolvingErrorKind::CircularReference,
                definition: cycle.start.definition.clone(),
                document: cycle.loop_point.document.clone(),
                path: cycle.loop_point.path.clone(),
                location: cycle.loop_point.location,
                message: format!("circular reference detected: {}", cycle.journey_path()),
                circular: Some(cycle.clone()),
            });
        }
        (self.cycles, errors)
    }
}
