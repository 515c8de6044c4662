#![deny(missing_docs)]

//! # Journey Tracking
//!
//! The chain of references followed from the traversal root to the current
//! node. Steps are pushed before descending into a target and popped on the
//! way back, so the journey only ever describes the active path.

use crate::index::Reference;

/// Path-scoped record of reference steps.
#[derive(Debug, Clone, Default)]
pub struct Journey {
    steps: Vec<Reference>,
}

impl Journey {
    /// An empty journey.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of steps on the active path.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True at the traversal root.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The steps, root first.
    pub fn steps(&self) -> &[Reference] {
        &self.steps
    }

    /// Enters a reference target.
    pub fn push(&mut self, step: Reference) {
        self.steps.push(step);
    }

    /// Leaves the most recently entered target.
    pub fn pop(&mut self) -> Option<Reference> {
        self.steps.pop()
    }

    /// Position of `definition` on the active path.
    pub fn position(&self, definition: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.definition == definition)
    }

    /// The loop from `start` to the current step, closed by `closing`.
    pub fn loop_from(&self, start: usize, closing: Reference) -> Vec<Reference> {
        let mut steps = self.steps[start..].to_vec();
        steps.push(closing);
        steps
    }
}

/// A rotation-independent key for the loop starting at `steps[0]`.
///
/// `A -> B -> C` and `B -> C -> A` are the same cycle entered at different points.
pub(crate) fn cycle_key(steps: &[Reference]) -> String {
    let definitions: Vec<&str> = steps.iter().map(|s| s.definition.as_str()).collect();
    let pivot = definitions
        .iter()
        .enumerate()
        .min_by_key(|(_, d)| **d)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut rotated = definitions[pivot..].to_vec();
    rotated.extend_from_slice(&definitions[..pivot]);
    rotated.join(" -> ")
}
