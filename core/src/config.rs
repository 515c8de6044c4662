#![deny(missing_docs)]

//! # Configuration
//!
//! Settings for the index builder and the resolver. Both deserialize from YAML
//! with every field optional, so a config file only needs the values it changes.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Default bound on the number of reference steps in one journey.
pub const DEFAULT_MAX_JOURNEY_DEPTH: usize = 100;

/// Default bound on node nesting across reference descents.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 512;

/// Resolver settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Longest chain of references followed before a branch is abandoned.
    pub max_journey_depth: usize,
    /// Deepest node nesting (counted through substituted targets) walked before a
    /// branch is abandoned.
    pub max_nesting_depth: usize,
    /// Treat cycles that close through a plain array `items` schema as polymorphic.
    pub array_items_polymorphic: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_journey_depth: DEFAULT_MAX_JOURNEY_DEPTH,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            array_items_polymorphic: false,
        }
    }
}

impl ResolverConfig {
    /// Parses a YAML (or JSON) config document.
    pub fn from_yaml_str(text: &str) -> AppResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ResolverConfig = serde_yaml::from_str(text)
            .map_err(|e| AppError::General(format!("Failed to parse resolver config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would make every pass abort immediately.
    pub fn validate(&self) -> AppResult<()> {
        if self.max_journey_depth == 0 {
            return Err(AppError::General(
                "maxJourneyDepth must be greater than zero".into(),
            ));
        }
        if self.max_nesting_depth == 0 {
            return Err(AppError::General(
                "maxNestingDepth must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Index builder settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexConfig {
    /// URI (or relative path) of the root document. Relative external references
    /// are resolved against it.
    pub base_uri: Option<String>,
}

impl IndexConfig {
    /// Config for a root document living at `uri`.
    pub fn with_base_uri(uri: impl Into<String>) -> Self {
        Self {
            base_uri: Some(uri.into()),
        }
    }
}
