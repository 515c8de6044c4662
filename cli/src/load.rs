#![deny(missing_docs)]

//! # Document Loading
//!
//! Shared arguments for commands that read a root document, plus the code that
//! turns them into a [`SpecIndex`] and a [`ResolverConfig`].

use crate::error::{CliError, CliResult};
use oasref_core::{DocumentRegistry, IndexConfig, Node, ResolverConfig, SpecIndex};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Arguments shared by `check` and `resolve`.
#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the root OpenAPI document (YAML or JSON).
    pub spec: PathBuf,

    /// Directory of sibling documents that `$ref`s may point into.
    /// Defaults to nothing; only the root document is available.
    #[clap(long)]
    pub docs_dir: Option<PathBuf>,

    /// Resolver settings file (YAML or JSON).
    #[clap(long, env = "OASREF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Maximum number of chained references followed on one branch.
    #[clap(long, env = "OASREF_MAX_DEPTH")]
    pub max_depth: Option<usize>,

    /// Treat cycles through plain array `items` as polymorphic.
    #[clap(long)]
    pub array_cycles_polymorphic: bool,
}

/// Everything a command needs to run a pass.
#[derive(Debug)]
pub struct LoadedSpec {
    /// The index over the root document and registered siblings.
    pub index: SpecIndex,
    /// Effective resolver settings (file values overridden by flags).
    pub config: ResolverConfig,
}

/// Reads the root document, registers sibling documents and builds the index.
pub fn load(args: &InputArgs) -> CliResult<LoadedSpec> {
    if !args.spec.exists() {
        return Err(CliError::General(format!(
            "OpenAPI file not found: {:?}",
            args.spec
        )));
    }

    let config = resolver_config(args)?;

    let text = fs::read_to_string(&args.spec)?;
    let root = Node::from_yaml_str(&text)?;

    let spec_dir = args
        .spec
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let base_uri = uri_key(args.spec.file_name().map(Path::new).unwrap_or(args.spec.as_path()));

    let mut registry = DocumentRegistry::new();
    if let Some(dir) = &args.docs_dir {
        register_dir(&mut registry, dir, &spec_dir, &args.spec)?;
    }

    tracing::info!(
        spec = %args.spec.display(),
        documents = registry.len(),
        "loaded root document"
    );

    let index = SpecIndex::new(root, IndexConfig::with_base_uri(base_uri), registry);
    Ok(LoadedSpec { index, config })
}

fn resolver_config(args: &InputArgs) -> CliResult<ResolverConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| {
                CliError::General(format!("Failed to read config {:?}: {}", path, e))
            })?;
            ResolverConfig::from_yaml_str(&text)?
        }
        None => ResolverConfig::default(),
    };

    if let Some(depth) = args.max_depth {
        config.max_journey_depth = depth;
    }
    if args.array_cycles_polymorphic {
        config.array_items_polymorphic = true;
    }
    config.validate()?;
    Ok(config)
}

/// Registers every `.yaml`, `.yml` and `.json` file below `dir`.
///
/// Documents are keyed by their path relative to the root document's
/// directory, so a `$ref: 'schemas/pet.yaml#/Pet'` written in the root finds
/// `schemas/pet.yaml`. Files outside that directory are keyed relative to
/// `dir` instead. The root document itself is skipped.
fn register_dir(
    registry: &mut DocumentRegistry,
    dir: &Path,
    spec_dir: &Path,
    spec: &Path,
) -> CliResult<()> {
    if !dir.is_dir() {
        return Err(CliError::General(format!(
            "Documents directory not found: {:?}",
            dir
        )));
    }

    let spec_canonical = fs::canonicalize(spec)?;
    let spec_dir_canonical = fs::canonicalize(if spec_dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        spec_dir
    })?;
    let dir_canonical = fs::canonicalize(dir)?;

    let mut paths: Vec<PathBuf> = WalkDir::new(&dir_canonical)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_document(p))
        .collect();
    paths.sort();

    for path in paths {
        if path == spec_canonical {
            continue;
        }
        let relative = path
            .strip_prefix(&spec_dir_canonical)
            .or_else(|_| path.strip_prefix(&dir_canonical))
            .map_err(|_| CliError::General(format!("Cannot key document {:?}", path)))?;
        let key = uri_key(relative);
        let text = fs::read_to_string(&path)?;
        tracing::debug!(uri = %key, path = %path.display(), "registering document");
        registry.register_yaml(&key, &text)?;
    }
    Ok(())
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "yaml" | "yml" | "json"))
}

/// Forward-slash key for a relative path.
fn uri_key(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
