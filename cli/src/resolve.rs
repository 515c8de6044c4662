#![deny(missing_docs)]

//! # Resolve Command
//!
//! Substitutes every resolvable `$ref` and writes the resolved document.

use crate::error::{CliError, CliResult};
use crate::load::{load, InputArgs};
use oasref_core::Resolver;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Output formats for the resolved document.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// YAML, keys in source order.
    #[default]
    Yaml,
    /// Pretty-printed JSON, keys in source order.
    Json,
}

/// Arguments for the resolve command.
#[derive(clap::Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Input document and resolver settings.
    #[clap(flatten)]
    pub input: InputArgs,

    /// Output format.
    #[clap(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Write the resolved document here instead of stdout.
    #[clap(long)]
    pub output: Option<PathBuf>,
}

/// Executes the resolution.
///
/// The resolved document is always written; circular references stay as
/// `$ref` markers and broken ones as written. Findings go to the log and
/// the return value is `true` only when there were no resolving errors.
pub fn execute(args: &ResolveArgs, out: &mut impl Write) -> CliResult<bool> {
    let loaded = load(&args.input)?;
    let mut resolver = Resolver::with_config(&loaded.index, loaded.config.clone());
    resolver.resolve();

    for cycle in resolver.circular_references() {
        tracing::info!(
            journey = %cycle.journey_path(),
            classification = %cycle.classification,
            "circular reference left in place"
        );
    }
    for error in resolver.resolving_errors() {
        tracing::warn!(kind = %error.kind, "{}", error);
    }
    let clean = resolver.resolving_errors().is_empty();

    let resolved = resolver
        .into_resolved_root()
        .ok_or_else(|| CliError::General("Document has no content to resolve".into()))?;
    let rendered = match args.format {
        OutputFormat::Yaml => resolved.to_yaml_string()?,
        OutputFormat::Json => {
            let mut json = resolved.to_json_string()?;
            json.push('\n');
            json
        }
    };

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, rendered)?;
            tracing::info!(output = %path.display(), "wrote resolved document");
        }
        None => out.write_all(rendered.as_bytes())?,
    }

    Ok(clean)
}
