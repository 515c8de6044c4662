#![deny(missing_docs)]

//! # Check Command
//!
//! Runs a detection-only pass and reports every cycle and resolving error.

use crate::error::CliResult;
use crate::load::{load, InputArgs};
use oasref_core::pointer::friendly_path;
use oasref_core::{CircularReferenceResult, Resolver, ResolvingError};
use serde_json::{json, Value};
use std::io::Write;

/// Arguments for the check command.
#[derive(clap::Args, Debug, Clone)]
pub struct CheckArgs {
    /// Input document and resolver settings.
    #[clap(flatten)]
    pub input: InputArgs,

    /// Print the report as JSON.
    #[clap(long)]
    pub json: bool,
}

/// Executes the check and writes the report to `out`.
///
/// Returns `true` when the document has no resolving errors. Polymorphic
/// cycles are reported but do not fail the check.
pub fn execute(args: &CheckArgs, out: &mut impl Write) -> CliResult<bool> {
    let loaded = load(&args.input)?;
    let mut resolver = Resolver::with_config(&loaded.index, loaded.config.clone());
    resolver.check_for_circular_references();

    let cycles = resolver.circular_references();
    let errors = resolver.resolving_errors();

    if args.json {
        let report = json!({
            "cycles": cycles.iter().map(cycle_json).collect::<Vec<_>>(),
            "errors": errors.iter().map(error_json).collect::<Vec<_>>(),
        });
        writeln!(out, "{:#}", report)?;
    } else {
        write_text(out, cycles, errors)?;
    }

    Ok(errors.is_empty())
}

fn write_text(
    out: &mut impl Write,
    cycles: &[CircularReferenceResult],
    errors: &[ResolvingError],
) -> CliResult<()> {
    let polymorphic = cycles.iter().filter(|c| c.is_polymorphic()).count();
    writeln!(
        out,
        "{} circular reference(s), {} polymorphic",
        cycles.len(),
        polymorphic
    )?;
    for cycle in cycles {
        write!(
            out,
            "  [{}] {} (via {})",
            cycle.classification,
            cycle.journey_path(),
            cycle.context
        )?;
        if let Some(loc) = cycle.location() {
            write!(out, " at {}", loc)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{} resolving error(s)", errors.len())?;
    for error in errors {
        writeln!(out, "  {}: {}", error.kind, error)?;
    }
    Ok(())
}

fn cycle_json(cycle: &CircularReferenceResult) -> Value {
    json!({
        "journey": cycle.journey_path(),
        "start": cycle.start.definition,
        "classification": cycle.classification.to_string(),
        "context": cycle.context.to_string(),
        "path": friendly_path(&format!(
            "{}#{}",
            cycle.loop_point.document, cycle.loop_point.path
        )),
        "line": cycle.location().map(|l| l.line),
        "column": cycle.location().map(|l| l.column),
    })
}

fn error_json(error: &ResolvingError) -> Value {
    json!({
        "kind": error.kind.to_string(),
        "definition": error.definition,
        "path": error.friendly_path(),
        "message": error.message,
        "line": error.location.map(|l| l.line),
        "column": error.location.map(|l| l.column),
    })
}
