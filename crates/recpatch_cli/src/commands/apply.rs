//! Apply command implementation.

use super::{load_patch_set, load_store, save_store, CommandError, CommandResult, Format};
use recpatch_core::{ApplyReport, EngineConfig, PatchEngine};
use serde::Serialize;
use std::path::Path;

/// Apply outcome as printed.
#[derive(Debug, Serialize)]
pub struct ApplyResult {
    /// Version named by the patch set.
    pub target_version: String,
    /// Patches that wrote a field.
    pub applied: usize,
    /// Patches that found the field already set.
    pub skipped: usize,
    /// Fingerprint after applying.
    pub fingerprint: String,
    /// Where the patched table was written, if anywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_to: Option<String>,
}

/// Applies the patch set at `patches` to the table at `table`.
///
/// The patched table is written to `out` when given. With safe mode off a
/// failed transaction still writes the partially patched table to `out`
/// before the error is returned.
pub fn apply(
    table: &Path,
    patches: &Path,
    config: EngineConfig,
    out: Option<&Path>,
) -> CommandResult<ApplyResult> {
    let mut store = load_store(table)?;
    let (target_version, set) = load_patch_set(patches)?;
    let mut engine = PatchEngine::new(config);

    let report: ApplyReport = match engine.apply_patch_set(&mut store, &set) {
        Ok(report) => report,
        Err(err) => {
            if !err.reverted && !engine.rollback_log().is_empty() {
                if let Some(path) = out {
                    tracing::warn!(path = %path.display(), "writing partially patched table");
                    save_store(path, &store)?;
                }
            }
            return Err(CommandError::Apply(err));
        }
    };

    if let Some(path) = out {
        save_store(path, &store)?;
    }
    Ok(ApplyResult {
        target_version,
        applied: report.applied,
        skipped: report.skipped,
        fingerprint: report.fingerprint.to_string(),
        written_to: out.map(|p| p.display().to_string()),
    })
}

/// Runs the apply command.
pub fn run(
    table: &Path,
    patches: &Path,
    config: EngineConfig,
    out: Option<&Path>,
    format: Format,
) -> CommandResult<()> {
    let result = apply(table, patches, config, out)?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => {
            println!(
                "Applied {} patch(es), {} already current",
                result.applied, result.skipped
            );
            if !result.target_version.is_empty() {
                println!("Version:     {}", result.target_version);
            }
            println!("Fingerprint: {}", result.fingerprint);
            match &result.written_to {
                Some(path) => println!("Written to:  {path}"),
                None => println!("Dry run, no table written (use --out)"),
            }
        }
    }
    Ok(())
}
