//! Formatted output helpers for CLI commands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use strata_common::constants::ARTIFACT_FILE_NAME;
use strata_construct::driver::EnvironmentReport;
use strata_construct::synth::Artifact;

const RULE_WIDTH: usize = 48;

/// Prints a title underlined with a double rule.
pub fn print_heading(title: &str) {
    println!("{title}");
    println!("{}", "\u{2550}".repeat(RULE_WIDTH));
}

/// Writes an artifact to `<out>/<environment>/stack.json`.
///
/// Returns the written path and the canonical artifact text.
///
/// # Errors
///
/// Returns an error if the artifact cannot be serialized or written.
pub fn write_artifact(out: &Path, artifact: &Artifact) -> anyhow::Result<(PathBuf, String)> {
    let dir = out.join(&artifact.manifest.environment);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(ARTIFACT_FILE_NAME);
    let text = artifact.to_json_pretty()?;
    std::fs::write(&path, &text).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "artifact written");
    Ok((path, text))
}

/// Removes `<out>/<environment>/stack.json` left by an earlier run.
///
/// Returns whether a file was removed.
///
/// # Errors
///
/// Returns an error if an existing artifact cannot be removed.
pub fn remove_stale_artifact(out: &Path, environment: &str) -> anyhow::Result<bool> {
    let path = out.join(environment).join(ARTIFACT_FILE_NAME);
    match std::fs::remove_file(&path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "stale artifact removed");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
    }
}

/// One-line status of an environment's pipeline.
#[must_use]
pub fn status_line(report: &EnvironmentReport) -> String {
    match &report.outcome {
        Ok(artifact) => format!(
            "  \u{2713} {:<8} {} resource(s)",
            report.environment,
            artifact.resources.len()
        ),
        Err(e) => format!(
            "  \u{2717} {:<8} failed after {}: {e}",
            report.environment, report.reached
        ),
    }
}
