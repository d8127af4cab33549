//! `strata synth`: Synthesize one artifact per environment.

use std::path::PathBuf;

use clap::Args;
use strata_assets::hash::hash_bytes;
use strata_common::constants::DEFAULT_OUTPUT_DIR;
use strata_construct::driver::instantiate;
use strata_stacks::workshop::compose;

use crate::inputs::InputArgs;
use crate::output::{print_heading, remove_stale_artifact, status_line, write_artifact};

/// Arguments for the `synth` command.
#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Stack inputs.
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Directory that receives `<environment>/stack.json`.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub out: PathBuf,
}

/// Executes the `synth` command.
///
/// Every environment runs to completion; artifacts of the successful ones
/// are written even when another environment fails. A failed environment
/// loses any `stack.json` left from an earlier run.
///
/// # Errors
///
/// Returns an error if the inputs cannot be prepared, or if any environment
/// failed to synthesize or to write its artifact.
pub fn execute(args: &SynthArgs) -> anyhow::Result<()> {
    let settings = args.inputs.settings()?;
    let inputs = args.inputs.stack_inputs()?;
    let reports = instantiate(&settings, |s| compose(s, &inputs));

    print_heading(&format!("Synthesizing {} environment(s)", reports.len()));
    let mut failed = 0usize;
    for report in reports.values() {
        println!("{}", status_line(report));
        match &report.outcome {
            Ok(artifact) => match write_artifact(&args.out, artifact) {
                Ok((path, text)) => {
                    println!("      {}", hash_bytes(text.as_bytes()));
                    println!("      {}", path.display());
                }
                Err(e) => {
                    tracing::error!(
                        environment = %report.environment,
                        error = %format!("{e:#}"),
                        "artifact not written"
                    );
                    println!("      write failed: {e:#}");
                    failed += 1;
                }
            },
            Err(_) => {
                if let Err(e) = remove_stale_artifact(&args.out, &report.environment) {
                    tracing::warn!(
                        environment = %report.environment,
                        error = %format!("{e:#}"),
                        "stale artifact kept"
                    );
                }
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} environment(s) failed", reports.len());
    }
    Ok(())
}
