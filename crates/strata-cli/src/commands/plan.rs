//! `strata plan`: Display the deployment order of each environment.

use clap::Args;
use strata_construct::driver::instantiate;
use strata_stacks::workshop::compose;

use crate::inputs::InputArgs;
use crate::output::{print_heading, status_line};

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Stack inputs.
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Also list each resource's dependencies.
    #[arg(long)]
    pub dependencies: bool,
}

/// Executes the `plan` command.
///
/// Runs the full pipeline for every environment without writing anything,
/// then lists the resources in the order an executor would create them.
///
/// # Errors
///
/// Returns an error if the inputs cannot be prepared or any environment
/// failed.
pub fn execute(args: &PlanArgs) -> anyhow::Result<()> {
    let settings = args.inputs.settings()?;
    let inputs = args.inputs.stack_inputs()?;
    let reports = instantiate(&settings, |s| compose(s, &inputs));

    let mut failed = 0usize;
    for report in reports.values() {
        let Ok(artifact) = &report.outcome else {
            println!("{}", status_line(report));
            println!();
            failed += 1;
            continue;
        };

        print_heading(&format!(
            "Deployment plan for: {} ({})",
            artifact.manifest.environment, artifact.manifest.stack
        ));
        println!(
            "  state: s3://{}/{}",
            artifact.manifest.backend.bucket, artifact.manifest.backend.key
        );
        println!();
        for resource in &artifact.resources {
            println!(
                "  + {}.{}",
                resource.resource_type.provider_type(),
                resource.logical_id
            );
            if args.dependencies {
                for dep in &resource.depends_on {
                    println!("      after {dep}");
                }
            }
        }
        println!();
        println!("  {} resource(s) will be created.", artifact.resources.len());
        println!();
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} environment(s) failed", reports.len());
    }
    Ok(())
}
