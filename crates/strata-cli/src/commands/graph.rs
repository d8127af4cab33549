//! `strata graph`: Print one environment's dependency graph in DOT format.

use anyhow::Context;
use clap::Args;
use strata_construct::graph::DependencyGraph;
use strata_stacks::workshop::compose;

use crate::inputs::InputArgs;

/// Arguments for the `graph` command.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Stack inputs.
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Environment whose graph is printed.
    #[arg(long, default_value = "dev")]
    pub environment: String,
}

/// Executes the `graph` command.
///
/// # Errors
///
/// Returns an error if the environment is unknown or its graph is invalid.
pub fn execute(args: &GraphArgs) -> anyhow::Result<()> {
    let settings = args
        .inputs
        .settings()?
        .into_iter()
        .find(|s| s.environment == args.environment)
        .with_context(|| format!("unknown environment: {}", args.environment))?;
    let inputs = args.inputs.stack_inputs()?;

    let tree = compose(&settings, &inputs)?;
    let graph = DependencyGraph::build(&tree)?;
    tracing::info!(
        environment = %settings.environment,
        nodes = graph.len(),
        edges = graph.edge_count(),
        "dependency graph built"
    );
    print!("{}", graph.to_dot());
    Ok(())
}
