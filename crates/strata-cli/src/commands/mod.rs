//! CLI command definitions and dispatch.

pub mod graph;
pub mod plan;
pub mod synth;

use clap::{Parser, Subcommand};

/// strata: Declarative multi-environment infrastructure synthesizer.
#[derive(Parser, Debug)]
#[command(name = "strata", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Emit log events as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Synthesize one artifact per environment.
    Synth(synth::SynthArgs),
    /// Display the deployment order of each environment.
    Plan(plan::PlanArgs),
    /// Print one environment's dependency graph in DOT format.
    Graph(graph::GraphArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Synth(args) => synth::execute(&args),
        Command::Plan(args) => plan::execute(&args),
        Command::Graph(args) => graph::execute(&args),
    }
}
