//! Multi-environment driver.
//!
//! Runs one independent pipeline per settings value:
//! `Uninitialized -> TreeBuilt -> GraphBuilt -> Synthesized`, or `Failed`
//! from any stage. Pipelines share nothing but read-only inputs, so they run
//! on scoped threads; results are keyed by environment label in a
//! `BTreeMap`, which makes the report order independent of completion order.

use std::collections::BTreeMap;
use std::fmt;

use strata_common::config::Settings;
use strata_common::error::{Result, StrataError};

use crate::construct::ConstructTree;
use crate::graph::DependencyGraph;
use crate::synth::{Artifact, Manifest, synthesize};

/// Stage of one environment's pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStage {
    /// Nothing has run yet.
    Uninitialized,
    /// The composition produced a construct tree.
    TreeBuilt,
    /// The dependency graph was built and validated.
    GraphBuilt,
    /// The artifact was produced. Terminal.
    Synthesized,
    /// A stage failed. Terminal.
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::TreeBuilt => write!(f, "tree-built"),
            Self::GraphBuilt => write!(f, "graph-built"),
            Self::Synthesized => write!(f, "synthesized"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Result of one environment's pipeline.
#[derive(Debug)]
pub struct EnvironmentReport {
    /// Environment label.
    pub environment: String,
    /// Last stage that completed successfully.
    pub reached: PipelineStage,
    /// The artifact, or the error that stopped the pipeline.
    pub outcome: Result<Artifact>,
}

impl EnvironmentReport {
    /// Terminal stage of the pipeline.
    #[must_use]
    pub const fn stage(&self) -> PipelineStage {
        match self.outcome {
            Ok(_) => PipelineStage::Synthesized,
            Err(_) => PipelineStage::Failed,
        }
    }

    /// Whether an artifact was produced.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    fn failed(environment: &str, reached: PipelineStage, error: StrataError) -> Self {
        Self {
            environment: environment.to_string(),
            reached,
            outcome: Err(error),
        }
    }
}

/// Runs the full pipeline for one environment.
///
/// `compose` builds a fresh construct tree from the settings; it is never
/// given a tree shared with another environment.
pub fn run_pipeline<F>(settings: &Settings, compose: &F) -> EnvironmentReport
where
    F: Fn(&Settings) -> Result<ConstructTree>,
{
    let environment = settings.environment.as_str();
    tracing::info!(environment, "starting pipeline");

    let mut reached = PipelineStage::Uninitialized;
    let outcome = execute(settings, compose, &mut reached);
    match &outcome {
        Ok(artifact) => tracing::info!(
            environment,
            resources = artifact.resources.len(),
            "pipeline synthesized"
        ),
        Err(e) => tracing::warn!(environment, stage = %reached, error = %e, "pipeline failed"),
    }
    EnvironmentReport {
        environment: environment.to_string(),
        reached,
        outcome,
    }
}

fn execute<F>(settings: &Settings, compose: &F, reached: &mut PipelineStage) -> Result<Artifact>
where
    F: Fn(&Settings) -> Result<ConstructTree>,
{
    let tree = compose(settings)?;
    *reached = PipelineStage::TreeBuilt;
    let graph = DependencyGraph::build(&tree)?;
    *reached = PipelineStage::GraphBuilt;
    let artifact = synthesize(&graph, Manifest::for_settings(settings))?;
    *reached = PipelineStage::Synthesized;
    Ok(artifact)
}

/// Instantiates `compose` once per settings value.
///
/// A failure in one environment never affects another. Settings that share
/// an environment label all fail with a configuration error, since their
/// artifacts would overwrite each other.
pub fn instantiate<F>(settings: &[Settings], compose: F) -> BTreeMap<String, EnvironmentReport>
where
    F: Fn(&Settings) -> Result<ConstructTree> + Sync,
{
    let mut occurrences: BTreeMap<&str, usize> = BTreeMap::new();
    for s in settings {
        *occurrences.entry(s.environment.as_str()).or_default() += 1;
    }

    let mut reports = BTreeMap::new();
    for (env, &count) in &occurrences {
        if count > 1 {
            let error = StrataError::Config {
                message: format!("environment \"{env}\" is declared {count} times"),
            };
            let _ = reports.insert(
                (*env).to_string(),
                EnvironmentReport::failed(env, PipelineStage::Uninitialized, error),
            );
        }
    }

    let compose = &compose;
    let finished: Vec<EnvironmentReport> = std::thread::scope(|scope| {
        let handles: Vec<_> = settings
            .iter()
            .filter(|s| occurrences.get(s.environment.as_str()) == Some(&1))
            .map(|s| (s, scope.spawn(move || run_pipeline(s, compose))))
            .collect();
        handles
            .into_iter()
            .map(|(s, handle)| {
                handle.join().unwrap_or_else(|_| {
                    EnvironmentReport::failed(
                        &s.environment,
                        PipelineStage::Uninitialized,
                        StrataError::Config {
                            message: format!("pipeline for \"{}\" panicked", s.environment),
                        },
                    )
                })
            })
            .collect()
    });

    for report in finished {
        let _ = reports.insert(report.environment.clone(), report);
    }
    reports
}
