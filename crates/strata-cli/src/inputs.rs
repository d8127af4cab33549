//! Shared input arguments: environments, function bundle, static content.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use strata_common::config::{Settings, load_environments, workshop_environments};
use strata_common::types::ContentHash;
use strata_stacks::workshop::{DEFAULT_PUBLIC_PATH, StackInputs};

/// Inputs every command composes the stack from.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Environments file (YAML, or JSON by extension). The built-in
    /// dev, test, and demo environments are used when omitted.
    #[arg(long, env = "STRATA_ENVIRONMENTS")]
    pub environments: Option<PathBuf>,

    /// Restrict the run to these environment labels (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Prebuilt function archive forwarded to the compute function.
    #[arg(long, env = "STRATA_FUNCTION_ARCHIVE")]
    pub function_archive: Option<PathBuf>,

    /// Expected SHA-256 of the function archive, in hex.
    #[arg(long, requires = "function_archive")]
    pub function_hash: Option<String>,

    /// UI build directory uploaded to the site bucket.
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// First path segment of the REST API.
    #[arg(long, default_value = DEFAULT_PUBLIC_PATH)]
    pub public_path: String,
}

impl InputArgs {
    /// Loads and filters the environment settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the environments file cannot be loaded, or if
    /// `--only` names an environment that is not declared.
    pub fn settings(&self) -> anyhow::Result<Vec<Settings>> {
        let all = match &self.environments {
            Some(path) => load_environments(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => workshop_environments(),
        };
        if self.only.is_empty() {
            return Ok(all);
        }

        for label in &self.only {
            if !all.iter().any(|s| &s.environment == label) {
                anyhow::bail!("unknown environment: {label}");
            }
        }
        Ok(all
            .into_iter()
            .filter(|s| self.only.contains(&s.environment))
            .collect())
    }

    /// Prepares the function bundle and static content set.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive or static directory cannot be read,
    /// or if the archive does not match `--function-hash`.
    pub fn stack_inputs(&self) -> anyhow::Result<StackInputs> {
        let expected = self
            .function_hash
            .as_deref()
            .map(ContentHash::from_hex)
            .transpose()?;
        let function_bundle = self
            .function_archive
            .as_deref()
            .map(|archive| strata_assets::bundle::load_bundle(archive, expected.as_ref()))
            .transpose()?;
        let static_content = match &self.static_dir {
            Some(dir) => strata_assets::content::scan_static_dir(dir)
                .with_context(|| format!("failed to scan {}", dir.display()))?,
            None => Vec::new(),
        };

        Ok(StackInputs {
            function_bundle,
            static_content,
            public_path: self.public_path.clone(),
        })
    }
}
