//! Per-environment settings model and environments-file loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FUNCTION_RUNTIME, DEFAULT_STATE_BUCKET};
use crate::error::{Result, StrataError};

/// Configuration of one deployment environment.
///
/// One instance exists per environment and is only ever borrowed during a
/// synthesis pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Stack name, used to derive resource names (e.g. `cdktfworkshop-dev`).
    pub name: String,
    /// Environment label (e.g. `dev`); keys the driver's result mapping.
    pub environment: String,
    /// Target provider region.
    pub region: String,
    /// Whether the static-site subtree is deployed.
    #[serde(default)]
    pub deploy_ui: bool,
    /// Bucket name of the static site; doubles as the custom domain.
    #[serde(default)]
    pub ui_bucket_name: String,
    /// Bucket name reserved for function archives.
    #[serde(default)]
    pub function_bucket_name: String,
    /// Whether a DNS record and custom certificate are attached to the CDN.
    #[serde(default)]
    pub setup_custom_domain: bool,
    /// Hosted zone that receives the custom-domain record.
    #[serde(default)]
    pub domain_zone_id: String,
    /// Certificate used by the CDN when a custom domain is set up.
    #[serde(default)]
    pub certificate_arn: String,
    /// Node version override for the function runtime (e.g. `nodejs18.x`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_version: Option<String>,
    /// Remote state bucket override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_bucket: Option<String>,
}

impl Settings {
    /// Checks that the flags are backed by the naming inputs they need.
    ///
    /// # Errors
    ///
    /// Returns `StrataError::Config` naming the first missing value.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("environment", &self.environment),
            ("region", &self.region),
        ] {
            if value.trim().is_empty() {
                return Err(self.invalid(format!("{field} must not be empty")));
            }
        }
        if self.deploy_ui && self.ui_bucket_name.is_empty() {
            return Err(self.invalid("deploy_ui requires ui_bucket_name".into()));
        }
        if self.setup_custom_domain {
            if self.domain_zone_id.is_empty() {
                return Err(self.invalid("setup_custom_domain requires domain_zone_id".into()));
            }
            if self.certificate_arn.is_empty() {
                return Err(self.invalid("setup_custom_domain requires certificate_arn".into()));
            }
        }
        Ok(())
    }

    /// Returns the remote state locator for this environment.
    #[must_use]
    pub fn backend(&self) -> BackendConfig {
        let env = &self.environment;
        BackendConfig {
            bucket: self
                .state_bucket
                .clone()
                .unwrap_or_else(|| DEFAULT_STATE_BUCKET.to_string()),
            key: format!("{env}/terraform.{env}.tfstate"),
            region: self.region.clone(),
        }
    }

    /// Returns the function runtime identifier.
    #[must_use]
    pub fn function_runtime(&self) -> &str {
        self.node_version
            .as_deref()
            .unwrap_or(DEFAULT_FUNCTION_RUNTIME)
    }

    fn invalid(&self, message: String) -> StrataError {
        StrataError::Config {
            message: format!("environment \"{}\": {message}", self.environment),
        }
    }
}

/// Remote state locator emitted into the artifact manifest.
///
/// The engine never opens or locks it; the executor does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// State bucket.
    pub bucket: String,
    /// Object key of the state file.
    pub key: String,
    /// Region of the state bucket.
    pub region: String,
}

/// Root document of an environments file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentsFile {
    /// One entry per environment.
    pub environments: Vec<Settings>,
}

/// Loads an environments file, choosing YAML or JSON by extension.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_environments(path: &Path) -> Result<Vec<Settings>> {
    tracing::info!(path = %path.display(), "loading environments file");
    let content = std::fs::read_to_string(path).map_err(|e| StrataError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let file: EnvironmentsFile = if is_json {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    tracing::debug!(count = file.environments.len(), "parsed environments");
    Ok(file.environments)
}

/// Returns the built-in dev, test, and demo environments of the workshop.
#[must_use]
pub fn workshop_environments() -> Vec<Settings> {
    ["dev", "test", "demo"]
        .into_iter()
        .map(|env| Settings {
            name: format!("cdktfworkshop-{env}"),
            environment: env.to_string(),
            region: "us-east-1".to_string(),
            deploy_ui: true,
            ui_bucket_name: format!("workshop-{env}.softrams.cloud"),
            function_bucket_name: format!("workshop-{env}-lambda"),
            setup_custom_domain: false,
            domain_zone_id: String::new(),
            certificate_arn: String::new(),
            node_version: None,
            state_bucket: None,
        })
        .collect()
}
